use crate::RelayError;
use crate::room::{RegistryStats, RelayCommand};
use lullaby_core::{ConnId, Role, RoomId, SessionDescription};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to the session relay task.
#[derive(Clone, Debug)]
pub struct RelayHandle {
    command_tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Creates a handle together with the receiver the relay task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RelayCommand>) {
        let (command_tx, command_rx) = mpsc::channel(capacity);
        (Self { command_tx }, command_rx)
    }

    pub async fn join(&self, conn: ConnId, room: RoomId, role: Role) -> Result<(), RelayError> {
        self.send(RelayCommand::Join { conn, room, role }).await
    }

    pub async fn signal(
        &self,
        conn: ConnId,
        to: Option<ConnId>,
        room: RoomId,
        data: SessionDescription,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Signal {
            conn,
            to,
            room,
            data,
        })
        .await
    }

    pub async fn leave(&self, conn: ConnId, room: RoomId) -> Result<(), RelayError> {
        self.send(RelayCommand::Leave { conn, room }).await
    }

    pub async fn disconnect(&self, conn: ConnId) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { conn }).await
    }

    pub async fn stats(&self) -> Result<RegistryStats, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats { reply }).await?;
        rx.await.map_err(|_| RelayError::RelayClosed)
    }

    pub async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RelayError::RelayClosed)
    }
}
