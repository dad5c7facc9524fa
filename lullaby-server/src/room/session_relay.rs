use crate::RelayError;
use crate::config::RelayConfig;
use crate::room::{Delivery, RelayCommand, RelayHandle, RoomRegistry};
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Owns the room registry and applies relay commands one at a time.
///
/// All room mutations happen inside [`SessionRelay::run`], so two commands
/// touching the same room can never interleave.
pub struct SessionRelay {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    signaling: Arc<dyn SignalingOutput>,
    orphan_ttl: Option<Duration>,
    sweep_interval: Duration,
}

/// Shortest sweep period; tokio intervals cannot tick at zero.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

impl SessionRelay {
    pub fn new(
        config: &RelayConfig,
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(config.room_policy.clone()),
            command_rx,
            signaling,
            orphan_ttl: config.room_policy.orphan_room_ttl,
            sweep_interval: config.room_policy.sweep_interval.max(MIN_SWEEP_INTERVAL),
        }
    }

    /// Builds a relay and spawns its loop, returning the handle that feeds it.
    pub fn spawn(config: &RelayConfig, signaling: Arc<dyn SignalingOutput>) -> RelayHandle {
        Self::spawn_with(config, |handle| (handle, signaling))
    }

    /// Like [`SessionRelay::spawn`], for outputs that need the handle
    /// themselves. `wire` receives the handle and returns whatever the caller
    /// keeps plus the output the relay delivers through.
    pub fn spawn_with<T>(
        config: &RelayConfig,
        wire: impl FnOnce(RelayHandle) -> (T, Arc<dyn SignalingOutput>),
    ) -> T {
        let (handle, command_rx) = RelayHandle::channel(config.command_capacity);
        let (kept, signaling) = wire(handle);
        tokio::spawn(Self::new(config, command_rx, signaling).run());
        kept
    }

    pub async fn run(mut self) {
        info!("Session relay started");

        let mut sweep = tokio::time::interval_at(
            Instant::now() + self.sweep_interval,
            self.sweep_interval,
        );
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down relay.");
                            break;
                        }
                    }
                }

                now = sweep.tick(), if self.orphan_ttl.is_some() => {
                    if let Some(ttl) = self.orphan_ttl {
                        let out = self.registry.sweep_orphans(now.into_std(), ttl);
                        self.dispatch(out).await;
                    }
                }
            }
        }

        info!("Session relay finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        let now = Instant::now().into_std();

        let result = match cmd {
            RelayCommand::Join { conn, room, role } => {
                self.registry.join_at(room, role, conn, now)
            }

            RelayCommand::Signal {
                conn,
                to,
                room,
                data,
            } => self.registry.relay_signal(conn, to, &room, data),

            RelayCommand::Leave { conn, room } => self.registry.leave_at(&room, conn, now),

            RelayCommand::Disconnect { conn } => {
                info!("Connection {} disconnected", conn);
                Ok(self.registry.disconnect_at(conn, now))
            }

            RelayCommand::Stats { reply } => {
                let _ = reply.send(self.registry.stats());
                return;
            }
        };

        match result {
            Ok(out) => self.dispatch(out).await,
            Err(e) => log_dropped(&e),
        }
    }

    async fn dispatch(&self, out: Vec<Delivery>) {
        for Delivery { to, message } in out {
            self.signaling.deliver(to, message).await;
        }
    }
}

fn log_dropped(e: &RelayError) {
    warn!("Dropping relay command: {}", e);
}
