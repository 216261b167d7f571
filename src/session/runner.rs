use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

use super::controller::SessionController;
use super::history::HistoryEntry;
use super::router::EventRouter;
use super::stats::SessionSnapshot;
use crate::transport::{TransportChannels, TransportEvent};

/// Operator commands accepted while a session runs
#[derive(Debug)]
pub enum SessionCommand {
    Start,
    Reset,
    SetMuted(bool),
    ToggleMute,
    SelectInput(PathBuf),
    History {
        limit: usize,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
}

/// A queued command, optionally acknowledged with the state it produced
struct Envelope {
    command: SessionCommand,
    applied: Option<oneshot::Sender<SessionSnapshot>>,
}

/// Cloneable handle for observing and commanding a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Queue a command without waiting for it to be applied
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.enqueue(command, None).await
    }

    /// Queue a command and wait for the state it produced
    pub async fn apply(&self, command: SessionCommand) -> Result<SessionSnapshot> {
        let (applied, rx) = oneshot::channel();
        self.enqueue(command, Some(applied)).await?;
        rx.await.context("Session stopped before applying the command")
    }

    async fn enqueue(
        &self,
        command: SessionCommand,
        applied: Option<oneshot::Sender<SessionSnapshot>>,
    ) -> Result<()> {
        self.commands
            .send(Envelope { command, applied })
            .await
            .context("Session is no longer running")
    }

    /// Last `limit` history entries, most recent first
    pub async fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::History { limit, reply }).await?;
        rx.await.context("Session dropped the history request")
    }
}

/// Drives one session: the single owner of router and controller
///
/// Transport events and operator commands are processed one at a time, each
/// to completion, so the controller needs no locking.
pub struct SessionRunner {
    router: EventRouter,
    controller: SessionController,
    command_tx: mpsc::Sender<Envelope>,
    command_rx: mpsc::Receiver<Envelope>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionRunner {
    pub fn new(controller: SessionController) -> Self {
        let router = EventRouter::new();
        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, _) =
            watch::channel(controller.snapshot(router.connection(), router.is_joined()));

        Self {
            router,
            controller,
            command_tx,
            command_rx,
            snapshot_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.command_tx.clone(),
            snapshots: self.snapshot_tx.subscribe(),
        }
    }

    /// Process events until the transport closes its event channel
    ///
    /// Returns the final state.
    pub async fn run(mut self, channels: TransportChannels) -> Result<SessionSnapshot> {
        let TransportChannels {
            mut events,
            commands: outbound,
        } = channels;

        info!("Session runner started: {}", self.controller.session_id());

        loop {
            tokio::select! {
                // Drain queued transport events before operator commands
                biased;

                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    self.handle_transport_event(event, &outbound).await;
                    self.publish();
                }
                Some(Envelope { command, applied }) = self.command_rx.recv() => {
                    self.handle_command(command);
                    // Published before the ack so readers never see older state
                    let snapshot = self.publish();
                    if let Some(applied) = applied {
                        let _ = applied.send(snapshot);
                    }
                }
            }
        }

        info!("Session runner stopped: {}", self.controller.session_id());
        Ok(self.current_snapshot())
    }

    async fn handle_transport_event(
        &mut self,
        event: TransportEvent,
        outbound: &mpsc::Sender<crate::transport::OutboundCommand>,
    ) {
        match event {
            TransportEvent::State(state) => {
                let session_id = self.controller.session_id().to_string();
                if let Some(command) = self.router.on_connection_state(state, &session_id) {
                    if let Err(e) = outbound.send(command).await {
                        warn!("Transport dropped join command: {}", e);
                    }
                }
            }
            TransportEvent::Message { name, payload } => {
                self.router
                    .route(&mut self.controller, &name, payload, Utc::now());
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => self.controller.start(),
            SessionCommand::Reset => self.controller.reset(),
            SessionCommand::SetMuted(muted) => self.controller.set_muted(muted),
            SessionCommand::ToggleMute => {
                self.controller.toggle_mute();
            }
            SessionCommand::SelectInput(path) => self.controller.select_input(path),
            SessionCommand::History { limit, reply } => {
                let _ = reply.send(self.controller.recent_history(limit));
            }
        }
    }

    fn current_snapshot(&self) -> SessionSnapshot {
        self.controller
            .snapshot(self.router.connection(), self.router.is_joined())
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.current_snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }
}
