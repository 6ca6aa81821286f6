#![cfg(feature = "std")]

use rand::Rng;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{
    config::SessionConfig,
    core::RoomCode,
    establish::{HostedRoom, Opened},
    session::{Command, Effect, Event, Phase, Session, Update},
    transport::Transport,
};

/// Drives one peer: a single loop that waits for the next event (local
/// command, inbound message, channel open or close), hands it to the
/// [`Session`] and carries out the resulting effects.
pub struct PeerNode<R> {
    session: Session,
    transport: Option<Box<dyn Transport>>,
    room: Option<HostedRoom>,
    config: SessionConfig,
    rng: R,
    updates: UnboundedSender<Update>,
}

impl<R: Rng + Send> PeerNode<R> {
    /// Node for a host whose room is registered but has no opponent yet.
    pub fn host(room: HostedRoom, config: SessionConfig, rng: R, updates: UnboundedSender<Update>) -> Self {
        Self {
            session: Session::host(room.code(), room.local_username()),
            transport: None,
            room: Some(room),
            config,
            rng,
            updates,
        }
    }

    /// Node for a joiner whose channel to `room` is already open.
    pub fn joiner(
        room: RoomCode,
        local_username: &str,
        opened: Opened,
        config: SessionConfig,
        rng: R,
        updates: UnboundedSender<Update>,
    ) -> Self {
        Self {
            session: Session::joiner(room, local_username, Some(opened.remote_username)),
            transport: Some(opened.transport),
            room: None,
            config,
            rng,
            updates,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until the session is back to idle. A closed command channel
    /// counts as a request to quit.
    pub async fn run(&mut self, commands: &mut UnboundedReceiver<Command>) -> anyhow::Result<()> {
        while !self.session.is_idle() {
            let event = self.next_event(commands).await?;
            let effects = self.session.handle(event, &mut self.rng);
            for effect in effects {
                self.apply(effect).await;
            }
        }
        Ok(())
    }

    async fn next_event(&mut self, commands: &mut UnboundedReceiver<Command>) -> anyhow::Result<Event> {
        if self.session.phase() == Phase::AwaitingOpponent {
            let room = self
                .room
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("Host is waiting without a room"))?;
            let opened = tokio::select! {
                cmd = commands.recv() => return Ok(Event::Local(cmd.unwrap_or(Command::Quit))),
                opened = room.accept_opponent() => opened?,
            };
            self.transport = Some(opened.transport);
            return Ok(Event::Opened {
                remote_username: opened.remote_username,
            });
        }

        let event = match self.transport.as_mut() {
            Some(transport) => tokio::select! {
                cmd = commands.recv() => Event::Local(cmd.unwrap_or(Command::Quit)),
                msg = transport.recv() => match msg {
                    Ok(msg) => Event::Remote(msg),
                    Err(e) => {
                        log::debug!("Channel closed: {:#}", e);
                        Event::Closed
                    }
                },
            },
            None => Event::Local(commands.recv().await.unwrap_or(Command::Quit)),
        };
        if event == Event::Closed {
            self.transport = None;
        }
        Ok(event)
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Send(msg) => match self.transport.as_mut() {
                Some(transport) => {
                    let kind = msg.kind();
                    log::debug!("Sending {}", kind);
                    if let Err(e) = transport.send(msg).await {
                        log::warn!("Failed to send {}: {:#}", kind, e);
                    }
                }
                None => log::debug!("No channel, dropping {}", msg.kind()),
            },
            Effect::Notify(update) => {
                // The front end may already be gone when we are shutting down.
                let _ = self.updates.send(update);
            }
            Effect::Teardown => {
                if self.transport.is_some() {
                    tokio::time::sleep(self.config.quit_flush).await;
                }
                self.transport = None;
                self.room = None;
                log::info!("Session torn down");
            }
        }
    }
}
