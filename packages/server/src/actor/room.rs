//! Room actor: sole owner of one room's members, history and lifetime.
//!
//! A room listens on two mailboxes. Its message mailbox takes content to
//! broadcast; its control mailbox takes `join` and `leave` directives. Every
//! event is handled to completion before the next one is taken. When the
//! room's lifetime elapses it drops both mailboxes, tells every member it has
//! expired, sends `destroy` to the Directory and stops.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use parley_shared::time::Clock;
use crate::{
    config::ServerConfig,
    domain::{
        Capability, ChatError, ClientName, Envelope, Grant, Kind, Mailbox, Origin, RoomName, Verb,
        mailbox,
    },
};

/// What the Directory keeps about a room it created.
#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub name: RoomName,
    pub message: Capability,
    pub control: Capability,
    /// Unix timestamp (milliseconds)
    pub created_at: i64,
}

/// Lifecycle of a room; `Expired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Active,
    Expired,
}

pub struct Room {
    name: RoomName,
    state: RoomState,
    members: HashMap<ClientName, Capability>,
    history: VecDeque<Envelope>,
    history_capacity: usize,
    created_at: i64,
    expires_at: i64,
    lifetime: Duration,
    message: Capability,
    control: Capability,
    directory: Capability,
    clock: Arc<dyn Clock>,
}

impl Room {
    fn new(
        name: RoomName,
        config: &ServerConfig,
        directory: Capability,
        clock: Arc<dyn Clock>,
    ) -> (Self, Mailbox, Mailbox) {
        let (message, messages) = mailbox();
        let (control, directives) = mailbox();
        let created_at = clock.now_millis();
        let lifetime_millis = i64::try_from(config.room_lifetime.as_millis()).unwrap_or(i64::MAX);
        let room = Self {
            name,
            state: RoomState::Active,
            members: HashMap::new(),
            history: VecDeque::with_capacity(config.history_capacity.min(1024)),
            history_capacity: config.history_capacity,
            created_at,
            expires_at: created_at.saturating_add(lifetime_millis),
            lifetime: config.room_lifetime,
            message,
            control,
            directory,
            clock,
        };
        (room, messages, directives)
    }

    /// Start a room in its own task and return the record the Directory keeps.
    ///
    /// # Arguments
    ///
    /// * `name` - The room's unique name
    /// * `config` - History capacity and lifetime
    /// * `directory` - Where the room sends `destroy` once it expires
    /// * `clock` - Source of the creation and expiry timestamps
    pub fn spawn(
        name: RoomName,
        config: &ServerConfig,
        directory: Capability,
        clock: Arc<dyn Clock>,
    ) -> RoomRecord {
        let (room, messages, directives) = Self::new(name, config, directory, clock);
        let record = room.record();
        tokio::spawn(room.run(messages, directives));
        record
    }

    fn record(&self) -> RoomRecord {
        RoomRecord {
            name: self.name.clone(),
            message: self.message.clone(),
            control: self.control.clone(),
            created_at: self.created_at,
        }
    }

    async fn run(mut self, mut messages: Mailbox, mut directives: Mailbox) {
        tracing::info!(
            "Room '{}' opened, expires at {}",
            self.name,
            parley_shared::time::timestamp_to_rfc3339(self.expires_at)
        );
        // Lifetimes past the timer's range sleep until the far future.
        let expiry = tokio::time::sleep(self.lifetime);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                () = &mut expiry => break,
                Some(envelope) = directives.recv() => self.handle_control(envelope).await,
                Some(envelope) = messages.recv() => self.handle_content(envelope).await,
            }
        }

        // Closing both queues first makes every pending and later send fail.
        drop(messages);
        drop(directives);
        self.expire().await;
    }

    async fn handle_control(&mut self, envelope: Envelope) {
        match envelope.kind() {
            Kind::Command(Verb::Join) => self.join(&envelope).await,
            Kind::Command(Verb::Leave) => self.leave(&envelope),
            other => tracing::warn!("Room '{}' ignored control envelope {:?}", self.name, other),
        }
    }

    async fn join(&mut self, envelope: &Envelope) {
        let Some(session) = envelope.session() else {
            tracing::warn!("Room '{}' got a join without a session", self.name);
            return;
        };
        let name = match ClientName::new(session.name.as_str()) {
            Ok(name) => name,
            Err(e) => {
                if session.reply.send(Envelope::error(Verb::Join.as_str(), &e)).await.is_err() {
                    tracing::warn!("Failed to reject join of '{}' to '{}'", session.name, self.name);
                }
                return;
            }
        };

        if self.members.contains_key(&name) {
            let notice = Envelope::error(
                Verb::Join.as_str(),
                &ChatError::AlreadyMember(self.name.to_string()),
            );
            if session.reply.send(notice).await.is_err() {
                tracing::warn!("Failed to tell '{}' they already joined '{}'", name, self.name);
            }
            return;
        }

        let reply = session.reply.clone();
        self.members.insert(name.clone(), reply.clone());

        let handshake = [
            Envelope::grant(self.name.as_str(), Grant::Message(self.message.clone())),
            Envelope::grant(self.name.as_str(), Grant::Control(self.control.clone())),
        ]
        .into_iter()
        .chain(self.history.iter().cloned());

        for envelope in handshake {
            if reply.send(envelope).await.is_err() {
                tracing::warn!("'{}' vanished while joining '{}'", name, self.name);
                self.members.remove(&name);
                return;
            }
        }

        tracing::info!("{} has joined {} chatroom", name, self.name);
    }

    fn leave(&mut self, envelope: &Envelope) {
        let Some(name) = envelope.author() else {
            return;
        };
        let Ok(name) = ClientName::new(name) else {
            return;
        };
        if self.members.remove(&name).is_some() {
            tracing::info!("{} has left {} chatroom", name, self.name);
        } else {
            tracing::debug!("{} left {} without being a member", name, self.name);
        }
    }

    async fn handle_content(&mut self, envelope: Envelope) {
        if envelope.kind() != &Kind::Content {
            tracing::warn!(
                "Room '{}' ignored non-content envelope {:?}",
                self.name,
                envelope.kind()
            );
            return;
        }

        self.history.push_back(envelope.clone());
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }

        tracing::debug!(
            "Broadcasting in '{}' from '{}' to {} members",
            self.name,
            envelope.author().unwrap_or("?"),
            self.members.len()
        );
        self.broadcast(&envelope).await;
    }

    /// Deliver to every member, pruning those whose mailbox is gone.
    async fn broadcast(&mut self, envelope: &Envelope) {
        let mut unreachable = Vec::new();
        for (name, member) in &self.members {
            if member.send(envelope.clone()).await.is_err() {
                unreachable.push(name.clone());
            }
        }
        for name in unreachable {
            tracing::warn!("Dropping unreachable member '{}' from '{}'", name, self.name);
            self.members.remove(&name);
        }
    }

    async fn expire(mut self) {
        self.state = RoomState::Expired;
        tracing::info!("Room '{}' is now {:?}", self.name, self.state);

        let now = self.clock.now_millis();
        let notice = Envelope::expired(self.name.as_str(), self.control.clone(), now);
        self.broadcast(&notice).await;
        self.members.clear();

        let destroy = Envelope::new(
            Kind::Command(Verb::Destroy),
            self.name.as_str(),
            "",
            Some(Origin::Room(self.control.clone())),
            now,
        );
        if self.directory.send(destroy).await.is_err() {
            tracing::warn!("Directory unreachable while destroying '{}'", self.name);
        }
    }
}
