//! Directory actor: sole owner of the client table and the room table.
//!
//! Every login, logout, room creation, join dispatch and listing goes through
//! one mailbox consumed by one loop, so the tables are never touched by two
//! requests at once and no lock is needed.

use std::{collections::HashMap, sync::Arc};

use parley_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{
        Capability, ChatError, ClientName, Envelope, Kind, Mailbox, Origin, RoomName, SessionRef,
        Verb, mailbox,
    },
};

use super::room::{Room, RoomRecord};

/// What the Directory keeps about a logged-in client.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub name: ClientName,
    pub reply: Capability,
    pub errors: Capability,
}

pub struct Directory {
    config: ServerConfig,
    clients: HashMap<ClientName, ClientRecord>,
    rooms: HashMap<RoomName, RoomRecord>,
    /// Handed to rooms so they can report their own expiry
    inbox: Capability,
    clock: Arc<dyn Clock>,
}

impl Directory {
    fn new(config: ServerConfig, clock: Arc<dyn Clock>) -> (Self, Mailbox) {
        let (inbox, mailbox) = mailbox();
        let directory = Self {
            config,
            clients: HashMap::with_capacity(config.max_clients),
            rooms: HashMap::new(),
            inbox,
            clock,
        };
        (directory, mailbox)
    }

    /// Start the Directory in its own task and return its capability.
    pub fn spawn(config: ServerConfig, clock: Arc<dyn Clock>) -> Capability {
        let (directory, mailbox) = Self::new(config, clock);
        let capability = directory.inbox.clone();
        tokio::spawn(directory.run(mailbox));
        capability
    }

    async fn run(mut self, mut mailbox: Mailbox) {
        tracing::info!(
            "Directory running (max {} clients)",
            self.config.max_clients
        );
        while let Some(envelope) = mailbox.recv().await {
            self.handle(envelope).await;
        }
    }

    /// Dispatch one envelope by verb; every branch replies or mutates, never both partially.
    async fn handle(&mut self, envelope: Envelope) {
        let Kind::Command(verb) = *envelope.kind() else {
            tracing::warn!("Unknown command: {:?}", envelope);
            return;
        };
        let argument = envelope.body();
        match (verb, envelope.session()) {
            (Verb::Destroy, _) => self.destroy_room(&envelope),
            (_, None) => {
                tracing::warn!("Command '{}' arrived without a session to reply to", verb)
            }
            (Verb::Login, Some(session)) => self.login(session).await,
            (Verb::Logout, Some(session)) => self.logout(session).await,
            (Verb::Create, Some(session)) => self.create_room(argument, session).await,
            (Verb::Join, Some(session)) => self.join_room(argument, session).await,
            (Verb::Leave, Some(session)) => self.leave_room(argument, session).await,
            (Verb::List, Some(session)) => self.list_rooms(&session.reply).await,
            (Verb::Help, Some(session)) => self.help(&session.reply).await,
        }
    }

    async fn login(&mut self, session: &SessionRef) {
        if self.clients.len() >= self.config.max_clients {
            let error = ChatError::CapacityExceeded {
                max: self.config.max_clients,
            };
            tracing::warn!("Login of '{}' rejected: {}", session.name, error);
            deliver(&session.errors, Envelope::error(Verb::Login.as_str(), &error)).await;
            return;
        }

        let name = match ClientName::new(session.name.as_str()) {
            Ok(name) => name,
            Err(error) => {
                deliver(&session.errors, Envelope::error(Verb::Login.as_str(), &error)).await;
                return;
            }
        };

        if self.clients.contains_key(&name) {
            let error = ChatError::NameInUse(name.to_string());
            tracing::warn!("Login rejected: {}", error);
            deliver(&session.errors, Envelope::error(Verb::Login.as_str(), &error)).await;
            return;
        }

        self.clients.insert(
            name.clone(),
            ClientRecord {
                name: name.clone(),
                reply: session.reply.clone(),
                errors: session.errors.clone(),
            },
        );

        // A session that gave up waiting must not keep the name reserved.
        if session
            .reply
            .send(Envelope::notice("login successful", ""))
            .await
            .is_err()
        {
            tracing::warn!("'{}' left before login completed", name);
            self.clients.remove(&name);
            return;
        }

        self.help(&session.reply).await;
        tracing::info!("{} logged in", name);
    }

    async fn logout(&mut self, session: &SessionRef) {
        let Ok(name) = ClientName::new(session.name.as_str()) else {
            return;
        };
        match self.clients.get(&name) {
            Some(record) if record.reply == session.reply => {
                self.clients.remove(&name);
                tracing::info!("{} disconnected", name);
                deliver(&session.errors, Envelope::exit()).await;
            }
            Some(_) => tracing::warn!("Ignoring logout of '{}' from another session", name),
            None => tracing::debug!("Ignoring logout of '{}', not logged in", name),
        }
    }

    async fn create_room(&mut self, argument: &str, session: &SessionRef) {
        let name = match RoomName::new(argument) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!("Create chatroom failed: {}", error);
                deliver(&session.errors, Envelope::error(Verb::Create.as_str(), &error)).await;
                return;
            }
        };

        if self.rooms.contains_key(&name) {
            tracing::warn!("Create chatroom failed: '{}' exists", name);
            let error = ChatError::RoomExists(name.to_string());
            deliver(&session.errors, Envelope::error(Verb::Create.as_str(), &error)).await;
            return;
        }

        let record = Room::spawn(
            name.clone(),
            &self.config,
            self.inbox.clone(),
            self.clock.clone(),
        );
        self.rooms.insert(name.clone(), record);
        tracing::info!("Created {} chatroom", name);

        let body = format!(
            "Chatroom created. Use: \"?join {}\" (without the quotes) to join room.",
            name
        );
        deliver(&session.reply, Envelope::notice("", body)).await;
    }

    /// Forward the join to the room; the room answers the requester itself.
    async fn join_room(&mut self, argument: &str, session: &SessionRef) {
        let Some((name, control)) = self.lookup(argument) else {
            tracing::warn!("Join chatroom failed: '{}' does not exist", argument.trim());
            let error = ChatError::RoomNotFound(argument.trim().to_string());
            deliver(&session.errors, Envelope::error(Verb::Join.as_str(), &error)).await;
            return;
        };

        let directive = Envelope::command(Verb::Join, name.as_str(), session.clone());
        if control.send(directive).await.is_err() {
            self.forget_room(&name, &control, session, Verb::Join).await;
        }
    }

    async fn leave_room(&mut self, argument: &str, session: &SessionRef) {
        let Some((name, control)) = self.lookup(argument) else {
            let error = ChatError::RoomNotFound(argument.trim().to_string());
            deliver(&session.errors, Envelope::error(Verb::Leave.as_str(), &error)).await;
            return;
        };

        let directive = Envelope::command(Verb::Leave, name.as_str(), session.clone());
        if control.send(directive).await.is_err() {
            self.forget_room(&name, &control, session, Verb::Leave).await;
        }
    }

    async fn list_rooms(&self, reply: &Capability) {
        let mut names: Vec<&RoomName> = self.rooms.keys().collect();
        names.sort();

        let listing = std::iter::once(Envelope::notice("Available rooms", ""))
            .chain(names.into_iter().map(|name| Envelope::notice("", name.as_str())));
        for envelope in listing {
            if !deliver(reply, envelope).await {
                return;
            }
        }
    }

    async fn help(&self, reply: &Capability) {
        let usage = std::iter::once(Envelope::notice("Usage instructions", ""))
            .chain(Verb::USER_VERBS.iter().map(|verb| Envelope::notice("", verb.usage())));
        for envelope in usage {
            if !deliver(reply, envelope).await {
                return;
            }
        }
    }

    fn destroy_room(&mut self, envelope: &Envelope) {
        let Some(Origin::Room(control)) = envelope.origin() else {
            tracing::warn!("Ignoring destroy that did not come from a room");
            return;
        };
        let Ok(name) = RoomName::new(envelope.subject()) else {
            return;
        };
        // Only the room that registered under this name may remove it.
        if self.rooms.get(&name).is_some_and(|record| &record.control == control) {
            self.rooms.remove(&name);
            tracing::info!("Removed expired chatroom {}", name);
        } else {
            tracing::debug!("Ignoring stale destroy for {}", name);
        }
    }

    fn lookup(&self, argument: &str) -> Option<(RoomName, Capability)> {
        let name = RoomName::new(argument).ok()?;
        let record = self.rooms.get(&name)?;
        Some((record.name.clone(), record.control.clone()))
    }

    /// Drop a record whose room has already terminated and tell the requester.
    async fn forget_room(
        &mut self,
        name: &RoomName,
        control: &Capability,
        session: &SessionRef,
        verb: Verb,
    ) {
        if self.rooms.get(name).is_some_and(|record| &record.control == control) {
            self.rooms.remove(name);
        }
        tracing::warn!("Chatroom {} terminated before {} was forwarded", name, verb);
        let error = ChatError::RoomGone(name.to_string());
        deliver(&session.errors, Envelope::error(verb.as_str(), &error)).await;
    }
}

/// Send a reply, logging instead of failing when the requester is gone.
///
/// Returns whether the envelope was delivered.
async fn deliver(to: &Capability, envelope: Envelope) -> bool {
    match to.send(envelope).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Reply not delivered: {}", e);
            false
        }
    }
}
