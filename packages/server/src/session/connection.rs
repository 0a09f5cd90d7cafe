//! One client's session, split into a reader task and a writer task.
//!
//! The reader owns the local room index: it turns user lines into envelopes
//! and is the only place that decides whether the user may post to a room.
//! The writer drains the session's two mailboxes onto the transport. When the
//! writer sees a room's capability grants it hands them to the reader over an
//! unbounded channel, so the writer never waits on the reader and a room
//! broadcasting to this session can never wait on a send this session is
//! making to the room.

use std::{collections::HashMap, sync::Arc};

use parley_shared::time::Clock;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines},
    sync::mpsc,
};

use crate::{
    config::ServerConfig,
    domain::{Capability, ChatError, Envelope, Grant, Kind, Mailbox, SessionRef, Verb, mailbox},
};

use super::{
    error::SessionError,
    formatter::LineFormatter,
    protocol::{Request, parse_line},
};

/// A room's two capabilities as held by a member.
#[derive(Debug, Clone)]
pub struct RoomCaps {
    pub message: Capability,
    pub control: Capability,
}

/// Writer to reader notifications about the local room index.
#[derive(Debug)]
enum SessionEvent {
    Joined { room: String, caps: RoomCaps },
    /// A join was answered with an error instead of a handshake
    JoinRefused,
    Expired { room: String },
}

enum LoginOutcome {
    Accepted(Envelope),
    Rejected(Envelope),
}

enum Flow {
    Continue,
    Stop,
}

/// Serve one connection from the login line until logout or disconnect.
///
/// # Arguments
///
/// * `stream` - The client's transport
/// * `directory` - Capability of the Directory actor
/// * `config` - Only `login_timeout` is read here
/// * `clock` - Stamps outgoing chat lines
///
/// # Errors
///
/// Returns an error if the login is rejected or times out, or if the
/// transport fails.
pub async fn serve_connection<S>(
    stream: S,
    directory: Capability,
    config: ServerConfig,
    clock: Arc<dyn Clock>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut lines = BufReader::new(read_half).lines();

    let Some(first) = lines.next_line().await? else {
        return Err(SessionError::ClosedBeforeLogin);
    };
    let name = first.trim().to_string();

    let (reply, mut replies) = mailbox();
    let (errors, mut failures) = mailbox();
    let me = SessionRef {
        name: name.clone(),
        reply,
        errors,
    };

    let handshake = login(&directory, &me, &mut replies, &mut failures);
    match tokio::time::timeout(config.login_timeout, handshake).await {
        Err(_elapsed) => {
            tracing::warn!("Login of '{}' timed out", name);
            write_line(&mut write_half, "timed out").await?;
            return Err(SessionError::LoginTimeout);
        }
        Ok(Err(_)) => {
            tracing::error!("Directory unreachable during login of '{}'", name);
            return Err(SessionError::DirectoryUnreachable);
        }
        Ok(Ok(LoginOutcome::Rejected(envelope))) => {
            if let Some(line) = LineFormatter::render(&envelope) {
                write_line(&mut write_half, &line).await?;
            }
            return Err(SessionError::LoginRejected(envelope.body().to_string()));
        }
        Ok(Ok(LoginOutcome::Accepted(envelope))) => {
            if let Some(line) = LineFormatter::render(&envelope) {
                write_line(&mut write_half, &line).await?;
            }
        }
    }

    let (events_tx, events) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(write_half, replies, failures, events_tx));

    let mut session = Session {
        me,
        directory,
        rooms: HashMap::new(),
        events,
        clock,
    };
    let result = session.read_loop(&mut lines).await;
    session.shutdown().await;
    drop(session);

    match writer.await {
        Ok(Err(e)) => tracing::debug!("Writer for '{}' stopped: {}", name, e),
        Err(e) => tracing::warn!("Writer for '{}' failed: {}", name, e),
        Ok(Ok(())) => {}
    }
    tracing::info!("Session of '{}' closed", name);
    result
}

/// Send the login and wait for the first answer on either mailbox.
async fn login(
    directory: &Capability,
    me: &SessionRef,
    replies: &mut Mailbox,
    failures: &mut Mailbox,
) -> Result<LoginOutcome, ChatError> {
    directory
        .send(Envelope::command(Verb::Login, me.name.as_str(), me.clone()))
        .await?;
    tokio::select! {
        Some(envelope) = replies.recv() => Ok(LoginOutcome::Accepted(envelope)),
        Some(envelope) = failures.recv() => Ok(LoginOutcome::Rejected(envelope)),
        else => Err(ChatError::Unreachable),
    }
}

struct Session {
    me: SessionRef,
    directory: Capability,
    /// Local room index, populated only by join handshakes
    rooms: HashMap<String, RoomCaps>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    clock: Arc<dyn Clock>,
}

impl Session {
    async fn read_loop<R>(&mut self, lines: &mut Lines<R>) -> Result<(), SessionError>
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        loop {
            tokio::select! {
                // Grants are applied before any further input is looked at.
                biased;
                Some(event) = self.events.recv() => self.apply(event),
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Flow::Stop = self.handle_line(&line).await {
                            return Ok(());
                        }
                    }
                    Ok(None) => {
                        tracing::info!("'{}' hung up", self.me.name);
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::warn!("Read from '{}' failed: {}", self.me.name, e);
                        return Err(e.into());
                    }
                },
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Joined { room, caps } => {
                self.rooms.insert(room, caps);
            }
            SessionEvent::JoinRefused => {}
            SessionEvent::Expired { room } => {
                self.rooms.remove(&room);
            }
        }
    }

    /// Block input until the pending join is answered, so the next line
    /// already sees the room in the index.
    async fn await_join(&mut self) -> Flow {
        while let Some(event) = self.events.recv().await {
            let settled = matches!(
                event,
                SessionEvent::Joined { .. } | SessionEvent::JoinRefused
            );
            self.apply(event);
            if settled {
                return Flow::Continue;
            }
        }
        tracing::debug!("Writer of '{}' stopped during a join", self.me.name);
        Flow::Stop
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        match parse_line(line) {
            Ok(None) => Flow::Continue,
            Ok(Some(Request::Say { room, text })) => {
                self.say(room, text).await;
                Flow::Continue
            }
            Ok(Some(Request::Command { verb, argument })) => self.dispatch(verb, argument).await,
            Err(e) => {
                self.notify(Envelope::error("parse", &e)).await;
                Flow::Continue
            }
        }
    }

    async fn dispatch(&mut self, verb: Verb, argument: String) -> Flow {
        match verb {
            Verb::Create | Verb::Join | Verb::List | Verb::Help => {
                let request = Envelope::command(verb, argument, self.me.clone());
                if self.directory.send(request).await.is_err() {
                    tracing::error!("Directory unreachable from '{}'", self.me.name);
                    return Flow::Stop;
                }
                if verb == Verb::Join {
                    return self.await_join().await;
                }
                Flow::Continue
            }
            Verb::Leave => {
                self.leave(argument.trim()).await;
                Flow::Continue
            }
            Verb::Logout => Flow::Stop,
            Verb::Login => {
                let error = ChatError::AlreadyLoggedIn(self.me.name.clone());
                self.notify(Envelope::error(verb.as_str(), &error)).await;
                Flow::Continue
            }
            Verb::Destroy => {
                tracing::warn!("'{}' sent a room-only verb", self.me.name);
                Flow::Continue
            }
        }
    }

    /// Post a chat line using only the local index.
    async fn say(&mut self, room: String, text: String) {
        let Some(caps) = self.rooms.get(&room) else {
            self.notify(Envelope::error("say", &ChatError::NotMember(room)))
                .await;
            return;
        };

        let content = Envelope::content(
            room.as_str(),
            self.me.name.as_str(),
            text,
            self.clock.now_millis(),
        );
        if caps.message.send(content).await.is_err() {
            self.rooms.remove(&room);
            self.notify(Envelope::error("say", &ChatError::RoomGone(room)))
                .await;
        }
    }

    async fn leave(&mut self, room: &str) {
        let Some(caps) = self.rooms.remove(room) else {
            let error = ChatError::NotMember(room.to_string());
            self.notify(Envelope::error(Verb::Leave.as_str(), &error))
                .await;
            return;
        };

        let directive = Envelope::command(Verb::Leave, room, self.me.clone());
        if caps.control.send(directive).await.is_err() {
            let error = ChatError::RoomGone(room.to_string());
            self.notify(Envelope::error(Verb::Leave.as_str(), &error))
                .await;
            return;
        }
        self.notify(Envelope::notice("", LineFormatter::format_left(room)))
            .await;
    }

    /// Leave every joined room, then log out.
    async fn shutdown(&mut self) {
        for (room, caps) in self.rooms.drain() {
            let directive = Envelope::command(Verb::Leave, room.as_str(), self.me.clone());
            if caps.control.send(directive).await.is_err() {
                tracing::debug!("'{}' already gone while '{}' logged out", room, self.me.name);
            }
        }
        let logout = Envelope::command(Verb::Logout, "", self.me.clone());
        if self.directory.send(logout).await.is_err() {
            tracing::error!("Directory unreachable during logout of '{}'", self.me.name);
        }
    }

    /// Report something to this session's own user.
    async fn notify(&self, envelope: Envelope) {
        if self.me.errors.send(envelope).await.is_err() {
            tracing::debug!("Writer of '{}' is gone", self.me.name);
        }
    }
}

async fn write_loop<W>(
    mut out: W,
    mut replies: Mailbox,
    mut failures: Mailbox,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // Message grants waiting for the control grant that completes a handshake
    let mut pending: HashMap<String, Capability> = HashMap::new();

    loop {
        let envelope = tokio::select! {
            Some(envelope) = replies.recv() => envelope,
            Some(envelope) = failures.recv() => envelope,
            else => return Ok(()),
        };
        let room = envelope.subject().to_string();

        let line = match envelope.kind() {
            Kind::Admin(Grant::Message(message)) => {
                pending.insert(room, message.clone());
                continue;
            }
            Kind::Admin(Grant::Control(control)) => {
                let Some(message) = pending.remove(&room) else {
                    tracing::warn!("Control grant for '{}' without a message grant", room);
                    continue;
                };
                let caps = RoomCaps {
                    message,
                    control: control.clone(),
                };
                let _ = events.send(SessionEvent::Joined {
                    room: room.clone(),
                    caps,
                });
                LineFormatter::format_joined(&room)
            }
            // Every join answer that is not a handshake is an error tagged "join".
            Kind::Error if envelope.subject() == Verb::Join.as_str() => {
                let _ = events.send(SessionEvent::JoinRefused);
                LineFormatter::format_error(envelope.body())
            }
            Kind::Expired => {
                let _ = events.send(SessionEvent::Expired { room });
                LineFormatter::format_expired(envelope.subject(), envelope.sent_at())
            }
            Kind::Exit => {
                if let Some(line) = LineFormatter::render(&envelope) {
                    write_line(&mut out, &line).await?;
                }
                return Ok(());
            }
            _ => match LineFormatter::render(&envelope) {
                Some(line) => line,
                None => {
                    tracing::debug!("Nothing to render for {:?}", envelope.kind());
                    continue;
                }
            },
        };
        write_line(&mut out, &line).await?;
    }
}

async fn write_line<W>(out: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
