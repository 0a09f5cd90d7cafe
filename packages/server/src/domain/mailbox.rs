//! Actor mailboxes and the capabilities that post to them.
//!
//! A mailbox is a depth-1 queue in which every delivery carries an
//! acknowledgement. [`Capability::send`] resolves only once the owning loop has
//! dequeued the envelope, so a send is a rendezvous with the receiver: it keeps
//! per-sender FIFO order and a slow receiver throttles everyone posting to it.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use super::{ChatError, Envelope};

struct Delivery {
    envelope: Envelope,
    ack: oneshot::Sender<()>,
}

/// Create a mailbox and the first capability that posts to it.
pub fn mailbox() -> (Capability, Mailbox) {
    let (tx, rx) = mpsc::channel(1);
    (Capability { tx }, Mailbox { rx })
}

/// Opaque send-only reference to one actor queue.
///
/// Capabilities are handed out, never looked up: the only way to hold a room's
/// capability is to receive it in a grant. Two capabilities are equal when
/// they post to the same mailbox.
#[derive(Clone)]
pub struct Capability {
    tx: mpsc::Sender<Delivery>,
}

impl Capability {
    /// Post an envelope and wait until the receiving loop accepts it.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Unreachable` if the mailbox was dropped, either
    /// before the envelope was queued or while it was still waiting in the queue.
    pub async fn send(&self, envelope: Envelope) -> Result<(), ChatError> {
        let (ack, accepted) = oneshot::channel();
        self.tx
            .send(Delivery { envelope, ack })
            .await
            .map_err(|_| ChatError::Unreachable)?;
        accepted.await.map_err(|_| ChatError::Unreachable)
    }

    /// Whether the owning mailbox has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl Eq for Capability {}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving end of an actor queue, owned by exactly one loop.
pub struct Mailbox {
    rx: mpsc::Receiver<Delivery>,
}

impl Mailbox {
    /// Dequeue the next envelope and acknowledge it to its sender.
    ///
    /// Returns `None` once every capability for this mailbox has been dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        let Delivery { envelope, ack } = self.rx.recv().await?;
        // The sender may have given up waiting; the envelope was still delivered.
        let _ = ack.send(());
        Some(envelope)
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").finish_non_exhaustive()
    }
}
