//! Helpers for exercising actors from unit tests.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::{Capability, Envelope, SessionRef, mailbox};

const WAIT: Duration = Duration::from_secs(2);

/// A mailbox drained by a background task, so actors never block on a test.
pub(crate) struct Inbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

pub(crate) fn inbox() -> (Capability, Inbox) {
    let (cap, mut mailbox) = mailbox();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(envelope) = mailbox.recv().await {
            if tx.send(envelope).is_err() {
                break;
            }
        }
    });
    (cap, Inbox { rx })
}

impl Inbox {
    /// Next envelope, failing the test if none arrives within two seconds.
    pub(crate) async fn next(&mut self) -> Envelope {
        tokio::time::timeout(WAIT, self.rx.recv())
            .await
            .expect("timed out waiting for an envelope")
            .expect("inbox closed")
    }

    /// Next envelope with no deadline, for tests running on paused time.
    pub(crate) async fn recv(&mut self) -> Envelope {
        self.rx.recv().await.expect("inbox closed")
    }

    /// Assert nothing arrives for a short while.
    pub(crate) async fn assert_silent(&mut self) {
        let next = tokio::time::timeout(Duration::from_millis(100), self.rx.recv()).await;
        assert!(next.is_err(), "unexpected envelope: {:?}", next);
    }
}

/// A stand-in session: its reference plus the inboxes behind it.
pub(crate) fn session(name: &str) -> (SessionRef, Inbox, Inbox) {
    let (reply, replies) = inbox();
    let (errors, failures) = inbox();
    (
        SessionRef {
            name: name.to_string(),
            reply,
            errors,
        },
        replies,
        failures,
    )
}
