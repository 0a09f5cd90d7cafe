//! Shared helpers for driving chat sessions from integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// Fixed instant every test clock reports: 2023-01-01T00:00:00Z
pub const FIXED_MILLIS: i64 = 1672531200000;
pub const FIXED_RFC3339: &str = "2023-01-01T00:00:00.000Z";

/// "Usage instructions" followed by one line per user verb
pub const HELP_LINES: usize = 7;

const WAIT: Duration = Duration::from_secs(2);

/// Line-level view of one client connection
pub struct TestClient<R, W> {
    lines: Lines<BufReader<R>>,
    write: W,
}

impl<R, W> TestClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(read: R, write: W) -> Self {
        Self {
            lines: BufReader::new(read).lines(),
            write,
        }
    }

    /// Send one line to the server
    pub async fn send(&mut self, line: &str) {
        self.write
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("Failed to write line");
        self.write.flush().await.expect("Failed to flush");
    }

    /// Next line from the server, failing the test after two seconds
    pub async fn line(&mut self) -> String {
        tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("Timed out waiting for a line")
            .expect("Failed to read line")
            .expect("Connection closed")
    }

    /// Whether the server closed the connection within two seconds
    pub async fn closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(WAIT, self.lines.next_line()).await,
            Ok(Ok(None)) | Ok(Err(_))
        )
    }

    pub async fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.line().await;
        }
    }

    /// Assert nothing arrives for a short while
    pub async fn assert_silent(&mut self) {
        let next = tokio::time::timeout(Duration::from_millis(150), self.lines.next_line()).await;
        assert!(next.is_err(), "unexpected line: {:?}", next);
    }

    /// Send the username and consume the login banner and help text
    pub async fn login(&mut self, name: &str) {
        self.send(name).await;
        assert_eq!(self.line().await, "login successful");
        assert_eq!(self.line().await, "Usage instructions");
        self.skip(HELP_LINES - 1).await;
    }

    /// Create `room` and consume the confirmation
    pub async fn create(&mut self, room: &str) {
        self.send(&format!("?create {}", room)).await;
        assert_eq!(
            self.line().await,
            format!(
                "Chatroom created. Use: \"?join {}\" (without the quotes) to join room.",
                room
            )
        );
    }

    /// Join `room` and consume the joined notice
    pub async fn join(&mut self, room: &str) {
        self.send(&format!("?join {}", room)).await;
        assert_eq!(self.line().await, joined_line(room));
    }
}

pub fn joined_line(room: &str) -> String {
    format!(
        "{}: You have joined chatroom, use ?{} followed by space and the message to send to room",
        room, room
    )
}

pub fn chat_line(room: &str, from: &str, text: &str) -> String {
    format!("[{} {}] {}: {}", room, FIXED_RFC3339, from, text)
}
