//! One TCP connection to the chat server.

use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};

use crate::{
    domain::{LoginReply, classify_login_reply, is_farewell},
    error::ClientError,
};

use super::ui::{print_server_line, redisplay_prompt};

/// Run one client session: log in as `username`, then relay lines both ways
/// until the server says goodbye or the connection drops.
///
/// # Arguments
///
/// * `addr` - Server address (e.g., "127.0.0.1:2000")
/// * `username` - Name sent as the login line
/// * `input` - Lines typed by the user
///
/// # Errors
///
/// Returns `ClientError::LoginRejected` if the server refused the name and
/// `ClientError::ConnectionError` if the connection failed or was lost.
pub async fn run_client_session(
    addr: &str,
    username: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, username).await?;
    let Some(first) = lines.next_line().await? else {
        return Err(ClientError::ConnectionError(
            "Server closed the connection during login".to_string(),
        ));
    };
    match classify_login_reply(&first) {
        LoginReply::Accepted => {
            tracing::info!("Logged in as '{}'", username);
            print_server_line(&first);
        }
        LoginReply::Rejected(reason) => return Err(ClientError::LoginRejected(reason)),
        LoginReply::TimedOut => {
            return Err(ClientError::ConnectionError("Login timed out".to_string()));
        }
    }

    // Spawn a task to print incoming lines
    let mut read_task = tokio::spawn(async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    print_server_line(&line);
                    if is_farewell(&line) {
                        return Ok(());
                    }
                }
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionError("Connection lost".to_string()));
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    return Err(ClientError::from(e));
                }
            }
        }
    });

    loop {
        tokio::select! {
            result = &mut read_task => return flatten(result),
            line = input.recv() => match line {
                Some(line) => {
                    if let Err(e) = send_line(&mut write_half, &line).await {
                        tracing::warn!("Failed to send line: {}", e);
                        read_task.abort();
                        return Err(ClientError::from(e));
                    }
                    redisplay_prompt();
                }
                None => {
                    // Input closed: log out and wait for the farewell
                    if let Err(e) = send_line(&mut write_half, "?logout").await {
                        read_task.abort();
                        return Err(ClientError::from(e));
                    }
                    return flatten(read_task.await);
                }
            },
        }
    }
}

fn flatten(
    result: Result<Result<(), ClientError>, tokio::task::JoinError>,
) -> Result<(), ClientError> {
    result.unwrap_or_else(|e| Err(ClientError::ConnectionError(e.to_string())))
}

async fn send_line<W>(out: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
