//! Unix socket session management

use std::sync::Arc;

use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::unix::{OwnedReadHalf, OwnedWriteHalf},
    sync::Mutex,
};

use crate::{
    core::{error::TransportResult, types::SessionId},
    protocol::{JsonRpcNotification, JsonRpcResponse},
};

/// Unix socket client session
///
/// Clones share the writer, so responses from concurrent requests and
/// forwarded notifications interleave as whole lines.
#[derive(Debug, Clone)]
pub struct UnixSocketSession {
    id: SessionId,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl UnixSocketSession {
    /// Create a new Unix socket session
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            id: SessionId::new(),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Send a JSON-RPC response
    pub async fn send_response(&self, response: &JsonRpcResponse) -> TransportResult<()> {
        self.send_line(response).await
    }

    /// Send a JSON-RPC notification
    pub async fn send_notification(
        &self,
        notification: &JsonRpcNotification,
    ) -> TransportResult<()> {
        self.send_line(notification).await
    }

    async fn send_line<T: Serialize>(&self, message: &T) -> TransportResult<()> {
        let mut json = serde_json::to_vec(message)?;
        json.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&json).await?;
        writer.flush().await?;

        Ok(())
    }
}

/// Session reader for processing incoming messages
pub struct SessionReader {
    reader: BufReader<OwnedReadHalf>,
}

impl SessionReader {
    /// Create a new session reader
    pub fn new(reader: OwnedReadHalf) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next line from the socket, `None` at end of stream
    pub async fn read_line(&mut self) -> TransportResult<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);

        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::events::{BridgeEvent, SdkStateChangedParams},
        protocol::{JsonRpcRequest, Request, RequestId, Response},
    };
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let (client, server) = UnixStream::pair().unwrap();
        let session = UnixSocketSession::new(server.into_split().1);
        let other = UnixSocketSession::new(client.into_split().1);

        assert_ne!(session.id(), other.id());
        assert_eq!(session.clone().id(), session.id());
    }

    #[tokio::test]
    async fn test_session_read_write() {
        let (client, server) = UnixStream::pair().unwrap();
        let (read_half, _write_half) = server.into_split();
        let mut reader = SessionReader::new(read_half);

        let request = JsonRpcRequest::new(Request::GetStates, RequestId::Number(1));
        let json = serde_json::to_string(&request).unwrap();
        let (_client_read, mut client_write) = client.into_split();

        client_write.write_all(json.as_bytes()).await.unwrap();
        client_write.write_all(b"\r\n").await.unwrap();
        client_write.flush().await.unwrap();

        let line = reader.read_line().await.unwrap().unwrap();
        assert_eq!(line, json);
        let received = JsonRpcRequest::parse(&line).unwrap();
        assert_eq!(received.id, RequestId::Number(1));
    }

    #[tokio::test]
    async fn test_responses_and_notifications_are_lines() {
        let (client, server) = UnixStream::pair().unwrap();
        let session = UnixSocketSession::new(server.into_split().1);
        let mut reader = SessionReader::new(client.into_split().0);

        session
            .send_response(&JsonRpcResponse::success(
                Response::ack(),
                RequestId::Number(3),
            ))
            .await
            .unwrap();
        session
            .send_notification(&JsonRpcNotification::new(BridgeEvent::SdkStateChanged(
                SdkStateChangedParams {
                    is_scanning: true,
                    states: vec![],
                },
            )))
            .await
            .unwrap();

        let first = reader.read_line().await.unwrap().unwrap();
        assert!(first.contains(r#""id":3"#));
        let second = reader.read_line().await.unwrap().unwrap();
        assert!(second.contains(r#""method":"sdkStateChanged""#));
    }

    #[tokio::test]
    async fn test_session_reader_eof() {
        let (client, server) = UnixStream::pair().unwrap();
        let (read_half, _) = server.into_split();
        let mut reader = SessionReader::new(read_half);

        drop(client);

        let line = reader.read_line().await.unwrap();
        assert!(line.is_none());
    }
}
