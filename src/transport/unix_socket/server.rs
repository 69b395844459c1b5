//! Unix socket server implementation

use std::{fs::Permissions, os::unix::fs::PermissionsExt, path::Path, sync::Arc};

use tokio::{
    fs,
    net::{UnixListener, UnixStream},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    core::{
        bridge::MobileAccessBridge,
        error::{TransportError, TransportResult},
        events::BridgeEvent,
    },
    protocol::{JsonRpcNotification, JsonRpcRequest},
    sdk::access_sdk::SdkProvider,
    transport::unix_socket::{
        handler::RequestHandler,
        session::{SessionReader, UnixSocketSession},
    },
};

/// Unix socket server
///
/// Every connected client may issue requests and receives every bridge event
/// as a notification.
pub struct UnixSocketServer<P: SdkProvider> {
    listener: UnixListener,
    bridge: Arc<MobileAccessBridge<P>>,
}

impl<P: SdkProvider> UnixSocketServer<P> {
    /// Bind a fresh socket at `socket_path` with the given file mode
    pub async fn bind(
        socket_path: &Path,
        socket_mode: u32,
        bridge: Arc<MobileAccessBridge<P>>,
    ) -> TransportResult<Self> {
        // Remove a stale socket left by a previous run
        if fs::try_exists(socket_path).await? {
            fs::remove_file(socket_path).await?;
        }

        let listener = UnixListener::bind(socket_path)?;
        fs::set_permissions(socket_path, Permissions::from_mode(socket_mode)).await?;
        info!(
            path = %socket_path.display(),
            mode = %format_args!("{socket_mode:o}"),
            "Unix socket server listening"
        );

        Ok(Self { listener, bridge })
    }

    /// Serve on an already bound listener, e.g. one passed by socket activation
    pub fn from_std(
        listener: std::os::unix::net::UnixListener,
        bridge: Arc<MobileAccessBridge<P>>,
    ) -> TransportResult<Self> {
        listener.set_nonblocking(true)?;
        let listener = UnixListener::from_std(listener)?;
        info!("Unix socket server listening on inherited socket");

        Ok(Self { listener, bridge })
    }

    /// Accept clients until the listener fails
    pub async fn run(self) -> TransportResult<()> {
        let handler = RequestHandler::new(self.bridge.clone());

        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = handler.clone();
                    let events = self.bridge.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(stream, handler, events).await {
                            error!("Error handling client: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                }
            }
        }
    }

    async fn handle_client(
        stream: UnixStream,
        handler: RequestHandler<P>,
        events: broadcast::Receiver<BridgeEvent>,
    ) -> TransportResult<()> {
        let (read_half, write_half) = stream.into_split();
        let session = UnixSocketSession::new(write_half);
        let mut reader = SessionReader::new(read_half);

        info!("New client connected: {}", session.id());
        let forwarder = Self::forward_events(session.clone(), events);

        let result = async {
            while let Some(line) = reader.read_line().await? {
                if line.trim().is_empty() {
                    continue;
                }

                let request = match JsonRpcRequest::parse(&line) {
                    Ok(request) => request,
                    Err(response) => {
                        warn!(session = %session.id(), "Invalid JSON-RPC request");
                        session.send_response(&response).await?;
                        continue;
                    }
                };

                // Registration requests wait on the SDK, so each request runs
                // on its own task and responses may arrive out of order.
                let handler = handler.clone();
                let session = session.clone();
                tokio::spawn(async move {
                    let response = handler.handle_request(request).await;
                    if let Err(e) = session.send_response(&response).await {
                        debug!(session = %session.id(), "Error sending response: {}", e);
                    }
                });
            }
            Ok::<_, TransportError>(())
        }
        .await;

        forwarder.abort();
        info!("Client disconnected: {}", session.id());
        result
    }

    fn forward_events(
        session: UnixSocketSession,
        mut events: broadcast::Receiver<BridgeEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let notification = JsonRpcNotification::from(event);
                        if session.send_notification(&notification).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            session = %session.id(),
                            skipped,
                            "Client lagging, dropped oldest events"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{registration::CONTINUATION_TTL, types::ConfigureParams},
        protocol::{JsonRpcResponse, Request, RequestId, Response},
        sdk::{
            simulated::{SimulatedSdk, SimulatedSdkProvider},
            types::Reader,
        },
    };
    use serde_json::Value;
    use tempfile::tempdir;
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::unix::OwnedWriteHalf,
    };

    fn bridge() -> (Arc<MobileAccessBridge<SimulatedSdkProvider>>, Arc<SimulatedSdk>) {
        let sdk = Arc::new(SimulatedSdk::new());
        let bridge = MobileAccessBridge::new(
            SimulatedSdkProvider::new(sdk.clone()),
            CONTINUATION_TTL,
            16,
        );
        (Arc::new(bridge), sdk)
    }

    async fn send(writer: &mut OwnedWriteHalf, line: &str) {
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        writer.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_sets_socket_mode() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        std::fs::write(&socket_path, b"stale").unwrap();

        let (bridge, _sdk) = bridge();
        let _server = UnixSocketServer::bind(&socket_path, 0o600, bridge)
            .await
            .unwrap();

        let mode = std::fs::metadata(&socket_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_client_requests_and_notifications() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let (bridge, sdk) = bridge();
        let server = UnixSocketServer::bind(&socket_path, 0o660, bridge)
            .await
            .unwrap();
        tokio::spawn(server.run());

        let client = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, mut write_half) = client.into_split();
        let mut lines = BufReader::new(read_half).lines();

        // Unparseable input gets a parse error with a null id
        send(&mut write_half, "{oops").await;
        let reply: Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["error"]["code"], -32700);
        assert_eq!(reply["id"], Value::Null);

        let request = JsonRpcRequest::new(
            Request::Configure(ConfigureParams::default()),
            RequestId::Number(1),
        );
        send(&mut write_half, &serde_json::to_string(&request).unwrap()).await;
        let reply: JsonRpcResponse =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply.result, Some(Response::ack()));
        assert_eq!(reply.id, RequestId::Number(1));

        sdk.emit_access_started(&Reader {
            id: "R1".to_string(),
            name: "Lobby".to_string(),
        });
        let notification: JsonRpcNotification =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["method"], "access");
        assert_eq!(value["params"]["event"], "started");
    }
}
