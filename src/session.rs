//! Connection task: owns the gateway socket and the frame buffer.
//!
//! ```text
//! Driver / CommandWriter ─► mpsc::Sender<Request> ─┐
//!                                                  ▼
//!                         Gateway ──read──► Session task ──► StateStore ──► callbacks
//!                                                  │
//!                                                  └──► broadcast<DriverEvent>, watch<ConnectionStatus>
//! ```
//!
//! Reads and command writes are serialized by the task's `select!` loop, so
//! the socket never needs a lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::config::DriverConfig;
use crate::decoder::{self, Reading};
use crate::error::{Ht3Error, Result};
use crate::protocol::{CommandBlock, FrameBuffer, Inbound};
use crate::store::{StateStore, Value};
use crate::transport::Gateway;

/// Connection state published by the task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// A registered gateway connection is open.
    pub connected: bool,
    /// Identifier from the last successful registration.
    pub client_id: Option<String>,
}

/// Notification sent to event subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// Registration with the gateway succeeded.
    Connected {
        /// Identifier assigned by the gateway.
        client_id: String,
    },
    /// The gateway connection was lost or closed.
    Disconnected,
    /// A variable got a new value.
    Changed {
        /// Variable name (see [`decoder::names`]).
        name: &'static str,
        /// New value.
        value: Value,
    },
}

/// Message into the connection task.
#[derive(Debug)]
pub(crate) enum Request {
    /// Connect now (no-op if connected).
    Connect { reply: oneshot::Sender<bool> },
    /// Write one command block.
    Write {
        block: CommandBlock,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Close the connection and stop reconnecting.
    Stop { reply: oneshot::Sender<()> },
    /// Allow reconnecting again after a stop.
    Restart,
}

enum Step {
    Request(Option<Request>),
    Read(Result<usize>),
    Reconnect,
}

/// State owned by the connection task.
pub(crate) struct Session {
    config: Arc<DriverConfig>,
    requests: mpsc::Receiver<Request>,
    status: watch::Sender<ConnectionStatus>,
    events: broadcast::Sender<DriverEvent>,
    store: StateStore,
    buffer: FrameBuffer,
    gateway: Option<Gateway>,
    stopped: bool,
    retry_now: bool,
}

impl Session {
    pub(crate) fn new(
        config: Arc<DriverConfig>,
        requests: mpsc::Receiver<Request>,
        status: watch::Sender<ConnectionStatus>,
        events: broadcast::Sender<DriverEvent>,
        store: StateStore,
    ) -> Self {
        let buffer = FrameBuffer::with_max_buffered(config.max_buffered);
        Self {
            config,
            requests,
            status,
            events,
            store,
            buffer,
            gateway: None,
            stopped: false,
            retry_now: true,
        }
    }

    /// Main loop. Runs until every request sender is dropped.
    pub(crate) async fn run(mut self) {
        tracing::info!(
            "Connection task started for {}:{}",
            self.config.host,
            self.config.port
        );

        let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];

        loop {
            let step = match self.gateway.as_mut() {
                Some(gateway) => tokio::select! {
                    request = self.requests.recv() => Step::Request(request),
                    read = gateway.read_chunk(&mut chunk, self.config.read_timeout) => Step::Read(read),
                },
                None if self.stopped => Step::Request(self.requests.recv().await),
                None => {
                    let delay = if self.retry_now {
                        Duration::ZERO
                    } else {
                        self.config.reconnect_interval
                    };
                    tokio::select! {
                        request = self.requests.recv() => Step::Request(request),
                        _ = tokio::time::sleep(delay) => Step::Reconnect,
                    }
                }
            };

            match step {
                Step::Request(None) => break,
                Step::Request(Some(request)) => self.handle(request).await,
                Step::Read(Ok(n)) => self.on_data(&chunk[..n]),
                Step::Read(Err(e)) => self.disconnect(&format!("error on read: {}", e)),
                Step::Reconnect => {
                    self.connect().await;
                }
            }
        }

        self.shutdown();
        tracing::info!("Connection task stopped");
    }

    /// Close the connection as a deliberate stop.
    fn shutdown(&mut self) {
        self.stopped = true;
        self.disconnect("driver shut down");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Connect { reply } => {
                let connected = if self.gateway.is_some() {
                    true
                } else {
                    self.stopped = false;
                    self.connect().await
                };
                let _ = reply.send(connected);
            }
            Request::Write { block, reply } => {
                let _ = reply.send(self.write(block).await);
            }
            Request::Stop { reply } => {
                self.stopped = true;
                self.disconnect("stopped");
                let _ = reply.send(());
            }
            Request::Restart => {
                if self.stopped {
                    self.stopped = false;
                    self.retry_now = true;
                }
            }
        }
    }

    /// Connect and register. Returns `true` on success.
    async fn connect(&mut self) -> bool {
        self.retry_now = false;

        match Gateway::connect(&self.config.gateway_options()).await {
            Ok(gateway) => {
                let client_id = gateway.client_id().to_string();
                tracing::info!(
                    "Client-ID:{}; registered at {} with device type '{}'",
                    client_id,
                    gateway.peer(),
                    self.config.device_type
                );

                self.buffer.clear();
                self.gateway = Some(gateway);
                self.status.send_replace(ConnectionStatus {
                    connected: true,
                    client_id: Some(client_id.clone()),
                });
                let _ = self.events.send(DriverEvent::Connected { client_id });
                true
            }
            Err(e) => {
                tracing::error!(
                    "Can't connect to gateway {}:{}: {}",
                    self.config.host,
                    self.config.port,
                    e
                );
                false
            }
        }
    }

    /// Drop the connection (if any) and publish the state change.
    fn disconnect(&mut self, reason: &str) {
        let Some(gateway) = self.gateway.take() else {
            return;
        };

        if self.stopped {
            tracing::info!("Client-ID:{}; socket closed ({})", gateway.client_id(), reason);
        } else {
            tracing::error!("Client-ID:{}; connection lost: {}", gateway.client_id(), reason);
        }

        drop(gateway);
        self.buffer.clear();
        self.status.send_modify(|status| status.connected = false);
        let _ = self.events.send(DriverEvent::Disconnected);
    }

    async fn write(&mut self, block: CommandBlock) -> Result<()> {
        let Some(gateway) = self.gateway.as_mut() else {
            tracing::error!("Cannot write command block: not connected");
            return Err(Ht3Error::NotConnected);
        };

        let bytes = block.encode();
        match gateway.write_block(&bytes, self.config.write_timeout).await {
            Ok(()) => {
                tracing::debug!("Sent command block {}", hex::encode(bytes));
                Ok(())
            }
            Err(e) => {
                self.disconnect(&format!("error on write: {}", e));
                Err(e)
            }
        }
    }

    fn on_data(&mut self, data: &[u8]) {
        tracing::trace!("Received {} bytes: {}", data.len(), hex::encode(data));

        let Some(inbound) = self.buffer.push(data) else {
            return;
        };

        match inbound {
            Inbound::Frame(frame) if !frame.kind.is_decoded() => {
                tracing::debug!("Ignoring {} frame {}", frame.kind, frame.to_hex());
            }
            Inbound::Frame(frame) => match decoder::decode(&frame) {
                Some(readings) => self.apply(readings),
                None => tracing::debug!(
                    "Discarding {} frame with bad checksum: {}",
                    frame.kind,
                    frame.to_hex()
                ),
            },
            Inbound::Diagnostic(text) => {
                tracing::info!("Gateway diagnostic: {}", text.trim_end());
            }
            Inbound::Overflow(dropped) => {
                tracing::warn!("Discarded {} bytes without a known frame signature", dropped);
            }
        }
    }

    fn apply(&self, readings: Vec<Reading>) {
        for Reading { name, value } in readings {
            if self.store.update(name, value.clone()) {
                let _ = self.events.send(DriverEvent::Changed { name, value });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct Harness {
        session: Session,
        _requests: mpsc::Sender<Request>,
        status: watch::Receiver<ConnectionStatus>,
        events: broadcast::Receiver<DriverEvent>,
    }

    async fn connected_session() -> (Harness, tokio::net::TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut token = [0u8; 2];
            socket.read_exact(&mut token).await.unwrap();
            socket.write_all(b"0123456789").await.unwrap();
            socket
        });

        let (tx, rx) = mpsc::channel(4);
        let (status_tx, status) = watch::channel(ConnectionStatus::default());
        let (events_tx, events) = broadcast::channel(16);
        let config = Arc::new(DriverConfig::new("127.0.0.1", port));
        let mut session = Session::new(config, rx, status_tx, events_tx, StateStore::new());

        assert!(session.connect().await);
        let socket = server.await.unwrap();
        let harness = Harness {
            session,
            _requests: tx,
            status,
            events,
        };
        (harness, socket)
    }

    #[tokio::test]
    async fn test_shutdown_is_a_deliberate_stop() {
        let (mut h, mut socket) = connected_session().await;
        assert_eq!(
            h.events.recv().await.unwrap(),
            DriverEvent::Connected {
                client_id: "0123456789".to_string()
            }
        );
        assert!(!h.session.stopped);

        h.session.shutdown();

        assert!(h.session.stopped);
        assert!(h.session.gateway.is_none());
        assert!(!h.status.borrow().connected);
        assert_eq!(h.events.recv().await.unwrap(), DriverEvent::Disconnected);

        let mut buf = [0u8; 4];
        assert_eq!(socket.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_is_not_a_stop() {
        let (mut h, socket) = connected_session().await;
        drop(socket);

        h.session.disconnect("error on read: Connection closed");

        assert!(!h.session.stopped);
        assert!(!h.status.borrow().connected);
        assert_eq!(h.status.borrow().client_id.as_deref(), Some("0123456789"));
    }
}
