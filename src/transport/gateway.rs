//! TCP connection to the bus gateway.
//!
//! The gateway is a small proxy that forwards bus traffic to registered TCP
//! clients. Registration is a fixed handshake:
//!
//! 1. Client connects (keep-alive enabled)
//! 2. Client sends its two-character device type, `"RX"` for receivers
//! 3. Gateway answers with a 10-byte client identifier
//!
//! # Example
//!
//! ```ignore
//! use ht3_driver::transport::{Gateway, GatewayOptions};
//!
//! let gateway = Gateway::connect(&GatewayOptions::new("raspberrypi", 8088)).await?;
//! println!("registered as {}", gateway.client_id());
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::time::timeout;

use crate::error::{Ht3Error, Result};

/// Length of the client identifier sent by the gateway.
pub const CLIENT_ID_LEN: usize = 10;

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 8088;

/// Device type announced by receiving clients.
pub const DEFAULT_DEVICE_TYPE: &str = "RX";

/// Default timeout for connect and each handshake step.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings needed to reach and register with a gateway.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Device type token sent during registration.
    pub device_type: String,
    /// Timeout for connect and each handshake step.
    pub connect_timeout: Duration,
}

impl GatewayOptions {
    /// Options with default device type and timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// A registered gateway connection.
#[derive(Debug)]
pub struct Gateway {
    stream: TcpStream,
    peer: SocketAddr,
    client_id: String,
}

impl Gateway {
    /// Connect to the gateway and perform the registration handshake.
    pub async fn connect(options: &GatewayOptions) -> Result<Self> {
        let stream = open(options).await?;
        Self::register(stream, options).await
    }

    /// Perform the registration handshake on an already connected stream.
    pub async fn register(mut stream: TcpStream, options: &GatewayOptions) -> Result<Self> {
        let peer = stream.peer_addr()?;

        timeout(
            options.connect_timeout,
            stream.write_all(options.device_type.as_bytes()),
        )
        .await
        .map_err(|_| Ht3Error::Timeout("sending device type"))??;

        let mut id = [0u8; CLIENT_ID_LEN];
        timeout(options.connect_timeout, stream.read_exact(&mut id))
            .await
            .map_err(|_| Ht3Error::Timeout("reading client id"))??;

        let client_id = String::from_utf8(id.to_vec())
            .map_err(|e| Ht3Error::Handshake(format!("client id is not UTF-8: {}", e)))?;

        Ok(Self {
            stream,
            peer,
            client_id,
        })
    }

    /// Client identifier assigned by the gateway.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Address of the gateway.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Read one chunk, bounded by `read_timeout`.
    ///
    /// Returns `ConnectionClosed` on EOF.
    pub async fn read_chunk(&mut self, buf: &mut [u8], read_timeout: Duration) -> Result<usize> {
        let n = timeout(read_timeout, self.stream.read(buf))
            .await
            .map_err(|_| Ht3Error::Timeout("reading from gateway"))??;

        if n == 0 {
            return Err(Ht3Error::ConnectionClosed);
        }
        Ok(n)
    }

    /// Write all bytes and flush, bounded by `write_timeout`.
    pub async fn write_block(&mut self, bytes: &[u8], write_timeout: Duration) -> Result<()> {
        timeout(write_timeout, async {
            self.stream.write_all(bytes).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| Ht3Error::Timeout("writing to gateway"))??;
        Ok(())
    }
}

/// Resolve the host and open a keep-alive TCP connection to the first
/// address that accepts.
async fn open(options: &GatewayOptions) -> Result<TcpStream> {
    let addrs = timeout(
        options.connect_timeout,
        lookup_host((options.host.as_str(), options.port)),
    )
    .await
    .map_err(|_| Ht3Error::Timeout("resolving gateway address"))??;

    let mut last_err = None;
    for addr in addrs {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_keepalive(true)?;

        match timeout(options.connect_timeout, socket.connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => last_err = Some(Ht3Error::Io(e)),
            Err(_) => last_err = Some(Ht3Error::Timeout("connecting to gateway")),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        Ht3Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no address found for {}", options.host),
        ))
    }))
}
