//! Driver builder and public handle.
//!
//! The [`DriverBuilder`] collects the connection settings. [`DriverBuilder::start`]
//! spawns the connection task, which:
//! 1. Connects and registers with the gateway (first attempt immediately)
//! 2. Reads chunks and extracts frames
//! 3. Decodes frames into the [`StateStore`] and emits [`DriverEvent`]s
//! 4. Reconnects after a pause when the connection is lost
//!
//! # Example
//!
//! ```no_run
//! use ht3_driver::{Driver, DriverEvent, HcMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = Driver::builder("raspberrypi-cv").port(8088).start();
//!     let mut events = driver.events();
//!
//!     driver.connect().await;
//!     driver.write_mode(HcMode::Comfort).await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let DriverEvent::Changed { name, value } = event {
//!             println!("{name} = {value}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::DriverConfig;
use crate::error::Result;
use crate::protocol::HcMode;
use crate::session::{ConnectionStatus, DriverEvent, Request, Session};
use crate::store::{StateStore, Subscription, Value};
use crate::writer::CommandWriter;

/// Builder for configuring and starting a [`Driver`].
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    config: DriverConfig,
}

impl DriverBuilder {
    /// Create a builder for the gateway at `host` with default settings.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: DriverConfig {
                host: host.into(),
                ..DriverConfig::default()
            },
        }
    }

    /// Create a builder from a complete configuration.
    pub fn from_config(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Set the gateway port.
    ///
    /// Default: 8088
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the device type sent during registration.
    ///
    /// Default: "RX"
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.config.device_type = device_type.into();
        self
    }

    /// Set the timeout for connecting and registering.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read timeout. A silent gateway is treated as disconnected
    /// after this long.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the timeout for writing one command block.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Set the pause between reconnect attempts.
    ///
    /// Default: 10 seconds
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    /// Set the pause between the two blocks of a write sequence.
    ///
    /// Default: 1 second
    pub fn write_delay(mut self, delay: Duration) -> Self {
        self.config.write_delay = delay;
        self
    }

    /// Set the maximum size of one socket read.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set how many bytes without a frame signature are kept before the
    /// buffer is reset.
    pub fn max_buffered(mut self, limit: usize) -> Self {
        self.config.max_buffered = limit;
        self
    }

    /// Set the capacity of the event channel. Slow subscribers miss events
    /// beyond this.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Spawn the connection task and return the driver handle.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(self) -> Driver {
        let config = Arc::new(self.config);

        let (tx, rx) = mpsc::channel(config.request_capacity.max(1));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let store = StateStore::new();

        let session = Session::new(config.clone(), rx, status_tx, events.clone(), store.clone());
        let task = tokio::spawn(session.run());

        Driver {
            writer: CommandWriter::new(tx.clone(), config.write_delay),
            tx,
            status: status_rx,
            events,
            store,
            config,
            task,
        }
    }
}

/// Handle to a running driver.
///
/// Dropping the handle stops the connection task.
pub struct Driver {
    tx: mpsc::Sender<Request>,
    writer: CommandWriter,
    status: watch::Receiver<ConnectionStatus>,
    events: broadcast::Sender<DriverEvent>,
    store: StateStore,
    config: Arc<DriverConfig>,
    task: JoinHandle<()>,
}

impl Driver {
    /// Create a builder for the gateway at `host`.
    pub fn builder(host: impl Into<String>) -> DriverBuilder {
        DriverBuilder::new(host)
    }

    /// Driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Check if a registered gateway connection is open.
    pub fn connected(&self) -> bool {
        self.status.borrow().connected
    }

    /// Identifier from the last successful registration. Kept after a
    /// disconnect.
    pub fn client_id(&self) -> Option<String> {
        self.status.borrow().client_id.clone()
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Watch connection status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Subscribe to driver events.
    pub fn events(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    /// The variable store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Current value of a variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.store.get(name)
    }

    /// Install (or replace) the primary change callback.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.store.set_callback(callback);
    }

    /// Add a change observer.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// Connect now. Returns `true` if connected afterwards.
    ///
    /// Does nothing when already connected. Also resumes automatic
    /// reconnects after [`stop`](Self::stop).
    pub async fn connect(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Request::Connect { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Close the connection and stop reconnecting.
    pub async fn stop(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Request::Stop { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Resume reconnecting after [`stop`](Self::stop). The next attempt is
    /// made immediately.
    pub async fn restart(&self) {
        let _ = self.tx.send(Request::Restart).await;
    }

    /// Drop the current connection and let the task connect again right
    /// away.
    pub async fn reconnect(&self) {
        self.stop().await;
        self.restart().await;
    }

    /// Write the requested room temperature (0.0 to 127.5 °C, 0.5 °C steps).
    pub async fn write_setpoint(&self, degrees: f64) -> Result<()> {
        self.writer.write_setpoint(degrees).await
    }

    /// Write the heating circuit operating mode.
    pub async fn write_mode(&self, mode: HcMode) -> Result<()> {
        self.writer.write_mode(mode).await
    }

    /// Check if a write sequence is in flight.
    pub fn write_in_progress(&self) -> bool {
        self.writer.is_busy()
    }

    /// Stop the connection task and wait for it to finish.
    pub async fn shutdown(self) {
        let Self {
            tx, writer, task, ..
        } = self;
        drop(tx);
        drop(writer);
        if let Err(e) = task.await {
            tracing::error!("Connection task failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = Driver::builder("gateway");
        let config = builder.config();
        assert_eq!(config.host, "gateway");
        assert_eq!(config.port, 8088);
        assert_eq!(config.device_type, "RX");
        assert_eq!(config.reconnect_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_setters() {
        let builder = Driver::builder("gateway")
            .port(9000)
            .device_type("TX")
            .read_timeout(Duration::from_secs(30))
            .reconnect_interval(Duration::from_millis(100))
            .write_delay(Duration::from_millis(20))
            .max_buffered(512);

        let config = builder.config();
        assert_eq!(config.port, 9000);
        assert_eq!(config.device_type, "TX");
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.reconnect_interval, Duration::from_millis(100));
        assert_eq!(config.write_delay, Duration::from_millis(20));
        assert_eq!(config.max_buffered, 512);
    }

    #[tokio::test]
    async fn test_write_without_connection_fails() {
        // Nothing listens on port 1; the task keeps failing to connect.
        let driver = Driver::builder("127.0.0.1")
            .port(1)
            .connect_timeout(Duration::from_millis(200))
            .write_delay(Duration::ZERO)
            .start();
        driver.stop().await;

        assert!(!driver.connected());
        let result = driver.write_setpoint(21.0).await;
        assert!(matches!(result, Err(crate::Ht3Error::NotConnected)));
        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_ends_task() {
        let driver = Driver::builder("127.0.0.1")
            .port(1)
            .connect_timeout(Duration::from_millis(200))
            .start();
        let mut status = driver.watch_status();
        driver.shutdown().await;

        // The task dropped its status sender.
        assert!(status.changed().await.is_err());
    }
}
