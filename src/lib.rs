//! # ht3-driver
//!
//! Async driver for Heatronic-class heating controller buses reached through
//! a TCP gateway.
//!
//! The driver registers with the gateway, extracts frames from the byte
//! stream, validates them with a CRC-8 and decodes boiler, heating circuit,
//! hot water and clock values into a [`StateStore`]. Changes reach
//! observers through store callbacks and a [`DriverEvent`] broadcast. The
//! requested room temperature and the heating circuit mode can be written
//! back.
//!
//! ## Architecture
//!
//! - **Transport** ([`transport`]): TCP connect with keep-alive and the
//!   device-type/client-id handshake
//! - **Protocol** ([`protocol`]): frame signatures, CRC and command blocks
//! - **Decoder** ([`decoder`]): fixed-offset field extraction per frame kind
//! - **Driver**: one connection task owning the socket; public operations
//!   are requests over a channel
//!
//! ## Example
//!
//! ```no_run
//! use ht3_driver::Driver;
//!
//! #[tokio::main]
//! async fn main() {
//!     let driver = Driver::builder("raspberrypi-cv").start();
//!
//!     let _sub = driver.subscribe(|name, value| {
//!         println!("{name} = {value}");
//!     });
//!
//!     if driver.connect().await {
//!         driver.write_setpoint(21.5).await.ok();
//!     }
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod protocol;
pub mod store;
pub mod transport;

mod driver;
mod session;
mod writer;

pub use config::DriverConfig;
pub use driver::{Driver, DriverBuilder};
pub use error::{Ht3Error, Result};
pub use protocol::HcMode;
pub use session::{ConnectionStatus, DriverEvent};
pub use store::{StateStore, Subscription, Value};
