//! Transport module - TCP connection and registration with the gateway.

mod gateway;

pub use gateway::{
    Gateway, GatewayOptions, CLIENT_ID_LEN, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DEVICE_TYPE,
    DEFAULT_PORT,
};
