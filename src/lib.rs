//! A small blocking SNMP v1/v2c client: explicit session configuration, a
//! connect/close lifecycle, single GET requests and the BER codec behind
//! them.

pub mod asn1;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod snmp;

pub use client::SnmpClient;
pub use config::{SessionConfig, Transport};
pub use error::SnmpError;
