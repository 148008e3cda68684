//! TCP transport for the Chord key-value ring.
//!
//! This crate carries the peer operation set between processes:
//! - Request/response protocol, one variant per peer operation
//! - Length-prefixed bincode frames
//! - A node server answering requests for a local ring node
//! - A remote node handle and a connector for the ring engine

pub mod client;
pub mod codec;
pub mod config;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::RemoteNode;
pub use config::TransportConfig;
pub use connector::TcpConnector;
pub use error::TransportError;
pub use protocol::{Request, Response, WireError};
pub use server::NodeServer;
