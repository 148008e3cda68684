//! Resolves node references into TCP handles.

use std::sync::Arc;

use corelib::{Connector, NodeRef, Peer};

use crate::client::RemoteNode;
use crate::config::TransportConfig;
use crate::protocol::{Request, Response};

/// Treats every node URL as a `host:port` address.
///
/// Connecting is lazy: an unreachable node surfaces on the first call made
/// through its handle.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    config: TransportConfig,
}

impl TcpConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Asks whoever listens on `addr` for its identity.
    pub async fn dial_addr(&self, addr: &str) -> corelib::Result<NodeRef> {
        match RemoteNode::call_addr(addr, &self.config, &Request::Describe).await {
            Ok(Response::Error(error)) => Err(error.into()),
            Ok(response) => response.into_node().map_err(|e| e.into_ring_error(addr)),
            Err(e) => Err(e.into_ring_error(addr)),
        }
    }
}

impl Connector for TcpConnector {
    fn connect(&self, node: &NodeRef) -> corelib::Result<Arc<dyn Peer>> {
        Ok(Arc::new(RemoteNode::new(node.clone(), self.config.clone())))
    }
}
