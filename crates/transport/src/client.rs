//! Handle on a ring node in another process.

use async_trait::async_trait;
use corelib::{Dictionary, Identifier, JoinOutcome, NodeRef, Peer, RingError};
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::{read_frame, write_frame};
use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::protocol::{Request, Response};

/// Implements [`Peer`] by sending each call to `node.url` over a fresh TCP
/// connection.
#[derive(Debug, Clone)]
pub struct RemoteNode {
    node: NodeRef,
    config: TransportConfig,
}

impl RemoteNode {
    pub fn new(node: NodeRef, config: TransportConfig) -> Self {
        Self { node, config }
    }

    pub fn node_ref(&self) -> &NodeRef {
        &self.node
    }

    /// Sends one request to `addr` and waits for its response.
    pub async fn call_addr(
        addr: &str,
        config: &TransportConfig,
        request: &Request,
    ) -> Result<Response> {
        let stream = tokio::time::timeout(config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout {
                addr: addr.to_string(),
                op: "connect",
                timeout_ms: config.connect_timeout_ms,
            })?
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        if config.nodelay {
            stream.set_nodelay(true)?;
        }

        let exchange = async move {
            let mut stream = stream;
            write_frame(&mut stream, request, config.max_frame_bytes).await?;
            read_frame::<_, Response>(&mut stream, config.max_frame_bytes).await
        };
        tokio::time::timeout(config.request_timeout(), exchange)
            .await
            .map_err(|_| TransportError::Timeout {
                addr: addr.to_string(),
                op: "request",
                timeout_ms: config.request_timeout_ms,
            })?
    }

    async fn request(&self, request: Request) -> corelib::Result<Response> {
        let op = request.name();
        debug!(peer = %self.node, op, "remote call");
        match Self::call_addr(&self.node.url, &self.config, &request).await {
            Ok(Response::Error(error)) => Err(RingError::from(error)),
            Ok(response) => Ok(response),
            Err(e) => Err(e.into_ring_error(&self.node.url)),
        }
    }

    fn convert<T>(&self, result: Result<T>) -> corelib::Result<T> {
        result.map_err(|e| e.into_ring_error(&self.node.url))
    }
}

#[async_trait]
impl Peer for RemoteNode {
    async fn find_predecessor(&self, key: Identifier) -> corelib::Result<NodeRef> {
        let response = self.request(Request::FindPredecessor(key)).await?;
        self.convert(response.into_node())
    }

    async fn closest_preceding_finger(&self, key: Identifier) -> corelib::Result<NodeRef> {
        let response = self.request(Request::ClosestPrecedingFinger(key)).await?;
        self.convert(response.into_node())
    }

    async fn successor(&self) -> corelib::Result<NodeRef> {
        let response = self.request(Request::Successor).await?;
        self.convert(response.into_node())
    }

    async fn predecessor(&self) -> corelib::Result<Option<NodeRef>> {
        let response = self.request(Request::Predecessor).await?;
        self.convert(response.into_maybe_node())
    }

    async fn set_successor(&self, node: NodeRef) -> corelib::Result<()> {
        let response = self.request(Request::SetSuccessor(node)).await?;
        self.convert(response.into_done())
    }

    async fn set_predecessor(&self, node: NodeRef) -> corelib::Result<()> {
        let response = self.request(Request::SetPredecessor(node)).await?;
        self.convert(response.into_done())
    }

    async fn find_successor(&self, key: Identifier) -> corelib::Result<NodeRef> {
        let response = self.request(Request::FindSuccessor(key)).await?;
        self.convert(response.into_node())
    }

    async fn acquire_join_lock(&self, requester: &str) -> corelib::Result<bool> {
        let response = self
            .request(Request::AcquireJoinLock(requester.to_string()))
            .await?;
        self.convert(response.into_flag())
    }

    async fn release_join_lock(&self, requester: &str) -> corelib::Result<bool> {
        let response = self
            .request(Request::ReleaseJoinLock(requester.to_string()))
            .await?;
        self.convert(response.into_flag())
    }

    async fn store_local(&self, word: String, definition: Option<String>) -> corelib::Result<()> {
        let response = self.request(Request::StoreLocal { word, definition }).await?;
        self.convert(response.into_done())
    }

    async fn insert(&self, word: String, definition: Option<String>) -> corelib::Result<NodeRef> {
        let response = self.request(Request::Insert { word, definition }).await?;
        self.convert(response.into_node())
    }

    async fn lookup(&self, word: String) -> corelib::Result<String> {
        let response = self.request(Request::Lookup(word)).await?;
        self.convert(response.into_text())
    }

    async fn remove(&self, word: String) -> corelib::Result<bool> {
        let response = self.request(Request::Remove(word)).await?;
        self.convert(response.into_flag())
    }

    async fn remove_if_unchanged(
        &self,
        word: String,
        definition: Option<String>,
    ) -> corelib::Result<bool> {
        let response = self
            .request(Request::RemoveIfUnchanged { word, definition })
            .await?;
        self.convert(response.into_flag())
    }

    async fn dictionary(&self) -> corelib::Result<Dictionary> {
        let response = self.request(Request::Dictionary).await?;
        self.convert(response.into_dictionary())
    }

    async fn dictionary_size(&self) -> corelib::Result<usize> {
        let response = self.request(Request::DictionarySize).await?;
        self.convert(response.into_count()).map(|count| count as usize)
    }

    async fn print_finger_table(&self) -> corelib::Result<String> {
        let response = self.request(Request::PrintFingerTable).await?;
        self.convert(response.into_text())
    }

    async fn print_dictionary(&self) -> corelib::Result<String> {
        let response = self.request(Request::PrintDictionary).await?;
        self.convert(response.into_text())
    }

    async fn id(&self) -> corelib::Result<Identifier> {
        let response = self.request(Request::Id).await?;
        self.convert(response.into_id())
    }

    async fn url(&self) -> corelib::Result<String> {
        let response = self.request(Request::Url).await?;
        self.convert(response.into_text())
    }

    async fn join(&self, bootstrap: Option<NodeRef>) -> corelib::Result<JoinOutcome> {
        let response = self.request(Request::Join(bootstrap)).await?;
        self.convert(response.into_joined())
    }

    async fn update_others(&self) -> corelib::Result<()> {
        let response = self.request(Request::UpdateOthers).await?;
        self.convert(response.into_done())
    }

    async fn update_finger_table(&self, node: NodeRef, slot: usize) -> corelib::Result<()> {
        let response = self
            .request(Request::UpdateFingerTable {
                node,
                slot: slot as u32,
            })
            .await?;
        self.convert(response.into_done())
    }
}
