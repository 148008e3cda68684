//! Serves the peer operation set of one local node over TCP.

use std::net::SocketAddr;
use std::sync::Arc;

use corelib::{NodeRef, Peer};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec::{read_frame, write_frame};
use crate::config::TransportConfig;
use crate::error::Result;
use crate::protocol::{Request, Response, WireError};

/// A bound listener waiting for a node to serve.
///
/// Binding comes first so that a node listening on port 0 can learn its
/// address, and with it its URL, before the node is created.
pub struct NodeServer {
    listener: TcpListener,
    config: TransportConfig,
}

impl NodeServer {
    pub async fn bind(addr: &str, config: TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, one task per connection.
    pub async fn serve(self, peer: Arc<dyn Peer>) -> Result<()> {
        info!(addr = %self.local_addr()?, "node server listening");
        loop {
            let (stream, remote) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            if self.config.nodelay {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(%remote, error = %e, "could not set TCP_NODELAY");
                }
            }
            let peer = peer.clone();
            let max_frame_bytes = self.config.max_frame_bytes;
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer.as_ref(), max_frame_bytes).await {
                    debug!(%remote, error = %e, "connection ended with error");
                }
            });
        }
    }

    /// Runs [`serve`](Self::serve) on the current runtime.
    pub fn spawn(self, peer: Arc<dyn Peer>) -> JoinHandle<Result<()>> {
        tokio::spawn(self.serve(peer))
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: &dyn Peer,
    max_frame_bytes: usize,
) -> Result<()> {
    let request: Request = read_frame(&mut stream, max_frame_bytes).await?;
    let op = request.name();
    let response = dispatch(peer, request).await;
    if let Response::Error(error) = &response {
        debug!(op, error = ?error, "request failed");
    }
    write_frame(&mut stream, &response, max_frame_bytes).await
}

/// Runs one request against `peer`. Failures become [`Response::Error`].
pub async fn dispatch(peer: &dyn Peer, request: Request) -> Response {
    let outcome = match request {
        Request::FindPredecessor(key) => peer.find_predecessor(key).await.map(Response::Node),
        Request::ClosestPrecedingFinger(key) => {
            peer.closest_preceding_finger(key).await.map(Response::Node)
        }
        Request::Successor => peer.successor().await.map(Response::Node),
        Request::Predecessor => peer.predecessor().await.map(Response::MaybeNode),
        Request::SetSuccessor(node) => peer.set_successor(node).await.map(|_| Response::Done),
        Request::SetPredecessor(node) => peer.set_predecessor(node).await.map(|_| Response::Done),
        Request::FindSuccessor(key) => peer.find_successor(key).await.map(Response::Node),
        Request::AcquireJoinLock(requester) => {
            peer.acquire_join_lock(&requester).await.map(Response::Flag)
        }
        Request::ReleaseJoinLock(requester) => {
            peer.release_join_lock(&requester).await.map(Response::Flag)
        }
        Request::StoreLocal { word, definition } => peer
            .store_local(word, definition)
            .await
            .map(|_| Response::Done),
        Request::Insert { word, definition } => {
            peer.insert(word, definition).await.map(Response::Node)
        }
        Request::Lookup(word) => peer.lookup(word).await.map(Response::Text),
        Request::Remove(word) => peer.remove(word).await.map(Response::Flag),
        Request::RemoveIfUnchanged { word, definition } => peer
            .remove_if_unchanged(word, definition)
            .await
            .map(Response::Flag),
        Request::Dictionary => peer.dictionary().await.map(Response::Dictionary),
        Request::DictionarySize => peer
            .dictionary_size()
            .await
            .map(|size| Response::Count(size as u64)),
        Request::PrintFingerTable => peer.print_finger_table().await.map(Response::Text),
        Request::PrintDictionary => peer.print_dictionary().await.map(Response::Text),
        Request::Id => peer.id().await.map(Response::Id),
        Request::Url => peer.url().await.map(Response::Text),
        Request::Join(bootstrap) => peer.join(bootstrap).await.map(Response::Joined),
        Request::UpdateOthers => peer.update_others().await.map(|_| Response::Done),
        Request::UpdateFingerTable { node, slot } => peer
            .update_finger_table(node, slot as usize)
            .await
            .map(|_| Response::Done),
        Request::Describe => describe(peer).await.map(Response::Node),
    };
    outcome.unwrap_or_else(|e| Response::Error(WireError::from(&e)))
}

async fn describe(peer: &dyn Peer) -> corelib::Result<NodeRef> {
    Ok(NodeRef::new(peer.id().await?, peer.url().await?))
}
