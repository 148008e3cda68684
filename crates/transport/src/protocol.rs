//! Request and response messages.
//!
//! Each [`Request`] variant mirrors one peer operation. A connection carries
//! exactly one request and its response.

use corelib::{Dictionary, Identifier, JoinOutcome, NodeRef, RingError};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    FindPredecessor(Identifier),
    ClosestPrecedingFinger(Identifier),
    Successor,
    Predecessor,
    SetSuccessor(NodeRef),
    SetPredecessor(NodeRef),
    FindSuccessor(Identifier),
    AcquireJoinLock(String),
    ReleaseJoinLock(String),
    StoreLocal {
        word: String,
        definition: Option<String>,
    },
    Insert {
        word: String,
        definition: Option<String>,
    },
    Lookup(String),
    Remove(String),
    RemoveIfUnchanged {
        word: String,
        definition: Option<String>,
    },
    Dictionary,
    DictionarySize,
    PrintFingerTable,
    PrintDictionary,
    Id,
    Url,
    Join(Option<NodeRef>),
    UpdateOthers,
    UpdateFingerTable {
        node: NodeRef,
        slot: u32,
    },
    /// Identity of the serving node; lets a caller dial by address alone.
    Describe,
}

impl Request {
    /// Operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::FindPredecessor(_) => "find_predecessor",
            Request::ClosestPrecedingFinger(_) => "closest_preceding_finger",
            Request::Successor => "successor",
            Request::Predecessor => "predecessor",
            Request::SetSuccessor(_) => "set_successor",
            Request::SetPredecessor(_) => "set_predecessor",
            Request::FindSuccessor(_) => "find_successor",
            Request::AcquireJoinLock(_) => "acquire_join_lock",
            Request::ReleaseJoinLock(_) => "release_join_lock",
            Request::StoreLocal { .. } => "store_local",
            Request::Insert { .. } => "insert",
            Request::Lookup(_) => "lookup",
            Request::Remove(_) => "remove",
            Request::RemoveIfUnchanged { .. } => "remove_if_unchanged",
            Request::Dictionary => "dictionary",
            Request::DictionarySize => "dictionary_size",
            Request::PrintFingerTable => "print_finger_table",
            Request::PrintDictionary => "print_dictionary",
            Request::Id => "id",
            Request::Url => "url",
            Request::Join(_) => "join",
            Request::UpdateOthers => "update_others",
            Request::UpdateFingerTable { .. } => "update_finger_table",
            Request::Describe => "describe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Done,
    Node(NodeRef),
    MaybeNode(Option<NodeRef>),
    Flag(bool),
    Text(String),
    Count(u64),
    Id(Identifier),
    Dictionary(Dictionary),
    Joined(JoinOutcome),
    /// The operation failed on the serving node.
    Error(WireError),
}

/// A [`RingError`] in transferable form.
///
/// The kind survives the hop, so a peer that could not be reached further
/// down a forwarded call is still reported as unavailable to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireError {
    Unavailable { node: String, reason: String },
    Remote(String),
    Codec(String),
    InvalidState(String),
    Config(String),
    Io(String),
}

impl From<&RingError> for WireError {
    fn from(e: &RingError) -> Self {
        match e {
            RingError::Unavailable { node, reason } => WireError::Unavailable {
                node: node.clone(),
                reason: reason.clone(),
            },
            RingError::Remote(msg) => WireError::Remote(msg.clone()),
            RingError::Codec(msg) => WireError::Codec(msg.clone()),
            RingError::InvalidState(msg) => WireError::InvalidState(msg.clone()),
            RingError::Config(msg) => WireError::Config(msg.clone()),
            RingError::Io(io) => WireError::Io(io.to_string()),
        }
    }
}

impl From<WireError> for RingError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Unavailable { node, reason } => RingError::Unavailable { node, reason },
            WireError::Codec(msg) => RingError::Codec(msg),
            WireError::InvalidState(msg) => RingError::InvalidState(msg),
            WireError::Config(msg) => RingError::Config(msg),
            // An I/O failure on the serving side is not a local I/O error.
            WireError::Remote(msg) | WireError::Io(msg) => RingError::Remote(msg),
        }
    }
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Done => "Done",
            Response::Node(_) => "Node",
            Response::MaybeNode(_) => "MaybeNode",
            Response::Flag(_) => "Flag",
            Response::Text(_) => "Text",
            Response::Count(_) => "Count",
            Response::Id(_) => "Id",
            Response::Dictionary(_) => "Dictionary",
            Response::Joined(_) => "Joined",
            Response::Error(_) => "Error",
        }
    }

    fn unexpected(self, expected: &'static str) -> TransportError {
        TransportError::UnexpectedResponse {
            expected,
            got: self.kind(),
        }
    }

    pub fn into_done(self) -> Result<()> {
        match self {
            Response::Done => Ok(()),
            other => Err(other.unexpected("Done")),
        }
    }

    pub fn into_node(self) -> Result<NodeRef> {
        match self {
            Response::Node(node) => Ok(node),
            other => Err(other.unexpected("Node")),
        }
    }

    pub fn into_maybe_node(self) -> Result<Option<NodeRef>> {
        match self {
            Response::MaybeNode(node) => Ok(node),
            other => Err(other.unexpected("MaybeNode")),
        }
    }

    pub fn into_flag(self) -> Result<bool> {
        match self {
            Response::Flag(flag) => Ok(flag),
            other => Err(other.unexpected("Flag")),
        }
    }

    pub fn into_text(self) -> Result<String> {
        match self {
            Response::Text(text) => Ok(text),
            other => Err(other.unexpected("Text")),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Response::Count(count) => Ok(count),
            other => Err(other.unexpected("Count")),
        }
    }

    pub fn into_id(self) -> Result<Identifier> {
        match self {
            Response::Id(id) => Ok(id),
            other => Err(other.unexpected("Id")),
        }
    }

    pub fn into_dictionary(self) -> Result<Dictionary> {
        match self {
            Response::Dictionary(entries) => Ok(entries),
            other => Err(other.unexpected("Dictionary")),
        }
    }

    pub fn into_joined(self) -> Result<JoinOutcome> {
        match self {
            Response::Joined(outcome) => Ok(outcome),
            other => Err(other.unexpected("Joined")),
        }
    }
}
