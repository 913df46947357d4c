use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blockchain::filter::filter_messages;

// Identifies the kind of a message, e.g. "pdv/MsgCreatePDV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKind(String);

impl MessageKind {
    pub fn new(kind: impl Into<String>) -> Self {
        MessageKind(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageKind {
    fn from(kind: &str) -> Self {
        MessageKind::new(kind)
    }
}

impl From<String> for MessageKind {
    fn from(kind: String) -> Self {
        MessageKind(kind)
    }
}

// A single typed instruction embedded in a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind, // Kind tag used for filtering
    #[serde(default)]
    pub value: serde_json::Value, // Message payload as delivered by the node
}

impl Message {
    pub fn new(kind: impl Into<MessageKind>, value: serde_json::Value) -> Self {
        Message { kind: kind.into(), value }
    }
}

// A decoded transaction; only its messages are inspected by the fetcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    #[serde(rename = "msg", default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub memo: String,
}

impl Tx {
    pub fn new(messages: Vec<Message>) -> Self {
        Tx { messages, memo: String::new() }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

// Block data as returned by a node, before transaction decoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBlock {
    pub height: u64,
    pub time: String, // Header time as reported by the node (RFC 3339)
    pub txs: Vec<Vec<u8>>, // Encoded transactions in node order
}

// A block at a given height with all of its transactions decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub time: String,
    pub txs: Vec<Tx>,
}

impl Block {
    // Flattens every message of every transaction, in transaction order then message order
    pub fn messages(&self) -> Vec<Message> {
        self.txs
            .iter()
            .flat_map(|tx| tx.messages.iter().cloned())
            .collect()
    }

    // Messages of the block matching one of the given kinds
    pub fn messages_of(&self, kinds: &[MessageKind]) -> Vec<Message> {
        filter_messages(&self.messages(), kinds)
    }
}
