use crate::models::{Message, MessageKind};

// Returns the messages whose kind is one of `kinds`, keeping their relative order.
// An empty kind set matches nothing.
pub fn filter_messages(messages: &[Message], kinds: &[MessageKind]) -> Vec<Message> {
    MessageFilter::new(kinds.to_vec()).apply(messages)
}

// Selects messages by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    // Target kinds; duplicates are harmless
    kinds: Vec<MessageKind>,
}

impl MessageFilter {
    pub fn new(kinds: Vec<MessageKind>) -> Self {
        MessageFilter { kinds }
    }

    // Parses a list of kinds separated by ';' (e.g. "bank/MsgSend;pdv/MsgCreatePDV")
    pub fn parse(list: &str) -> Self {
        let kinds = list
            .split(';')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(MessageKind::from)
            .collect();
        MessageFilter { kinds }
    }

    pub fn kinds(&self) -> &[MessageKind] {
        &self.kinds
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.kinds.iter().any(|kind| *kind == message.kind)
    }

    pub fn apply(&self, messages: &[Message]) -> Vec<Message> {
        // Nothing to select from an empty kind set
        if self.kinds.is_empty() {
            return Vec::new();
        }
        messages
            .iter()
            .filter(|m| self.matches(m))
            .cloned()
            .collect()
    }
}
