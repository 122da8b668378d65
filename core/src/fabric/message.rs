/// Addressed message carried through the fabric
use super::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable (payload, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    payload: Vec<u8>,
    destination: Address,
}

impl Message {
    /// Create a message with a raw payload
    pub fn new(payload: impl Into<Vec<u8>>, destination: Address) -> Self {
        Self {
            payload: payload.into(),
            destination,
        }
    }

    /// Create a message carrying UTF-8 text
    pub fn text(text: &str, destination: Address) -> Self {
        Self::new(text.as_bytes().to_vec(), destination)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn destination(&self) -> Address {
        self.destination
    }

    /// Payload as text, if it is valid UTF-8
    pub fn payload_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload_text() {
            Some(text) => write!(f, "Data({:?}, {})", text, self.destination),
            None => write!(f, "Data({} bytes, {})", self.payload.len(), self.destination),
        }
    }
}
