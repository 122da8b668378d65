/// Addressable endpoint with an inbound buffer and a back-reference to its router
use super::address::Address;
use super::message::Message;
use super::router::RouterId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Handle to an endpoint owned by a [`Fabric`](super::Fabric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub(crate) usize);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// An endpoint ("server") in the fabric
#[derive(Debug, Clone)]
pub struct Endpoint {
    address: Address,
    inbound: VecDeque<Message>,
    linked_router: Option<RouterId>,
}

impl Endpoint {
    /// Create an unlinked endpoint with an empty buffer
    pub fn new(address: Address) -> Self {
        Self {
            address,
            inbound: VecDeque::new(),
            linked_router: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn linked_router(&self) -> Option<RouterId> {
        self.linked_router
    }

    pub fn is_linked(&self) -> bool {
        self.linked_router.is_some()
    }

    /// Set or clear the back-reference. Does not touch any routing table.
    pub fn link_to(&mut self, router: Option<RouterId>) {
        self.linked_router = router;
    }

    /// Drain the inbound buffer, oldest first
    pub fn receive(&mut self) -> Vec<Message> {
        self.inbound.drain(..).collect()
    }

    /// Non-draining view of the inbound buffer
    pub fn peek(&self) -> impl Iterator<Item = &Message> {
        self.inbound.iter()
    }

    /// Number of messages waiting to be received
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    pub(crate) fn deliver(&mut self, message: Message) {
        self.inbound.push_back(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_endpoint_is_unlinked_and_empty() {
        let ep = Endpoint::new(Address::new(1));
        assert_eq!(ep.address(), Address::new(1));
        assert!(!ep.is_linked());
        assert_eq!(ep.pending(), 0);
    }

    #[test]
    fn test_receive_drains_in_order() {
        let mut ep = Endpoint::new(Address::new(1));
        ep.deliver(Message::text("a", Address::new(1)));
        ep.deliver(Message::text("b", Address::new(1)));

        let got = ep.receive();
        assert_eq!(
            got,
            vec![Message::text("a", Address::new(1)), Message::text("b", Address::new(1))]
        );

        // Second call sees nothing
        assert!(ep.receive().is_empty());
    }

    #[test]
    fn test_peek_does_not_drain() {
        let mut ep = Endpoint::new(Address::new(3));
        ep.deliver(Message::text("x", Address::new(3)));
        assert_eq!(ep.peek().count(), 1);
        assert_eq!(ep.pending(), 1);
    }

    #[test]
    fn test_link_to_is_idempotent() {
        let mut ep = Endpoint::new(Address::new(1));
        ep.link_to(Some(RouterId(0)));
        ep.link_to(Some(RouterId(0)));
        assert_eq!(ep.linked_router(), Some(RouterId(0)));

        ep.link_to(None);
        assert_eq!(ep.linked_router(), None);
    }
}
