/// Router state: routing table and the inbound queue awaiting dispatch
use super::address::Address;
use super::endpoint::EndpointId;
use super::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Handle to a router owned by a [`Fabric`](super::Fabric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouterId(pub(crate) usize);

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Store-and-forward hub.
///
/// Holds non-owning handles to endpoints; the endpoints themselves live in
/// the fabric. Keeping the table and the endpoints' back-references in sync
/// is the fabric's job.
#[derive(Debug, Clone, Default)]
pub struct Router {
    inbound: VecDeque<Message>,
    routing_table: HashMap<Address, EndpointId>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `address -> endpoint`, returning whatever was there before
    pub fn bind(&mut self, address: Address, endpoint: EndpointId) -> Option<EndpointId> {
        self.routing_table.insert(address, endpoint)
    }

    /// Remove the entry for `address`, if any
    pub fn unbind(&mut self, address: Address) -> Option<EndpointId> {
        self.routing_table.remove(&address)
    }

    /// Look up the endpoint linked at `address`
    pub fn route(&self, address: Address) -> Option<EndpointId> {
        self.routing_table.get(&address).copied()
    }

    /// All routing entries, sorted by address
    pub fn routes(&self) -> Vec<(Address, EndpointId)> {
        let mut routes: Vec<_> = self.routing_table.iter().map(|(a, e)| (*a, *e)).collect();
        routes.sort();
        routes
    }

    pub fn enqueue(&mut self, message: Message) {
        self.inbound.push_back(message);
    }

    /// Snapshot and clear the inbound queue
    pub fn take_inbound(&mut self) -> VecDeque<Message> {
        std::mem::take(&mut self.inbound)
    }

    /// Messages waiting for the next dispatch
    pub fn queued(&self) -> usize {
        self.inbound.len()
    }
}
