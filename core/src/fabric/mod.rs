/// Routing fabric: owns endpoints and routers, keeps links consistent, dispatches
///
/// Endpoints and routers refer to each other through integer handles into the
/// fabric's arenas, never through owning pointers.
pub mod address;
pub mod endpoint;
pub mod message;
pub mod router;
pub mod stats;

pub use address::{Address, AddressAllocator, MonotonicAllocator};
pub use endpoint::{Endpoint, EndpointId};
pub use message::Message;
pub use router::{Router, RouterId};
pub use stats::{DeadLetter, DispatchReport, DropReason, FabricStats, SendOutcome};

use crate::config::Config;
use crate::error::{FabricError, Result};
use tracing::{debug, info, warn};

/// Application context for a set of endpoints and routers
pub struct Fabric {
    endpoints: Vec<Option<Endpoint>>,
    routers: Vec<Router>,
    allocator: Box<dyn AddressAllocator>,
    stats: FabricStats,
    capture_dead_letters: bool,
    dead_letters: Vec<DeadLetter>,
}

impl Fabric {
    /// Create a fabric using a counter allocator starting at `config.first_address`
    pub fn new(config: &Config) -> Self {
        Self::with_allocator(
            config,
            Box::new(MonotonicAllocator::starting_at(config.first_address)),
        )
    }

    /// Create a fabric with a caller-supplied address allocator
    pub fn with_allocator(config: &Config, allocator: Box<dyn AddressAllocator>) -> Self {
        Self {
            endpoints: Vec::new(),
            routers: Vec::new(),
            allocator,
            stats: FabricStats::default(),
            capture_dead_letters: config.capture_dead_letters,
            dead_letters: Vec::new(),
        }
    }

    // ── Construction ──────────────────────────────────────────────────

    /// Create an endpoint with a fresh address, no link, empty buffer
    pub fn create_endpoint(&mut self) -> EndpointId {
        let address = self.allocator.allocate();
        let id = EndpointId(self.endpoints.len());
        self.endpoints.push(Some(Endpoint::new(address)));
        debug!("Created endpoint {} at {}", id, address);
        id
    }

    /// Create a router with an empty table and queue
    pub fn create_router(&mut self) -> RouterId {
        let id = RouterId(self.routers.len());
        self.routers.push(Router::new());
        debug!("Created router {}", id);
        id
    }

    /// Unlink an endpoint and release it. Its address is never reissued.
    pub fn remove_endpoint(&mut self, id: EndpointId) -> Result<Endpoint> {
        let linked = self.endpoint(id)?.linked_router();
        if let Some(router) = linked {
            self.unlink(router, id)?;
        }
        let slot = self
            .endpoints
            .get_mut(id.0)
            .ok_or(FabricError::UnknownEndpoint(id))?;
        let endpoint = slot.take().ok_or(FabricError::UnknownEndpoint(id))?;
        info!("Removed endpoint {} ({})", id, endpoint.address());
        Ok(endpoint)
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn endpoint(&self, id: EndpointId) -> Result<&Endpoint> {
        self.endpoints
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(FabricError::UnknownEndpoint(id))
    }

    fn endpoint_mut(&mut self, id: EndpointId) -> Result<&mut Endpoint> {
        self.endpoints
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(FabricError::UnknownEndpoint(id))
    }

    pub fn router(&self, id: RouterId) -> Result<&Router> {
        self.routers.get(id.0).ok_or(FabricError::UnknownRouter(id))
    }

    fn router_mut(&mut self, id: RouterId) -> Result<&mut Router> {
        self.routers.get_mut(id.0).ok_or(FabricError::UnknownRouter(id))
    }

    pub fn address(&self, id: EndpointId) -> Result<Address> {
        Ok(self.endpoint(id)?.address())
    }

    /// Endpoint currently linked at `address` on `router`
    pub fn lookup(&self, router: RouterId, address: Address) -> Result<Option<EndpointId>> {
        Ok(self.router(router)?.route(address))
    }

    pub fn stats(&self) -> FabricStats {
        self.stats
    }

    /// Drain the captured dead letters (always empty unless capture is enabled)
    pub fn take_dead_letters(&mut self) -> Vec<DeadLetter> {
        std::mem::take(&mut self.dead_letters)
    }

    // ── Endpoint operations ───────────────────────────────────────────

    /// Set the endpoint's back-reference only; no routing table is touched
    pub fn link_to(&mut self, id: EndpointId, router: Option<RouterId>) -> Result<()> {
        if let Some(router) = router {
            self.router(router)?;
        }
        self.endpoint_mut(id)?.link_to(router);
        Ok(())
    }

    /// Queue `message` on the sender's linked router, or discard it if unlinked
    pub fn send(&mut self, from: EndpointId, message: Message) -> Result<SendOutcome> {
        let linked = self.endpoint(from)?.linked_router();
        let outcome = match linked {
            Some(router_id) => {
                debug!("{} queued {} on {}", from, message, router_id);
                self.router_mut(router_id)?.enqueue(message);
                SendOutcome::Queued(router_id)
            }
            None => {
                debug!("{} is not linked, discarding {}", from, message);
                self.record_dead_letter(message, DropReason::SenderUnlinked { sender: from });
                SendOutcome::Discarded
            }
        };
        self.stats.record_send(outcome);
        Ok(outcome)
    }

    /// Drain the endpoint's inbound buffer, oldest first
    pub fn receive(&mut self, id: EndpointId) -> Result<Vec<Message>> {
        Ok(self.endpoint_mut(id)?.receive())
    }

    // ── Router operations ─────────────────────────────────────────────

    /// Register the endpoint in the router's table and point it back at the router
    pub fn link(&mut self, router_id: RouterId, endpoint_id: EndpointId) -> Result<()> {
        self.router(router_id)?;
        let endpoint = self.endpoint(endpoint_id)?;
        let address = endpoint.address();

        // One router at a time: leave the previous router's table first.
        if let Some(previous) = endpoint.linked_router() {
            if previous != router_id {
                self.unlink(previous, endpoint_id)?;
            }
        }

        let displaced = self.router_mut(router_id)?.bind(address, endpoint_id);
        if let Some(other) = displaced.filter(|other| *other != endpoint_id) {
            warn!(
                "{} displaced {} at {} on {}",
                endpoint_id, other, address, router_id
            );
            if let Ok(other) = self.endpoint_mut(other) {
                if other.linked_router() == Some(router_id) {
                    other.link_to(None);
                }
            }
        }

        self.endpoint_mut(endpoint_id)?.link_to(Some(router_id));
        info!("Linked {} ({}) to {}", endpoint_id, address, router_id);
        Ok(())
    }

    /// Remove the endpoint's address from the router's table. No-op if absent.
    pub fn unlink(&mut self, router_id: RouterId, endpoint_id: EndpointId) -> Result<()> {
        let address = self.endpoint(endpoint_id)?.address();
        let Some(bound) = self.router_mut(router_id)?.unbind(address) else {
            debug!("{} not in {}'s table, nothing to unlink", address, router_id);
            return Ok(());
        };

        if bound != endpoint_id {
            if let Ok(displaced) = self.endpoint_mut(bound) {
                if displaced.linked_router() == Some(router_id) {
                    displaced.link_to(None);
                }
            }
        }
        self.endpoint_mut(endpoint_id)?.link_to(None);
        info!("Unlinked {} ({}) from {}", endpoint_id, address, router_id);
        Ok(())
    }

    /// Deliver every queued message to the endpoint linked at its destination.
    ///
    /// Works on a snapshot of the queue taken at entry; unroutable messages
    /// are dropped without error.
    pub fn dispatch(&mut self, router_id: RouterId) -> Result<DispatchReport> {
        let queue = self.router_mut(router_id)?.take_inbound();
        let mut report = DispatchReport::default();

        for message in queue {
            let destination = message.destination();
            let target = match self.routers[router_id.0].route(destination) {
                Some(id) => self.endpoints.get_mut(id.0).and_then(Option::as_mut),
                None => None,
            };
            match target {
                Some(endpoint) => {
                    debug!("{} delivering {} to {}", router_id, message, destination);
                    endpoint.deliver(message);
                    report.delivered += 1;
                }
                None => {
                    debug!("{} dropped {}: no route to {}", router_id, message, destination);
                    self.record_dead_letter(message, DropReason::NoRoute { router: router_id });
                    report.dropped += 1;
                }
            }
        }

        self.stats.record_dispatch(report);
        if report.total() > 0 {
            debug!(
                "{} dispatch: {} delivered, {} dropped",
                router_id, report.delivered, report.dropped
            );
        }
        Ok(report)
    }

    fn record_dead_letter(&mut self, message: Message, reason: DropReason) {
        if self.capture_dead_letters {
            self.dead_letters.push(DeadLetter { message, reason });
        }
    }
}

impl Default for Fabric {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
