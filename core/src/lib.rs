/// Fabric - store-and-forward routing between addressed endpoints
///
/// Endpoints queue messages into a linked router; the router's dispatch pass
/// delivers each message to the endpoint whose address matches its
/// destination, or drops it when nothing is linked there.

pub mod error;
pub mod config;
pub mod fabric;
pub mod scenario;

pub use config::Config;
pub use error::{FabricError, Result};
pub use fabric::{
    Address, AddressAllocator, DeadLetter, DispatchReport, DropReason, Endpoint, EndpointId,
    Fabric, FabricStats, Message, MonotonicAllocator, Router, RouterId, SendOutcome,
};
pub use scenario::{Scenario, Step, StepOutcome, Target};
