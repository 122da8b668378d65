/// Delivery statistics and dead-letter records
/// Drops stay silent on the data path; this is where they become visible.
use super::address::Address;
use super::endpoint::EndpointId;
use super::message::Message;
use super::router::RouterId;
use serde::{Deserialize, Serialize};

/// Result of handing a message to `Fabric::send`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Appended to the linked router's inbound queue
    Queued(RouterId),
    /// Sender had no linked router; message discarded
    Discarded,
}

/// Summary of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub dropped: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.delivered + self.dropped
    }
}

/// Why a message never reached an inbound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// `send` from an endpoint with no linked router
    SenderUnlinked { sender: EndpointId },
    /// Destination address had no entry in the router's table at dispatch
    NoRoute { router: RouterId },
}

/// A dropped message retained for inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub message: Message,
    #[serde(flatten)]
    pub reason: DropReason,
}

impl DeadLetter {
    pub fn destination(&self) -> Address {
        self.message.destination()
    }
}

/// Running counters for a fabric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricStats {
    pub messages_sent: u64,
    pub discarded_unlinked: u64,
    pub delivered: u64,
    pub dropped_no_route: u64,
    pub dispatch_passes: u64,
}

impl FabricStats {
    pub(crate) fn record_send(&mut self, outcome: SendOutcome) {
        self.messages_sent += 1;
        if outcome == SendOutcome::Discarded {
            self.discarded_unlinked += 1;
        }
    }

    pub(crate) fn record_dispatch(&mut self, report: DispatchReport) {
        self.dispatch_passes += 1;
        self.delivered += report.delivered as u64;
        self.dropped_no_route += report.dropped as u64;
    }

    /// Messages lost for any reason
    pub fn total_dropped(&self) -> u64 {
        self.discarded_unlinked + self.dropped_no_route
    }

    /// Fraction of sent messages that were delivered (1.0 when nothing sent)
    pub fn delivery_ratio(&self) -> f64 {
        if self.messages_sent == 0 {
            return 1.0;
        }
        self.delivered as f64 / self.messages_sent as f64
    }
}
