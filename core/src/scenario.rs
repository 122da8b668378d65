/// Scripted topologies: a JSON list of steps driven against a fabric
use crate::error::{FabricError, Result};
use crate::fabric::{
    Address, DispatchReport, EndpointId, Fabric, Message, RouterId, SendOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Where a scripted message is headed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Raw address, routable or not
    Address(u64),
    /// Address of a named endpoint
    Endpoint(String),
}

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Endpoint { name: String },
    Router { name: String },
    Link { router: String, endpoint: String },
    Unlink { router: String, endpoint: String },
    Send { from: String, to: Target, text: String },
    Dispatch { router: String },
    Receive { endpoint: String },
}

/// What a step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOutcome {
    Endpoint { name: String, address: Address },
    Router { name: String },
    Link { router: String, endpoint: String },
    Unlink { router: String, endpoint: String },
    Send { from: String, outcome: SendOutcome },
    Dispatch { router: String, report: DispatchReport },
    Receive { endpoint: String, messages: Vec<Message> },
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Endpoint { name, address } => write!(f, "endpoint {} = {}", name, address),
            StepOutcome::Router { name } => write!(f, "router {}", name),
            StepOutcome::Link { router, endpoint } => write!(f, "{}.link({})", router, endpoint),
            StepOutcome::Unlink { router, endpoint } => {
                write!(f, "{}.unlink({})", router, endpoint)
            }
            StepOutcome::Send { from, outcome } => match outcome {
                SendOutcome::Queued(router) => write!(f, "{}.send -> queued on {}", from, router),
                SendOutcome::Discarded => write!(f, "{}.send -> discarded (unlinked)", from),
            },
            StepOutcome::Dispatch { router, report } => write!(
                f,
                "{}.dispatch -> {} delivered, {} dropped",
                router, report.delivered, report.dropped
            ),
            StepOutcome::Receive { endpoint, messages } => {
                let rendered: Vec<String> = messages.iter().map(|m| m.to_string()).collect();
                write!(f, "{}.receive -> [{}]", endpoint, rendered.join(", "))
            }
        }
    }
}

/// An ordered script of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON (`{"steps": [...]}`)
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(FabricError::Serialization)
    }

    /// Load a scenario file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(FabricError::Io)?;
        Self::from_json(&raw)
    }

    /// Two endpoints on one router: deliver, then unlink the receiver and drop.
    pub fn demo() -> Self {
        let name = |s: &str| s.to_string();
        Self {
            steps: vec![
                Step::Router { name: name("r") },
                Step::Endpoint { name: name("a") },
                Step::Endpoint { name: name("b") },
                Step::Link { router: name("r"), endpoint: name("a") },
                Step::Link { router: name("r"), endpoint: name("b") },
                Step::Send { from: name("a"), to: Target::Endpoint(name("b")), text: name("hello") },
                Step::Dispatch { router: name("r") },
                Step::Receive { endpoint: name("b") },
                Step::Receive { endpoint: name("a") },
                Step::Unlink { router: name("r"), endpoint: name("b") },
                Step::Send { from: name("a"), to: Target::Endpoint(name("b")), text: name("x") },
                Step::Dispatch { router: name("r") },
                Step::Receive { endpoint: name("b") },
            ],
        }
    }

    /// Run every step in order against `fabric`
    pub fn run(&self, fabric: &mut Fabric) -> Result<Vec<StepOutcome>> {
        let mut names = Names::default();
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            debug!("Step {}: {:?}", index, step);
            outcomes.push(Self::apply(fabric, &mut names, step)?);
        }
        Ok(outcomes)
    }

    fn apply(fabric: &mut Fabric, names: &mut Names, step: &Step) -> Result<StepOutcome> {
        let outcome = match step {
            Step::Endpoint { name } => {
                names.ensure_free(name)?;
                let id = fabric.create_endpoint();
                names.endpoints.insert(name.clone(), id);
                StepOutcome::Endpoint {
                    name: name.clone(),
                    address: fabric.address(id)?,
                }
            }
            Step::Router { name } => {
                names.ensure_free(name)?;
                let id = fabric.create_router();
                names.routers.insert(name.clone(), id);
                StepOutcome::Router { name: name.clone() }
            }
            Step::Link { router, endpoint } => {
                fabric.link(names.router(router)?, names.endpoint(endpoint)?)?;
                StepOutcome::Link {
                    router: router.clone(),
                    endpoint: endpoint.clone(),
                }
            }
            Step::Unlink { router, endpoint } => {
                fabric.unlink(names.router(router)?, names.endpoint(endpoint)?)?;
                StepOutcome::Unlink {
                    router: router.clone(),
                    endpoint: endpoint.clone(),
                }
            }
            Step::Send { from, to, text } => {
                let destination = match to {
                    Target::Address(raw) => Address::new(*raw),
                    Target::Endpoint(name) => fabric.address(names.endpoint(name)?)?,
                };
                let outcome = fabric.send(names.endpoint(from)?, Message::text(text, destination))?;
                StepOutcome::Send {
                    from: from.clone(),
                    outcome,
                }
            }
            Step::Dispatch { router } => StepOutcome::Dispatch {
                router: router.clone(),
                report: fabric.dispatch(names.router(router)?)?,
            },
            Step::Receive { endpoint } => StepOutcome::Receive {
                endpoint: endpoint.clone(),
                messages: fabric.receive(names.endpoint(endpoint)?)?,
            },
        };
        Ok(outcome)
    }
}

#[derive(Default)]
struct Names {
    endpoints: HashMap<String, EndpointId>,
    routers: HashMap<String, RouterId>,
}

impl Names {
    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.endpoints.contains_key(name) || self.routers.contains_key(name) {
            return Err(FabricError::Scenario(format!("name {:?} is already taken", name)));
        }
        Ok(())
    }

    fn endpoint(&self, name: &str) -> Result<EndpointId> {
        self.endpoints
            .get(name)
            .copied()
            .ok_or_else(|| FabricError::Scenario(format!("unknown endpoint {:?}", name)))
    }

    fn router(&self, name: &str) -> Result<RouterId> {
        self.routers
            .get(name)
            .copied()
            .ok_or_else(|| FabricError::Scenario(format!("unknown router {:?}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let raw = r#"{"steps": [
            {"op": "router", "name": "r"},
            {"op": "endpoint", "name": "a"},
            {"op": "send", "from": "a", "to": 7, "text": "hi"},
            {"op": "send", "from": "a", "to": "a", "text": "self"}
        ]}"#;
        let scenario = Scenario::from_json(raw).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[2],
            Step::Send {
                from: "a".to_string(),
                to: Target::Address(7),
                text: "hi".to_string()
            }
        );
        assert!(matches!(
            &scenario.steps[3],
            Step::Send { to: Target::Endpoint(name), .. } if name == "a"
        ));
    }

    #[test]
    fn test_demo_outcomes() {
        let mut fabric = Fabric::default();
        let outcomes = Scenario::demo().run(&mut fabric).unwrap();

        // b receives exactly the first message
        assert_eq!(
            outcomes[7],
            StepOutcome::Receive {
                endpoint: "b".to_string(),
                messages: vec![Message::text("hello", Address::new(2))],
            }
        );
        // a receives nothing
        assert_eq!(
            outcomes[8],
            StepOutcome::Receive {
                endpoint: "a".to_string(),
                messages: vec![],
            }
        );
        // after unlink, the second message is dropped
        assert_eq!(
            outcomes[11],
            StepOutcome::Dispatch {
                router: "r".to_string(),
                report: DispatchReport { delivered: 0, dropped: 1 },
            }
        );
        assert_eq!(
            outcomes[12],
            StepOutcome::Receive {
                endpoint: "b".to_string(),
                messages: vec![],
            }
        );
    }

    #[test]
    fn test_unknown_name_is_error() {
        let scenario = Scenario {
            steps: vec![Step::Dispatch {
                router: "ghost".to_string(),
            }],
        };
        let err = scenario.run(&mut Fabric::default()).unwrap_err();
        assert!(matches!(err, FabricError::Scenario(_)));
    }

    #[test]
    fn test_duplicate_name_is_error() {
        let scenario = Scenario {
            steps: vec![
                Step::Endpoint { name: "a".to_string() },
                Step::Router { name: "a".to_string() },
            ],
        };
        assert!(scenario.run(&mut Fabric::default()).is_err());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = StepOutcome::Dispatch {
            router: "r".to_string(),
            report: DispatchReport { delivered: 2, dropped: 1 },
        };
        assert_eq!(outcome.to_string(), "r.dispatch -> 2 delivered, 1 dropped");
    }
}
