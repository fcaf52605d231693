//! Plan computation
//!
//! A plan diffs the desired declarations against the observed snapshot:
//! absent resources are created, divergent ones updated in place,
//! matching ones left alone, and records with no remaining declaration
//! deleted. Creates and updates are ordered topologically; deletes run
//! after, dependents first.

use crate::error::{CoreError, Result};
use crate::graph::DependencyGraph;
use crate::state::StateSnapshot;
use cirrus_api::{NetworkStack, ResourceId, ResourceKind};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// What the applier will do with one declaration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Noop,
    Delete,
}

impl Action {
    /// One-character marker used when rendering a plan
    pub fn symbol(&self) -> char {
        match self {
            Action::Create => '+',
            Action::Update => '~',
            Action::Noop => '=',
            Action::Delete => '-',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Noop => "no-op",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// One step of a plan
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedStep {
    pub id: ResourceId,
    pub action: Action,
}

/// Ordered steps for one reconciliation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    pub steps: Vec<PlannedStep>,
}

impl Plan {
    /// Number of steps that change remote state
    pub fn changes(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.action != Action::Noop)
            .count()
    }

    /// True when applying would change nothing
    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }
}

/// Canonical attribute value of a declaration, as stored in the snapshot
/// and compared on subsequent runs
pub fn desired_attributes(stack: &NetworkStack, id: &ResourceId) -> Result<serde_json::Value> {
    let missing = || CoreError::ResourceNotFound(id.to_string());
    let value = match id.kind {
        ResourceKind::Vpc => serde_json::to_value(stack.vpc(&id.name).ok_or_else(missing)?)?,
        ResourceKind::Subnet => serde_json::to_value(stack.subnet(&id.name).ok_or_else(missing)?)?,
        ResourceKind::InternetGateway => {
            serde_json::to_value(stack.internet_gateway(&id.name).ok_or_else(missing)?)?
        }
        ResourceKind::RouteTable => {
            serde_json::to_value(stack.route_table(&id.name).ok_or_else(missing)?)?
        }
        ResourceKind::RouteTableAssociation => {
            serde_json::to_value(stack.association(&id.name).ok_or_else(missing)?)?
        }
    };
    Ok(value)
}

/// Compute the plan for a stack against an observed snapshot
pub fn plan_stack(stack: &NetworkStack, snapshot: &StateSnapshot) -> Result<Plan> {
    let graph = DependencyGraph::from_stack(stack)?;
    let order = graph.topological_order()?;

    let mut steps = Vec::with_capacity(order.len());
    let declared: BTreeSet<ResourceId> = order.iter().cloned().collect();

    for id in order {
        let action = match snapshot.get(&id) {
            None => Action::Create,
            Some(record) => {
                if record.attributes == desired_attributes(stack, &id)? {
                    Action::Noop
                } else {
                    Action::Update
                }
            }
        };
        steps.push(PlannedStep { id, action });
    }

    // Records with no remaining declaration. They are absent from the
    // graph, so order them by reversed (kind, name): associations drop
    // before the tables and subnets they bind.
    let mut stale: Vec<ResourceId> = snapshot
        .resource_ids()
        .into_iter()
        .filter(|id| !declared.contains(id))
        .collect();
    stale.sort();
    for id in stale.into_iter().rev() {
        steps.push(PlannedStep {
            id,
            action: Action::Delete,
        });
    }

    let plan = Plan { steps };
    debug!(
        "Planned {} steps, {} changing",
        plan.steps.len(),
        plan.changes()
    );
    Ok(plan)
}
