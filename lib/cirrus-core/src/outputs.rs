//! Output projection
//!
//! Outputs are pure read-only projections of resolved resource attributes.
//! They are computed only once every contributing resource is present in
//! the snapshot; a partially realized stack has no outputs.

use crate::error::{CoreError, Result};
use crate::state::StateSnapshot;
use cirrus_api::{NetworkStack, ResourceId, ResourceKind, StackOutputs};

/// Project the public-network outputs from a realized stack.
///
/// Follows the declared wiring: the stack's VPC, its auto-public-IP
/// subnet, the subnet's association, the associated route table, and the
/// gateway named by that table's default route.
pub fn project_outputs(stack: &NetworkStack, snapshot: &StateSnapshot) -> Result<StackOutputs> {
    let vpc = stack
        .vpcs
        .first()
        .ok_or_else(|| CoreError::ResourceNotFound("vpc".to_string()))?;

    let subnet = stack
        .subnets
        .iter()
        .find(|s| s.map_public_ip_on_launch && s.vpc.name == vpc.name)
        .ok_or_else(|| CoreError::ResourceNotFound("public subnet".to_string()))?;

    let assoc = stack
        .associations
        .iter()
        .find(|a| a.subnet.name == subnet.name)
        .ok_or_else(|| {
            CoreError::ResourceNotFound(format!("association for subnet/{}", subnet.name))
        })?;

    let table = stack.route_table(&assoc.route_table.name).ok_or_else(|| {
        CoreError::ResourceNotFound(format!("route-table/{}", assoc.route_table.name))
    })?;

    let gateway = table.default_route_gateway().ok_or_else(|| {
        CoreError::ResourceNotFound(format!("default route of route-table/{}", table.name))
    })?;

    let resolved = |id: ResourceId| -> Result<String> {
        snapshot
            .resolved_id(&id)
            .map(str::to_string)
            .ok_or_else(|| CoreError::Unresolved(id.to_string()))
    };

    Ok(StackOutputs {
        vpc_id: resolved(ResourceId::new(ResourceKind::Vpc, vpc.name.clone()))?,
        vpc_cidr: vpc.cidr_block.clone(),
        public_subnet_id: resolved(ResourceId::new(ResourceKind::Subnet, subnet.name.clone()))?,
        internet_gateway_id: resolved(ResourceId::new(
            ResourceKind::InternetGateway,
            gateway.name.clone(),
        ))?,
        public_route_table_id: resolved(ResourceId::new(
            ResourceKind::RouteTable,
            table.name.clone(),
        ))?,
    })
}
