use crate::refs::{RouteTableRef, SubnetRef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RouteTableAssociation binds a subnet to a route table, activating
/// the table's rules for the subnet's traffic
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableAssociationSpec {
    /// Name of this association declaration (for reference)
    pub name: String,

    /// Subnet being associated
    pub subnet: SubnetRef,

    /// Route table the subnet's traffic is governed by
    pub route_table: RouteTableRef,
}

/// Status of a realized association
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableAssociationStatus {
    /// Whether the association has been realized
    #[serde(default)]
    pub ready: bool,

    /// Provider-assigned identifier (e.g. "rtbassoc-0a1b2c…")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_id: Option<String>,
}
