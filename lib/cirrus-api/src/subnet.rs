use crate::refs::VpcRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subnet declares a zone-bound sub-range of a VPC's address space
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Name of this subnet declaration (for reference)
    pub name: String,

    /// VPC this subnet belongs to
    pub vpc: VpcRef,

    /// IPv4 address range in CIDR notation; must be a strict subset of
    /// the VPC's range
    pub cidr_block: String,

    /// Availability zone the subnet is bound to (e.g. "us-east-1a")
    pub availability_zone: String,

    /// Auto-assign a public IP to instances launched in this subnet.
    /// Setting this does not make the subnet internet-reachable on its
    /// own; the subnet must also route 0.0.0.0/0 to a gateway.
    #[serde(default)]
    pub map_public_ip_on_launch: bool,

    /// Tags applied to the created subnet
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Status of a realized subnet
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    /// Whether the subnet has been realized
    #[serde(default)]
    pub ready: bool,

    /// Provider-assigned identifier (e.g. "subnet-0a1b2c…")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}
