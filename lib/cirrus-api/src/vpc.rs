use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vpc declares an isolated virtual network identified by an IPv4
/// address range
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpcSpec {
    /// Name of this VPC declaration (for reference)
    pub name: String,

    /// IPv4 address range in CIDR notation (e.g. "10.0.0.0/16")
    pub cidr_block: String,

    /// Tags applied to the created VPC
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Status of a realized VPC
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpcStatus {
    /// Whether the VPC has been realized
    #[serde(default)]
    pub ready: bool,

    /// Provider-assigned identifier (e.g. "vpc-0a1b2c…")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
}
