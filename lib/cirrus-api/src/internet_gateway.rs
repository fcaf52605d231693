use crate::refs::VpcRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// InternetGateway declares the internet-facing edge device of a VPC.
/// One gateway per VPC; attaching it makes internet reachability
/// possible, not automatic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewaySpec {
    /// Name of this gateway declaration (for reference)
    pub name: String,

    /// VPC the gateway is attached to
    pub vpc: VpcRef,

    /// Tags applied to the created gateway
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Status of a realized internet gateway
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewayStatus {
    /// Whether the gateway has been realized
    #[serde(default)]
    pub ready: bool,

    /// Provider-assigned identifier (e.g. "igw-0a1b2c…")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
}
