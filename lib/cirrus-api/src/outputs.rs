use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resolved outputs of a realized public-network stack.
///
/// Each field is a pure projection of one resolved resource attribute;
/// outputs carry no state of their own and are stable until the next
/// reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputs {
    /// Identifier of the VPC
    pub vpc_id: String,

    /// Address range of the VPC
    pub vpc_cidr: String,

    /// Identifier of the public subnet
    pub public_subnet_id: String,

    /// Identifier of the internet gateway
    pub internet_gateway_id: String,

    /// Identifier of the public route table
    pub public_route_table_id: String,
}
