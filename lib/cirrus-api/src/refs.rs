//! Typed references between stack declarations
//!
//! Every reference names a declaration in the same stack. An attribute
//! reference is the only thing that creates an ordering edge between two
//! declarations, so references are typed per resource kind rather than
//! carried as bare strings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a VPC declared in the same stack
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct VpcRef {
    /// Name of the VPC declaration
    pub name: String,
}

/// Reference to a subnet declared in the same stack
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SubnetRef {
    /// Name of the subnet declaration
    pub name: String,
}

/// Reference to an internet gateway declared in the same stack
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GatewayRef {
    /// Name of the gateway declaration
    pub name: String,
}

/// Reference to a route table declared in the same stack
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct RouteTableRef {
    /// Name of the route table declaration
    pub name: String,
}

impl VpcRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SubnetRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GatewayRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RouteTableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
