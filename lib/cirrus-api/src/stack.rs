//! The network stack: a set of resource declarations submitted together
//!
//! A stack is evaluated as a whole. Ordering between declarations is
//! derived entirely from their typed references; declarations that share
//! no reference have no defined order.

use crate::association::RouteTableAssociationSpec;
use crate::internet_gateway::InternetGatewaySpec;
use crate::route_table::RouteTableSpec;
use crate::subnet::SubnetSpec;
use crate::vpc::VpcSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a stack resource
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Vpc,
    Subnet,
    InternetGateway,
    RouteTable,
    RouteTableAssociation,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::InternetGateway => "internet-gateway",
            ResourceKind::RouteTable => "route-table",
            ResourceKind::RouteTableAssociation => "route-table-association",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a declaration within a stack: kind plus declared name
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Stable key used in state snapshots, e.g. "vpc/main"
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A complete set of network declarations
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStack {
    #[serde(default)]
    pub vpcs: Vec<VpcSpec>,

    #[serde(default)]
    pub subnets: Vec<SubnetSpec>,

    #[serde(default)]
    pub internet_gateways: Vec<InternetGatewaySpec>,

    #[serde(default)]
    pub route_tables: Vec<RouteTableSpec>,

    #[serde(default)]
    pub associations: Vec<RouteTableAssociationSpec>,
}

impl NetworkStack {
    pub fn vpc(&self, name: &str) -> Option<&VpcSpec> {
        self.vpcs.iter().find(|v| v.name == name)
    }

    pub fn subnet(&self, name: &str) -> Option<&SubnetSpec> {
        self.subnets.iter().find(|s| s.name == name)
    }

    pub fn internet_gateway(&self, name: &str) -> Option<&InternetGatewaySpec> {
        self.internet_gateways.iter().find(|g| g.name == name)
    }

    pub fn route_table(&self, name: &str) -> Option<&RouteTableSpec> {
        self.route_tables.iter().find(|t| t.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&RouteTableAssociationSpec> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Identities of every declaration in the stack
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids = Vec::with_capacity(self.len());
        ids.extend(
            self.vpcs
                .iter()
                .map(|v| ResourceId::new(ResourceKind::Vpc, v.name.clone())),
        );
        ids.extend(
            self.subnets
                .iter()
                .map(|s| ResourceId::new(ResourceKind::Subnet, s.name.clone())),
        );
        ids.extend(
            self.internet_gateways
                .iter()
                .map(|g| ResourceId::new(ResourceKind::InternetGateway, g.name.clone())),
        );
        ids.extend(
            self.route_tables
                .iter()
                .map(|t| ResourceId::new(ResourceKind::RouteTable, t.name.clone())),
        );
        ids.extend(
            self.associations
                .iter()
                .map(|a| ResourceId::new(ResourceKind::RouteTableAssociation, a.name.clone())),
        );
        ids
    }

    pub fn len(&self) -> usize {
        self.vpcs.len()
            + self.subnets.len()
            + self.internet_gateways.len()
            + self.route_tables.len()
            + self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
