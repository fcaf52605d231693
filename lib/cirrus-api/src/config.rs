//! Stack configuration variables
//!
//! The variable surface of the public-network template: a VPC, one public
//! subnet in a chosen availability zone, an internet gateway, a route
//! table with a default route to the gateway, and the association that
//! activates it. `StackConfig::into_stack` expands the variables into the
//! fixed five-resource declaration set.

use crate::association::RouteTableAssociationSpec;
use crate::internet_gateway::InternetGatewaySpec;
use crate::refs::{GatewayRef, RouteTableRef, SubnetRef, VpcRef};
use crate::route_table::{RouteRule, RouteTableSpec, RouteTarget, DEFAULT_ROUTE_CIDR};
use crate::stack::NetworkStack;
use crate::subnet::SubnetSpec;
use crate::vpc::VpcSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input variables for a public-network stack
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    /// Name of the VPC; also the prefix for every derived resource name
    /// and Name tag
    pub vpc_name: String,

    /// IPv4 range of the VPC in CIDR notation
    pub vpc_cidr: String,

    /// IPv4 range of the public subnet; must be a strict subset of
    /// `vpc_cidr`
    pub public_subnet_cidr: String,

    /// Availability zone the public subnet is bound to
    pub availability_zone: String,

    /// Propagated to every resource as an "Owner" tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Additional tags merged onto every resource
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StackConfig {
    /// Expand the variables into the five-resource public-network stack.
    ///
    /// The wiring is fixed: the subnet, gateway, and route table reference
    /// the VPC; the route table's 0.0.0.0/0 rule references the gateway;
    /// the association references the subnet and the table.
    pub fn into_stack(self) -> NetworkStack {
        let vpc = VpcRef::new("main");

        NetworkStack {
            vpcs: vec![VpcSpec {
                name: "main".to_string(),
                cidr_block: self.vpc_cidr.clone(),
                tags: self.resource_tags(&self.vpc_name),
            }],
            subnets: vec![SubnetSpec {
                name: "public".to_string(),
                vpc: vpc.clone(),
                cidr_block: self.public_subnet_cidr.clone(),
                availability_zone: self.availability_zone.clone(),
                map_public_ip_on_launch: true,
                tags: self.resource_tags(&format!("{}-public", self.vpc_name)),
            }],
            internet_gateways: vec![InternetGatewaySpec {
                name: "main".to_string(),
                vpc: vpc.clone(),
                tags: self.resource_tags(&format!("{}-igw", self.vpc_name)),
            }],
            route_tables: vec![RouteTableSpec {
                name: "public".to_string(),
                vpc,
                routes: vec![RouteRule {
                    destination_cidr: DEFAULT_ROUTE_CIDR.to_string(),
                    target: RouteTarget::InternetGateway(GatewayRef::new("main")),
                }],
                tags: self.resource_tags(&format!("{}-public-rt", self.vpc_name)),
            }],
            associations: vec![RouteTableAssociationSpec {
                name: "public".to_string(),
                subnet: SubnetRef::new("public"),
                route_table: RouteTableRef::new("public"),
            }],
        }
    }

    fn resource_tags(&self, name: &str) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        tags.insert("Name".to_string(), name.to_string());
        if let Some(owner) = &self.owner {
            tags.insert("Owner".to_string(), owner.clone());
        }
        tags
    }
}
