use crate::refs::{GatewayRef, VpcRef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Destination CIDR of the default route
pub const DEFAULT_ROUTE_CIDR: &str = "0.0.0.0/0";

/// RouteTable declares forwarding rules for traffic leaving a VPC's
/// subnets
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSpec {
    /// Name of this route table declaration (for reference)
    pub name: String,

    /// VPC this route table belongs to
    pub vpc: VpcRef,

    /// Forwarding rules, most-specific destination wins
    #[serde(default)]
    pub routes: Vec<RouteRule>,

    /// Tags applied to the created route table
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A single forwarding rule: destination range to next hop
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    /// Destination IPv4 range in CIDR notation
    pub destination_cidr: String,

    /// Next hop for matching traffic
    pub target: RouteTarget,
}

/// Next-hop target of a route rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RouteTarget {
    /// Traffic stays within the VPC
    Local,
    /// Traffic is forwarded to an internet gateway
    InternetGateway(GatewayRef),
}

impl Default for RouteTarget {
    fn default() -> Self {
        RouteTarget::Local
    }
}

impl RouteTableSpec {
    /// The gateway named by this table's default (0.0.0.0/0) route, if any
    pub fn default_route_gateway(&self) -> Option<&GatewayRef> {
        self.routes.iter().find_map(|rule| {
            if rule.destination_cidr != DEFAULT_ROUTE_CIDR {
                return None;
            }
            match &rule.target {
                RouteTarget::InternetGateway(gateway) => Some(gateway),
                RouteTarget::Local => None,
            }
        })
    }

    /// Gateways referenced by any rule in this table
    pub fn gateway_refs(&self) -> impl Iterator<Item = &GatewayRef> {
        self.routes.iter().filter_map(|rule| match &rule.target {
            RouteTarget::InternetGateway(gateway) => Some(gateway),
            RouteTarget::Local => None,
        })
    }
}

/// Status of a realized route table
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableStatus {
    /// Whether the route table has been realized
    #[serde(default)]
    pub ready: bool,

    /// Provider-assigned identifier (e.g. "rtb-0a1b2c…")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_route_gateway() {
        let table = RouteTableSpec {
            name: "public".to_string(),
            vpc: VpcRef::new("main"),
            routes: vec![
                RouteRule {
                    destination_cidr: "10.0.0.0/16".to_string(),
                    target: RouteTarget::Local,
                },
                RouteRule {
                    destination_cidr: DEFAULT_ROUTE_CIDR.to_string(),
                    target: RouteTarget::InternetGateway(GatewayRef::new("main")),
                },
            ],
            tags: Default::default(),
        };

        assert_eq!(table.default_route_gateway(), Some(&GatewayRef::new("main")));
        assert_eq!(table.gateway_refs().count(), 1);
    }

    #[test]
    fn test_local_default_route_is_not_a_gateway_route() {
        let table = RouteTableSpec {
            name: "private".to_string(),
            vpc: VpcRef::new("main"),
            routes: vec![RouteRule {
                destination_cidr: DEFAULT_ROUTE_CIDR.to_string(),
                target: RouteTarget::Local,
            }],
            tags: Default::default(),
        };

        assert_eq!(table.default_route_gateway(), None);
    }
}
