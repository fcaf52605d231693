//! Stack validation
//!
//! All checks run against the declarations alone, before any graph or
//! provider work, and every violation is collected so a misconfigured
//! stack is reported in one pass. Provider-side constraints (quotas, zone
//! capacity) are out of scope; everything checkable from the declarations
//! is checked here, including the public-subnet contract that the wiring
//! alone used to carry.

use cirrus_api::{NetworkStack, ResourceId, ResourceKind, SubnetSpec};
use ipnetwork::Ipv4Network;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("duplicate declaration: {0}")]
    DuplicateName(ResourceId),

    #[error("{id}: {field} {value:?} is not a valid IPv4 CIDR")]
    InvalidCidr {
        id: ResourceId,
        field: &'static str,
        value: String,
    },

    #[error("subnet/{subnet}: {subnet_cidr} is not a strict subset of {vpc_cidr} (vpc/{vpc})")]
    SubnetNotWithinVpc {
        subnet: String,
        subnet_cidr: String,
        vpc: String,
        vpc_cidr: String,
    },

    #[error("subnet/{first} and subnet/{second} overlap within vpc/{vpc}")]
    OverlappingSubnets {
        vpc: String,
        first: String,
        second: String,
    },

    #[error("subnet/{subnet}: {zone:?} is not a valid availability zone")]
    InvalidAvailabilityZone { subnet: String, zone: String },

    #[error("{from} references undeclared {to}")]
    DanglingReference { from: ResourceId, to: ResourceId },

    #[error("vpc/{vpc} has {count} internet gateways attached, expected at most one")]
    MultipleGateways { vpc: String, count: usize },

    #[error("route-table/{route_table}: default route targets internet-gateway/{gateway}, which is attached to a different VPC")]
    GatewayOnForeignVpc {
        route_table: String,
        gateway: String,
    },

    #[error("subnet/{subnet} auto-assigns public IPs but has no route-table association with a 0.0.0.0/0 route to a gateway on its VPC")]
    PublicSubnetUnroutable { subnet: String },
}

/// All violations found in one validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Validate a stack; returns every violation found
pub fn validate_stack(stack: &NetworkStack) -> Result<(), ValidationFailure> {
    let mut errors = Vec::new();

    check_duplicate_names(stack, &mut errors);
    check_references(stack, &mut errors);
    check_cidrs(stack, &mut errors);
    check_availability_zones(stack, &mut errors);
    check_gateway_cardinality(stack, &mut errors);
    check_route_targets(stack, &mut errors);
    check_public_subnets(stack, &mut errors);

    if errors.is_empty() {
        debug!("Stack validated: {} declarations", stack.len());
        Ok(())
    } else {
        Err(ValidationFailure { errors })
    }
}

fn check_duplicate_names(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    let mut seen: BTreeMap<ResourceId, usize> = BTreeMap::new();
    for id in stack.resource_ids() {
        *seen.entry(id).or_insert(0) += 1;
    }
    for (id, count) in seen {
        if count > 1 {
            errors.push(ValidationError::DuplicateName(id));
        }
    }
}

fn check_references(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    let mut dangling = |from: ResourceId, to: ResourceId| {
        errors.push(ValidationError::DanglingReference { from, to });
    };

    for subnet in &stack.subnets {
        if stack.vpc(&subnet.vpc.name).is_none() {
            dangling(
                ResourceId::new(ResourceKind::Subnet, subnet.name.clone()),
                ResourceId::new(ResourceKind::Vpc, subnet.vpc.name.clone()),
            );
        }
    }
    for gateway in &stack.internet_gateways {
        if stack.vpc(&gateway.vpc.name).is_none() {
            dangling(
                ResourceId::new(ResourceKind::InternetGateway, gateway.name.clone()),
                ResourceId::new(ResourceKind::Vpc, gateway.vpc.name.clone()),
            );
        }
    }
    for table in &stack.route_tables {
        let from = ResourceId::new(ResourceKind::RouteTable, table.name.clone());
        if stack.vpc(&table.vpc.name).is_none() {
            dangling(
                from.clone(),
                ResourceId::new(ResourceKind::Vpc, table.vpc.name.clone()),
            );
        }
        for gateway in table.gateway_refs() {
            if stack.internet_gateway(&gateway.name).is_none() {
                dangling(
                    from.clone(),
                    ResourceId::new(ResourceKind::InternetGateway, gateway.name.clone()),
                );
            }
        }
    }
    for assoc in &stack.associations {
        let from = ResourceId::new(ResourceKind::RouteTableAssociation, assoc.name.clone());
        if stack.subnet(&assoc.subnet.name).is_none() {
            dangling(
                from.clone(),
                ResourceId::new(ResourceKind::Subnet, assoc.subnet.name.clone()),
            );
        }
        if stack.route_table(&assoc.route_table.name).is_none() {
            dangling(
                from,
                ResourceId::new(ResourceKind::RouteTable, assoc.route_table.name.clone()),
            );
        }
    }
}

fn check_cidrs(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    let mut vpc_networks: BTreeMap<&str, Ipv4Network> = BTreeMap::new();

    for vpc in &stack.vpcs {
        match vpc.cidr_block.parse::<Ipv4Network>() {
            Ok(network) => {
                vpc_networks.insert(vpc.name.as_str(), network);
            }
            Err(_) => errors.push(ValidationError::InvalidCidr {
                id: ResourceId::new(ResourceKind::Vpc, vpc.name.clone()),
                field: "cidrBlock",
                value: vpc.cidr_block.clone(),
            }),
        }
    }

    // Subnet ranges per VPC, for the pairwise overlap check
    let mut subnet_networks: BTreeMap<&str, Vec<(&SubnetSpec, Ipv4Network)>> = BTreeMap::new();

    for subnet in &stack.subnets {
        let network = match subnet.cidr_block.parse::<Ipv4Network>() {
            Ok(network) => network,
            Err(_) => {
                errors.push(ValidationError::InvalidCidr {
                    id: ResourceId::new(ResourceKind::Subnet, subnet.name.clone()),
                    field: "cidrBlock",
                    value: subnet.cidr_block.clone(),
                });
                continue;
            }
        };

        if let Some(vpc_network) = vpc_networks.get(subnet.vpc.name.as_str()) {
            // Strict subset: the subnet must sit inside the VPC range and
            // must not consume the whole of it
            if !network.is_subnet_of(*vpc_network) || network == *vpc_network {
                errors.push(ValidationError::SubnetNotWithinVpc {
                    subnet: subnet.name.clone(),
                    subnet_cidr: subnet.cidr_block.clone(),
                    vpc: subnet.vpc.name.clone(),
                    vpc_cidr: vpc_network.to_string(),
                });
            }
        }

        subnet_networks
            .entry(subnet.vpc.name.as_str())
            .or_default()
            .push((subnet, network));
    }

    for (vpc, subnets) in subnet_networks {
        for (i, (first, first_net)) in subnets.iter().enumerate() {
            for (second, second_net) in subnets.iter().skip(i + 1) {
                if first_net.overlaps(*second_net) {
                    errors.push(ValidationError::OverlappingSubnets {
                        vpc: vpc.to_string(),
                        first: first.name.clone(),
                        second: second.name.clone(),
                    });
                }
            }
        }
    }

    for table in &stack.route_tables {
        for rule in &table.routes {
            if rule.destination_cidr.parse::<Ipv4Network>().is_err() {
                errors.push(ValidationError::InvalidCidr {
                    id: ResourceId::new(ResourceKind::RouteTable, table.name.clone()),
                    field: "destinationCidr",
                    value: rule.destination_cidr.clone(),
                });
            }
        }
    }
}

fn check_availability_zones(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    for subnet in &stack.subnets {
        if !valid_availability_zone(&subnet.availability_zone) {
            errors.push(ValidationError::InvalidAvailabilityZone {
                subnet: subnet.name.clone(),
                zone: subnet.availability_zone.clone(),
            });
        }
    }
}

/// Zone names are a region followed by a zone letter, e.g. "us-east-1a".
/// Whether the zone exists in the target region is the provider's call.
fn valid_availability_zone(zone: &str) -> bool {
    let mut tail = zone.chars().rev();
    matches!(tail.next(), Some(c) if c.is_ascii_lowercase())
        && matches!(tail.next(), Some(c) if c.is_ascii_digit())
        && zone.contains('-')
}

fn check_gateway_cardinality(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    let mut per_vpc: BTreeMap<&str, usize> = BTreeMap::new();
    for gateway in &stack.internet_gateways {
        *per_vpc.entry(gateway.vpc.name.as_str()).or_insert(0) += 1;
    }
    for (vpc, count) in per_vpc {
        if count > 1 {
            errors.push(ValidationError::MultipleGateways {
                vpc: vpc.to_string(),
                count,
            });
        }
    }
}

fn check_route_targets(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    for table in &stack.route_tables {
        for gateway_ref in table.gateway_refs() {
            if let Some(gateway) = stack.internet_gateway(&gateway_ref.name) {
                if gateway.vpc != table.vpc {
                    errors.push(ValidationError::GatewayOnForeignVpc {
                        route_table: table.name.clone(),
                        gateway: gateway.name.clone(),
                    });
                }
            }
        }
    }
}

/// The public-subnet contract: auto-assigning public IPs only makes a
/// subnet internet-reachable together with a default route to a gateway
/// on the same VPC. Reject any stack that sets the flag without the route.
fn check_public_subnets(stack: &NetworkStack, errors: &mut Vec<ValidationError>) {
    for subnet in &stack.subnets {
        if !subnet.map_public_ip_on_launch {
            continue;
        }

        let routable = stack
            .associations
            .iter()
            .filter(|assoc| assoc.subnet.name == subnet.name)
            .filter_map(|assoc| stack.route_table(&assoc.route_table.name))
            .filter_map(|table| table.default_route_gateway())
            .filter_map(|gateway_ref| stack.internet_gateway(&gateway_ref.name))
            .any(|gateway| gateway.vpc == subnet.vpc);

        if !routable {
            errors.push(ValidationError::PublicSubnetUnroutable {
                subnet: subnet.name.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::{GatewayRef, RouteRule, RouteTarget, StackConfig, SubnetRef};

    fn config() -> StackConfig {
        StackConfig {
            vpc_name: "lab".to_string(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            public_subnet_cidr: "10.0.1.0/24".to_string(),
            availability_zone: "us-east-1a".to_string(),
            owner: None,
            tags: Default::default(),
        }
    }

    #[test]
    fn test_template_stack_is_valid() {
        let stack = config().into_stack();
        assert!(validate_stack(&stack).is_ok());
    }

    #[test]
    fn test_subnet_outside_vpc_is_rejected() {
        let mut cfg = config();
        cfg.public_subnet_cidr = "10.1.0.0/24".to_string();
        let failure = validate_stack(&cfg.into_stack()).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::SubnetNotWithinVpc { .. })));
    }

    #[test]
    fn test_subnet_equal_to_vpc_is_rejected() {
        let mut cfg = config();
        cfg.public_subnet_cidr = cfg.vpc_cidr.clone();
        let failure = validate_stack(&cfg.into_stack()).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::SubnetNotWithinVpc { .. })));
    }

    #[test]
    fn test_malformed_cidr_is_rejected() {
        let mut cfg = config();
        cfg.vpc_cidr = "10.0.0.0/33".to_string();
        let failure = validate_stack(&cfg.into_stack()).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidCidr { .. })));
    }

    #[test]
    fn test_bad_availability_zone_is_rejected() {
        let mut cfg = config();
        cfg.availability_zone = "us-east-1".to_string();
        let failure = validate_stack(&cfg.into_stack()).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidAvailabilityZone { .. })));
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let mut stack = config().into_stack();
        stack.associations[0].subnet = SubnetRef::new("missing");
        let failure = validate_stack(&stack).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::DanglingReference { .. })));
    }

    #[test]
    fn test_overlapping_subnets_are_rejected() {
        let mut stack = config().into_stack();
        let mut second = stack.subnets[0].clone();
        second.name = "public-b".to_string();
        second.cidr_block = "10.0.1.128/25".to_string();
        second.map_public_ip_on_launch = false;
        stack.subnets.push(second);

        let failure = validate_stack(&stack).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::OverlappingSubnets { .. })));
    }

    #[test]
    fn test_public_subnet_without_default_route_is_rejected() {
        let mut stack = config().into_stack();
        // Keep the flag, drop the default route: the wiring no longer
        // fulfils the contract and validation must catch it.
        stack.route_tables[0].routes.clear();
        let failure = validate_stack(&stack).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::PublicSubnetUnroutable { .. })));
    }

    #[test]
    fn test_public_subnet_routed_to_foreign_gateway_is_rejected() {
        let mut stack = config().into_stack();
        // Second VPC with its own gateway; point the public route table's
        // default route at that gateway instead.
        let mut other_vpc = stack.vpcs[0].clone();
        other_vpc.name = "other".to_string();
        other_vpc.cidr_block = "172.16.0.0/16".to_string();
        stack.vpcs.push(other_vpc);

        let mut other_gateway = stack.internet_gateways[0].clone();
        other_gateway.name = "other".to_string();
        other_gateway.vpc = cirrus_api::VpcRef::new("other");
        stack.internet_gateways.push(other_gateway);

        stack.route_tables[0].routes = vec![RouteRule {
            destination_cidr: "0.0.0.0/0".to_string(),
            target: RouteTarget::InternetGateway(GatewayRef::new("other")),
        }];

        let failure = validate_stack(&stack).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::GatewayOnForeignVpc { .. })));
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::PublicSubnetUnroutable { .. })));
    }

    #[test]
    fn test_two_gateways_on_one_vpc_are_rejected() {
        let mut stack = config().into_stack();
        let mut second = stack.internet_gateways[0].clone();
        second.name = "second".to_string();
        stack.internet_gateways.push(second);

        let failure = validate_stack(&stack).unwrap_err();
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::MultipleGateways { count: 2, .. })));
    }

    #[test]
    fn test_failure_report_collects_all_errors() {
        let mut cfg = config();
        cfg.public_subnet_cidr = "not-a-cidr".to_string();
        cfg.availability_zone = "nowhere".to_string();
        let failure = validate_stack(&cfg.into_stack()).unwrap_err();
        assert!(failure.errors.len() >= 2);
        assert!(failure.to_string().contains("error(s)"));
    }
}
