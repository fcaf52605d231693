//! Cirrus API types for declarative network stacks
//!
//! This library defines the resource declarations for a cirrus stack:
//! - Vpc: an isolated virtual network with an IPv4 address range
//! - Subnet: a zone-bound sub-range of a VPC
//! - InternetGateway: the internet-facing edge device of a VPC
//! - RouteTable: forwarding rules for a VPC's traffic
//! - RouteTableAssociation: binds a subnet to a route table
//!
//! Declarations are pure data; validation, planning, and realization live
//! in cirrus-core and cirrus-engine.

pub mod association;
pub mod config;
pub mod internet_gateway;
pub mod outputs;
pub mod refs;
pub mod route_table;
pub mod stack;
pub mod subnet;
pub mod vpc;

pub use association::{RouteTableAssociationSpec, RouteTableAssociationStatus};
pub use config::StackConfig;
pub use internet_gateway::{InternetGatewaySpec, InternetGatewayStatus};
pub use outputs::StackOutputs;
pub use refs::{GatewayRef, RouteTableRef, SubnetRef, VpcRef};
pub use route_table::{RouteRule, RouteTableSpec, RouteTableStatus, RouteTarget, DEFAULT_ROUTE_CIDR};
pub use stack::{NetworkStack, ResourceId, ResourceKind};
pub use subnet::{SubnetSpec, SubnetStatus};
pub use vpc::{VpcSpec, VpcStatus};

/// API version for cirrus stack documents
pub const API_VERSION: &str = "cirrus/v1";
