//! The provider seam
//!
//! A CloudProvider turns one planned step into one remote operation. The
//! applier resolves every identifier a step needs before calling in, so
//! providers never look up other resources. Retries, throttling, and
//! quota handling belong to the provider side of the seam.

use crate::error::{EngineError, Result};
use async_trait::async_trait;
use cirrus_api::{
    InternetGatewaySpec, ResourceId, ResourceKind, RouteTableAssociationSpec, RouteTableSpec,
    SubnetSpec, VpcSpec,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Operations a provider must support, one per resource kind plus
/// uniform update and delete
#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn create_vpc(&self, spec: &VpcSpec) -> Result<String>;

    async fn create_subnet(&self, spec: &SubnetSpec, vpc_id: &str) -> Result<String>;

    async fn create_internet_gateway(
        &self,
        spec: &InternetGatewaySpec,
        vpc_id: &str,
    ) -> Result<String>;

    async fn create_route_table(
        &self,
        spec: &RouteTableSpec,
        vpc_id: &str,
        gateway_id: Option<&str>,
    ) -> Result<String>;

    async fn create_route_table_association(
        &self,
        spec: &RouteTableAssociationSpec,
        subnet_id: &str,
        route_table_id: &str,
    ) -> Result<String>;

    /// Update mutable attributes of an existing resource in place
    async fn update_resource(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        attributes: &serde_json::Value,
    ) -> Result<()>;

    async fn delete_resource(&self, kind: ResourceKind, resource_id: &str) -> Result<()>;
}

/// In-memory provider minting AWS-shaped identifiers. Used by tests and
/// dry runs; enforces nothing a real control plane would.
pub struct MemoryProvider {
    resources: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    fail_on: HashSet<ResourceId>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            resources: Arc::new(RwLock::new(HashMap::new())),
            fail_on: HashSet::new(),
        }
    }

    /// A provider whose remote view matches an existing snapshot, so
    /// updates and deletes of previously realized resources succeed
    pub fn from_snapshot(snapshot: &cirrus_core::StateSnapshot) -> Self {
        let resources = snapshot
            .resources
            .values()
            .map(|record| (record.resource_id.clone(), record.attributes.clone()))
            .collect();
        Self {
            resources: Arc::new(RwLock::new(resources)),
            fail_on: HashSet::new(),
        }
    }

    /// Reject creation of one declaration, for failure-path tests
    pub fn with_failure(mut self, kind: ResourceKind, name: &str) -> Self {
        self.fail_on.insert(ResourceId::new(kind, name));
        self
    }

    pub async fn resource_count(&self) -> usize {
        self.resources.read().await.len()
    }

    pub async fn contains(&self, resource_id: &str) -> bool {
        self.resources.read().await.contains_key(resource_id)
    }

    fn check_failure(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let id = ResourceId::new(kind, name);
        if self.fail_on.contains(&id) {
            return Err(EngineError::Provider(format!(
                "injected failure creating {id}"
            )));
        }
        Ok(())
    }

    async fn insert(&self, prefix: &str, attributes: serde_json::Value) -> String {
        let resource_id = mint_id(prefix);
        self.resources
            .write()
            .await
            .insert(resource_id.clone(), attributes);
        debug!("MemoryProvider created {}", resource_id);
        resource_id
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// AWS identifiers are a type prefix and 17 hex characters
fn mint_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..17])
}

#[async_trait]
impl CloudProvider for MemoryProvider {
    async fn create_vpc(&self, spec: &VpcSpec) -> Result<String> {
        self.check_failure(ResourceKind::Vpc, &spec.name)?;
        Ok(self.insert("vpc", serde_json::to_value(spec)?).await)
    }

    async fn create_subnet(&self, spec: &SubnetSpec, vpc_id: &str) -> Result<String> {
        self.check_failure(ResourceKind::Subnet, &spec.name)?;
        let mut attributes = serde_json::to_value(spec)?;
        attributes["vpcId"] = serde_json::Value::String(vpc_id.to_string());
        Ok(self.insert("subnet", attributes).await)
    }

    async fn create_internet_gateway(
        &self,
        spec: &InternetGatewaySpec,
        vpc_id: &str,
    ) -> Result<String> {
        self.check_failure(ResourceKind::InternetGateway, &spec.name)?;
        let mut attributes = serde_json::to_value(spec)?;
        attributes["vpcId"] = serde_json::Value::String(vpc_id.to_string());
        Ok(self.insert("igw", attributes).await)
    }

    async fn create_route_table(
        &self,
        spec: &RouteTableSpec,
        vpc_id: &str,
        gateway_id: Option<&str>,
    ) -> Result<String> {
        self.check_failure(ResourceKind::RouteTable, &spec.name)?;
        let mut attributes = serde_json::to_value(spec)?;
        attributes["vpcId"] = serde_json::Value::String(vpc_id.to_string());
        if let Some(gateway_id) = gateway_id {
            attributes["gatewayId"] = serde_json::Value::String(gateway_id.to_string());
        }
        Ok(self.insert("rtb", attributes).await)
    }

    async fn create_route_table_association(
        &self,
        spec: &RouteTableAssociationSpec,
        subnet_id: &str,
        route_table_id: &str,
    ) -> Result<String> {
        self.check_failure(ResourceKind::RouteTableAssociation, &spec.name)?;
        let mut attributes = serde_json::to_value(spec)?;
        attributes["subnetId"] = serde_json::Value::String(subnet_id.to_string());
        attributes["routeTableId"] = serde_json::Value::String(route_table_id.to_string());
        Ok(self.insert("rtbassoc", attributes).await)
    }

    async fn update_resource(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        attributes: &serde_json::Value,
    ) -> Result<()> {
        let mut resources = self.resources.write().await;
        match resources.get_mut(resource_id) {
            Some(existing) => {
                *existing = attributes.clone();
                debug!("MemoryProvider updated {} {}", kind, resource_id);
                Ok(())
            }
            None => Err(EngineError::Provider(format!(
                "no such {kind}: {resource_id}"
            ))),
        }
    }

    async fn delete_resource(&self, kind: ResourceKind, resource_id: &str) -> Result<()> {
        let mut resources = self.resources.write().await;
        match resources.remove(resource_id) {
            Some(_) => {
                debug!("MemoryProvider deleted {} {}", kind, resource_id);
                Ok(())
            }
            None => Err(EngineError::Provider(format!(
                "no such {kind}: {resource_id}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::VpcRef;

    #[test]
    fn test_minted_ids_have_aws_shape() {
        let id = mint_id("vpc");
        assert!(id.starts_with("vpc-"));
        assert_eq!(id.len(), "vpc-".len() + 17);
        assert_ne!(mint_id("vpc"), mint_id("vpc"));
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let provider = MemoryProvider::new();
        let vpc_id = provider
            .create_vpc(&VpcSpec {
                name: "main".to_string(),
                cidr_block: "10.0.0.0/16".to_string(),
                tags: Default::default(),
            })
            .await
            .unwrap();

        assert!(provider.contains(&vpc_id).await);
        provider
            .delete_resource(ResourceKind::Vpc, &vpc_id)
            .await
            .unwrap();
        assert_eq!(provider.resource_count().await, 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let provider = MemoryProvider::new().with_failure(ResourceKind::Subnet, "public");
        let err = provider
            .create_subnet(
                &SubnetSpec {
                    name: "public".to_string(),
                    vpc: VpcRef::new("main"),
                    cidr_block: "10.0.1.0/24".to_string(),
                    availability_zone: "us-east-1a".to_string(),
                    map_public_ip_on_launch: true,
                    tags: Default::default(),
                },
                "vpc-0123456789abcdef0",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Provider(_)));
    }
}
