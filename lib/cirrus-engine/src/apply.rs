//! Plan application
//!
//! The applier walks a plan in its topological order. A step runs only
//! once everything it references has a resolved identifier; when a create
//! fails, every transitive dependent is skipped and reported, and the
//! resulting snapshot records exactly the resources that realized.

use crate::error::{EngineError, Result};
use crate::provider::CloudProvider;
use cirrus_api::{NetworkStack, ResourceId, ResourceKind};
use cirrus_core::plan::desired_attributes;
use cirrus_core::{plan_stack, validate_stack, Action, CoreError, DependencyGraph};
use cirrus_core::{ResourceRecord, StateSnapshot};
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What one apply run did, node by node
#[derive(Clone, Debug, Default)]
pub struct ApplyReport {
    pub created: Vec<ResourceId>,
    pub updated: Vec<ResourceId>,
    pub unchanged: Vec<ResourceId>,
    pub deleted: Vec<ResourceId>,
    /// Steps the provider rejected, with the provider's message
    pub failed: Vec<(ResourceId, String)>,
    /// Steps not attempted because something they reference failed
    pub skipped: Vec<ResourceId>,
}

impl ApplyReport {
    /// True when every planned step ran and succeeded
    pub fn fully_realized(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Number of steps that changed remote state
    pub fn changes(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

/// Applies plans through a CloudProvider
pub struct Applier<'a> {
    provider: &'a dyn CloudProvider,
}

impl<'a> Applier<'a> {
    pub fn new(provider: &'a dyn CloudProvider) -> Self {
        Self { provider }
    }

    /// Validate, plan, and realize a stack against an observed snapshot.
    /// Returns the updated snapshot and the per-node report; a provider
    /// rejection surfaces in the report, not as an error.
    pub async fn apply(
        &self,
        stack: &NetworkStack,
        snapshot: &StateSnapshot,
    ) -> Result<(StateSnapshot, ApplyReport)> {
        validate_stack(stack).map_err(CoreError::from)?;
        let graph = DependencyGraph::from_stack(stack)?;
        let plan = plan_stack(stack, snapshot)?;
        info!(
            "Applying plan: {} steps, {} changing",
            plan.steps.len(),
            plan.changes()
        );

        let mut next = snapshot.clone();
        let mut report = ApplyReport::default();
        let mut blocked: BTreeSet<ResourceId> = BTreeSet::new();

        for step in &plan.steps {
            match step.action {
                Action::Noop => {
                    report.unchanged.push(step.id.clone());
                }
                Action::Create => {
                    if blocked.contains(&step.id) {
                        debug!("Skipping {}: a dependency failed", step.id);
                        report.skipped.push(step.id.clone());
                        continue;
                    }
                    match self.create(stack, &next, &step.id).await {
                        Ok(resource_id) => {
                            next.upsert(ResourceRecord {
                                id: step.id.clone(),
                                resource_id,
                                attributes: desired_attributes(stack, &step.id)?,
                            });
                            report.created.push(step.id.clone());
                        }
                        Err(err) => {
                            warn!("Failed to create {}: {}", step.id, err);
                            blocked.extend(graph.transitive_dependents(&step.id));
                            report.failed.push((step.id.clone(), err.to_string()));
                        }
                    }
                }
                Action::Update => {
                    // The identifier stays resolved through a failed
                    // update, so dependents are not blocked by one.
                    let attributes = desired_attributes(stack, &step.id)?;
                    let resource_id = next
                        .resolved_id(&step.id)
                        .ok_or_else(|| CoreError::Unresolved(step.id.to_string()))?
                        .to_string();
                    match self
                        .provider
                        .update_resource(step.id.kind, &resource_id, &attributes)
                        .await
                    {
                        Ok(()) => {
                            next.upsert(ResourceRecord {
                                id: step.id.clone(),
                                resource_id,
                                attributes,
                            });
                            report.updated.push(step.id.clone());
                        }
                        Err(err) => {
                            warn!("Failed to update {}: {}", step.id, err);
                            report.failed.push((step.id.clone(), err.to_string()));
                        }
                    }
                }
                Action::Delete => {
                    let Some(record) = next.remove(&step.id) else {
                        continue;
                    };
                    match self
                        .provider
                        .delete_resource(step.id.kind, &record.resource_id)
                        .await
                    {
                        Ok(()) => {
                            report.deleted.push(step.id.clone());
                        }
                        Err(err) => {
                            warn!("Failed to delete {}: {}", step.id, err);
                            // Still realized; keep the record
                            next.upsert(record);
                            report.failed.push((step.id.clone(), err.to_string()));
                        }
                    }
                }
            }
        }

        if report.changes() > 0 {
            next.serial += 1;
        }
        next.updated_at = Utc::now();

        info!(
            "Apply finished: {} created, {} updated, {} deleted, {} unchanged, {} failed, {} skipped",
            report.created.len(),
            report.updated.len(),
            report.deleted.len(),
            report.unchanged.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok((next, report))
    }

    async fn create(
        &self,
        stack: &NetworkStack,
        snapshot: &StateSnapshot,
        id: &ResourceId,
    ) -> Result<String> {
        let missing = || CoreError::ResourceNotFound(id.to_string());
        let resolved = |kind: ResourceKind, name: &str| -> Result<String> {
            let dependency = ResourceId::new(kind, name);
            snapshot
                .resolved_id(&dependency)
                .map(str::to_string)
                .ok_or_else(|| EngineError::MissingDependency {
                    resource: id.to_string(),
                    dependency: dependency.to_string(),
                })
        };

        match id.kind {
            ResourceKind::Vpc => {
                let spec = stack.vpc(&id.name).ok_or_else(missing)?;
                self.provider.create_vpc(spec).await
            }
            ResourceKind::Subnet => {
                let spec = stack.subnet(&id.name).ok_or_else(missing)?;
                let vpc_id = resolved(ResourceKind::Vpc, &spec.vpc.name)?;
                self.provider.create_subnet(spec, &vpc_id).await
            }
            ResourceKind::InternetGateway => {
                let spec = stack.internet_gateway(&id.name).ok_or_else(missing)?;
                let vpc_id = resolved(ResourceKind::Vpc, &spec.vpc.name)?;
                self.provider.create_internet_gateway(spec, &vpc_id).await
            }
            ResourceKind::RouteTable => {
                let spec = stack.route_table(&id.name).ok_or_else(missing)?;
                let vpc_id = resolved(ResourceKind::Vpc, &spec.vpc.name)?;
                let gateway_id = match spec.default_route_gateway() {
                    Some(gateway) => Some(resolved(ResourceKind::InternetGateway, &gateway.name)?),
                    None => None,
                };
                self.provider
                    .create_route_table(spec, &vpc_id, gateway_id.as_deref())
                    .await
            }
            ResourceKind::RouteTableAssociation => {
                let spec = stack.association(&id.name).ok_or_else(missing)?;
                let subnet_id = resolved(ResourceKind::Subnet, &spec.subnet.name)?;
                let route_table_id = resolved(ResourceKind::RouteTable, &spec.route_table.name)?;
                self.provider
                    .create_route_table_association(spec, &subnet_id, &route_table_id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;
    use cirrus_core::project_outputs;
    use cirrus_api::StackConfig;

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

    #[tokio::test]
    async fn test_apply_realizes_the_public_network() {
        let stack = config().into_stack();
        let provider = MemoryProvider::new();
        let applier = Applier::new(&provider);

        let (snapshot, report) = applier.apply(&stack, &StateSnapshot::empty()).await.unwrap();

        assert!(report.fully_realized());
        assert_eq!(report.created.len(), 5);
        assert_eq!(snapshot.resource_count(), 5);
        assert_eq!(snapshot.serial, 1);
        assert_eq!(provider.resource_count().await, 5);

        let outputs = project_outputs(&stack, &snapshot).unwrap();
        assert!(outputs.vpc_id.starts_with("vpc-"));
        assert!(outputs.public_subnet_id.starts_with("subnet-"));
        assert!(outputs.internet_gateway_id.starts_with("igw-"));
        assert!(outputs.public_route_table_id.starts_with("rtb-"));
        assert_eq!(outputs.vpc_cidr, "10.0.0.0/16");
    }

    #[tokio::test]
    async fn test_second_apply_changes_nothing() {
        let stack = config().into_stack();
        let provider = MemoryProvider::new();
        let applier = Applier::new(&provider);

        let (first, _) = applier.apply(&stack, &StateSnapshot::empty()).await.unwrap();
        let (second, report) = applier.apply(&stack, &first).await.unwrap();

        assert!(report.fully_realized());
        assert_eq!(report.changes(), 0);
        assert_eq!(report.unchanged.len(), 5);
        assert_eq!(second.serial, first.serial);
        assert_eq!(second.resources, first.resources);
    }

    #[tokio::test]
    async fn test_failed_create_skips_transitive_dependents() {
        let stack = config().into_stack();
        let provider = MemoryProvider::new().with_failure(ResourceKind::Subnet, "public");
        let applier = Applier::new(&provider);

        let (snapshot, report) = applier.apply(&stack, &StateSnapshot::empty()).await.unwrap();

        assert!(!report.fully_realized());
        // VPC, gateway, and route table realize; they do not reference
        // the subnet
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ResourceId::new(ResourceKind::Subnet, "public"));
        assert_eq!(
            report.skipped,
            vec![ResourceId::new(ResourceKind::RouteTableAssociation, "public")]
        );

        assert!(snapshot.get(&ResourceId::new(ResourceKind::Subnet, "public")).is_none());
        assert!(snapshot
            .get(&ResourceId::new(ResourceKind::RouteTableAssociation, "public"))
            .is_none());
        assert!(snapshot.resolved_id(&ResourceId::new(ResourceKind::Vpc, "main")).is_some());
    }

    #[tokio::test]
    async fn test_resuming_after_failure_completes_the_stack() {
        let stack = config().into_stack();

        let failing = MemoryProvider::new().with_failure(ResourceKind::Subnet, "public");
        let (partial, report) = Applier::new(&failing)
            .apply(&stack, &StateSnapshot::empty())
            .await
            .unwrap();
        assert!(!report.fully_realized());

        // Retry with the failure cleared: only the missing nodes run
        let healthy = MemoryProvider::new();
        let (snapshot, report) = Applier::new(&healthy).apply(&stack, &partial).await.unwrap();
        assert!(report.fully_realized());
        assert_eq!(report.unchanged.len(), 3);
        assert_eq!(report.created.len(), 2);
        assert_eq!(snapshot.resource_count(), 5);
    }

    #[tokio::test]
    async fn test_update_and_delete_flow() {
        let mut stack = config().into_stack();
        let provider = MemoryProvider::new();
        let applier = Applier::new(&provider);
        let (snapshot, _) = applier.apply(&stack, &StateSnapshot::empty()).await.unwrap();

        // Retire the public wiring: flag off, table and association gone
        stack.subnets[0].map_public_ip_on_launch = false;
        stack.route_tables.clear();
        stack.associations.clear();

        let (next, report) = applier.apply(&stack, &snapshot).await.unwrap();

        assert!(report.fully_realized());
        assert_eq!(report.updated, vec![ResourceId::new(ResourceKind::Subnet, "public")]);
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(next.resource_count(), 3);
        assert_eq!(next.serial, snapshot.serial + 1);
        assert!(next
            .get(&ResourceId::new(ResourceKind::RouteTable, "public"))
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_stack_is_rejected_before_any_provider_call() {
        let mut cfg = config();
        cfg.public_subnet_cidr = "10.1.0.0/24".to_string();
        let provider = MemoryProvider::new();
        let applier = Applier::new(&provider);

        let err = applier
            .apply(&cfg.into_stack(), &StateSnapshot::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));
        assert_eq!(provider.resource_count().await, 0);
    }
}
