//! Resource dependency graph
//!
//! Edges come only from typed attribute references: a declaration that
//! references another's identifier cannot be realized until the referenced
//! declaration is. The graph owns ordering and nothing else; it assumes no
//! order between nodes that share no edge.

use crate::error::{CoreError, Result};
use cirrus_api::{NetworkStack, ResourceId, ResourceKind};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// node -> declarations it references
    dependencies: BTreeMap<ResourceId, BTreeSet<ResourceId>>,
    /// node -> declarations referencing it
    dependents: BTreeMap<ResourceId, BTreeSet<ResourceId>>,
}

impl DependencyGraph {
    /// Build the graph for a stack. Fails on the first reference to an
    /// undeclared resource; run `validate_stack` first for a full report.
    pub fn from_stack(stack: &NetworkStack) -> Result<Self> {
        let mut graph = Self::default();

        for id in stack.resource_ids() {
            graph.dependencies.entry(id.clone()).or_default();
            graph.dependents.entry(id).or_default();
        }

        for subnet in &stack.subnets {
            graph.add_edge(
                ResourceId::new(ResourceKind::Subnet, subnet.name.clone()),
                ResourceId::new(ResourceKind::Vpc, subnet.vpc.name.clone()),
            )?;
        }
        for gateway in &stack.internet_gateways {
            graph.add_edge(
                ResourceId::new(ResourceKind::InternetGateway, gateway.name.clone()),
                ResourceId::new(ResourceKind::Vpc, gateway.vpc.name.clone()),
            )?;
        }
        for table in &stack.route_tables {
            let from = ResourceId::new(ResourceKind::RouteTable, table.name.clone());
            graph.add_edge(
                from.clone(),
                ResourceId::new(ResourceKind::Vpc, table.vpc.name.clone()),
            )?;
            for gateway in table.gateway_refs() {
                graph.add_edge(
                    from.clone(),
                    ResourceId::new(ResourceKind::InternetGateway, gateway.name.clone()),
                )?;
            }
        }
        for assoc in &stack.associations {
            let from = ResourceId::new(ResourceKind::RouteTableAssociation, assoc.name.clone());
            graph.add_edge(
                from.clone(),
                ResourceId::new(ResourceKind::Subnet, assoc.subnet.name.clone()),
            )?;
            graph.add_edge(
                from,
                ResourceId::new(ResourceKind::RouteTable, assoc.route_table.name.clone()),
            )?;
        }

        debug!(
            "Built dependency graph: {} nodes, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn add_edge(&mut self, from: ResourceId, to: ResourceId) -> Result<()> {
        if !self.dependencies.contains_key(&to) {
            return Err(CoreError::DanglingReference {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.dependents
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        self.dependencies.entry(from).or_default().insert(to);
        Ok(())
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.dependencies.contains_key(id)
    }

    /// Declarations this node references
    pub fn dependencies_of(&self, id: &ResourceId) -> Vec<ResourceId> {
        self.dependencies
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Declarations that reference this node directly
    pub fn dependents_of(&self, id: &ResourceId) -> Vec<ResourceId> {
        self.dependents
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Everything that transitively references this node. When a node
    /// fails to realize, these are the nodes left unrealized.
    pub fn transitive_dependents(&self, id: &ResourceId) -> BTreeSet<ResourceId> {
        let mut result = BTreeSet::new();
        let mut queue: VecDeque<ResourceId> = self.dependents_of(id).into();
        while let Some(next) = queue.pop_front() {
            if result.insert(next.clone()) {
                queue.extend(self.dependents_of(&next));
            }
        }
        result
    }

    /// Deterministic topological order: referenced declarations first,
    /// independent declarations in (kind, name) order.
    pub fn topological_order(&self) -> Result<Vec<ResourceId>> {
        let mut indegree: BTreeMap<&ResourceId, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (id, deps.len()))
            .collect();

        let mut ready: BTreeSet<&ResourceId> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(id) = ready.iter().next().cloned() {
            ready.remove(id);
            order.push(id.clone());
            if let Some(dependents) = self.dependents.get(id) {
                for dependent in dependents {
                    let degree = indegree
                        .get_mut(dependent)
                        .ok_or_else(|| CoreError::Internal(format!("unknown node {dependent}")))?;
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() != self.len() {
            // A reference kind that closes a loop cannot be declared with
            // the current vocabulary, but the check keeps the walk honest.
            let stuck = indegree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(id, _)| id.to_string())
                .unwrap_or_default();
            return Err(CoreError::DependencyCycle(stuck));
        }

        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    fn edge_count(&self) -> usize {
        self.dependencies.values().map(|deps| deps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::{StackConfig, SubnetRef};

    fn stack() -> NetworkStack {
        StackConfig {
            vpc_name: "lab".to_string(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            public_subnet_cidr: "10.0.1.0/24".to_string(),
            availability_zone: "us-east-1a".to_string(),
            owner: None,
            tags: Default::default(),
        }
        .into_stack()
    }

    #[test]
    fn test_topological_order_respects_references() {
        let graph = DependencyGraph::from_stack(&stack()).unwrap();
        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 5);

        let position = |kind: ResourceKind, name: &str| {
            order
                .iter()
                .position(|id| id.kind == kind && id.name == name)
                .unwrap()
        };

        let vpc = position(ResourceKind::Vpc, "main");
        let subnet = position(ResourceKind::Subnet, "public");
        let gateway = position(ResourceKind::InternetGateway, "main");
        let table = position(ResourceKind::RouteTable, "public");
        let assoc = position(ResourceKind::RouteTableAssociation, "public");

        assert!(vpc < subnet);
        assert!(vpc < gateway);
        assert!(gateway < table);
        assert!(subnet < assoc);
        assert!(table < assoc);
    }

    #[test]
    fn test_order_is_deterministic() {
        let graph = DependencyGraph::from_stack(&stack()).unwrap();
        let first = graph.topological_order().unwrap();
        let second = graph.topological_order().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dangling_reference_fails_graph_construction() {
        let mut stack = stack();
        stack.associations[0].subnet = SubnetRef::new("missing");
        let err = DependencyGraph::from_stack(&stack).unwrap_err();
        assert!(matches!(err, CoreError::DanglingReference { .. }));
    }

    #[test]
    fn test_transitive_dependents_of_the_vpc_is_everything_else() {
        let graph = DependencyGraph::from_stack(&stack()).unwrap();
        let dependents =
            graph.transitive_dependents(&ResourceId::new(ResourceKind::Vpc, "main"));
        assert_eq!(dependents.len(), 4);
    }

    #[test]
    fn test_transitive_dependents_of_the_subnet() {
        let graph = DependencyGraph::from_stack(&stack()).unwrap();
        let dependents =
            graph.transitive_dependents(&ResourceId::new(ResourceKind::Subnet, "public"));
        assert_eq!(
            dependents.into_iter().collect::<Vec<_>>(),
            vec![ResourceId::new(ResourceKind::RouteTableAssociation, "public")]
        );
    }
}
