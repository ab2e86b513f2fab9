//! Dependency impact analysis
//!
//! Services form a directed graph: an edge `producer -> consumer` exists for
//! every dependency row, whatever the schema. A change to a schema reaches
//! its direct consumers first, and from there every service that consumes
//! anything those consumers produce.

use std::collections::BTreeSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};

use crate::store::Dependency;

/// Services affected by a change to one schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Rows of consumers that depend on the schema itself
    pub direct_impact: Vec<Dependency>,
    /// Downstream services reached through the direct consumers, excluding
    /// the producer and the direct consumers themselves
    pub transitive_impact: Vec<String>,
}

/// Service dependency graph
#[derive(Debug, Default)]
pub struct ServiceGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> ServiceGraph<'a> {
    pub fn new(dependencies: &'a [Dependency]) -> Self {
        let mut graph = DiGraphMap::new();
        for dep in dependencies {
            graph.add_edge(dep.producer_service.as_str(), dep.consumer_service.as_str(), ());
        }
        Self { graph }
    }

    /// Every service reachable from `service`, excluding itself
    pub fn downstream_of(&self, service: &str) -> BTreeSet<&'a str> {
        let mut reached = BTreeSet::new();
        let Some(start) = self.graph.nodes().find(|node| *node == service) else {
            return reached;
        };

        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(node) = bfs.next(&self.graph) {
            if node != start {
                reached.insert(node);
            }
        }
        reached
    }
}

/// Compute the impact of changing `schema_name` as published by `producer`
pub fn analyze_impact(dependencies: &[Dependency], producer: &str, schema_name: &str) -> ImpactReport {
    let direct_impact: Vec<Dependency> = dependencies
        .iter()
        .filter(|dep| dep.producer_service == producer && dep.schema_name == schema_name)
        .cloned()
        .collect();

    let direct: BTreeSet<&str> = direct_impact
        .iter()
        .map(|dep| dep.consumer_service.as_str())
        .collect();

    // Paths leading back into the producer do not carry this change further.
    let onward: Vec<Dependency> = dependencies
        .iter()
        .filter(|dep| dep.consumer_service != producer)
        .cloned()
        .collect();
    let graph = ServiceGraph::new(&onward);
    let mut transitive = BTreeSet::new();
    for consumer in &direct {
        for service in graph.downstream_of(consumer) {
            if !direct.contains(service) {
                transitive.insert(service.to_string());
            }
        }
    }

    ImpactReport {
        direct_impact,
        transitive_impact: transitive.into_iter().collect(),
    }
}
