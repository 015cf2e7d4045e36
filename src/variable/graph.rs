//! The `Graph` variable kind. See `SPEC_FULL.md` §4.4.6.

use std::collections::BTreeSet;

use crate::constraints::custom::PeerEnv;
use crate::constraints::graph::{GraphConstraint, Lookup};
use crate::error::{GenerationError, RetryPolicy, SpecimenError};
use crate::resolver::Resolver;
use crate::value::{Edge, Graph, Value};

/// A declared `Graph` variable: a bag of [`GraphConstraint`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphVariable {
    constraints: Vec<GraphConstraint>,
}

impl GraphVariable {
    /// An unconstrained graph variable. Generation requires at least
    /// `NumNodes` and `NumEdges` to be declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, builder-style.
    pub fn with(mut self, constraint: GraphConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The declared constraints, in declaration order.
    pub fn constraints(&self) -> &[GraphConstraint] {
        &self.constraints
    }

    /// Appends `other`'s constraints onto a clone of `self`.
    pub fn merge(&self, other: &GraphVariable) -> GraphVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by any constraint's expressions.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.constraints
            .iter()
            .flat_map(GraphConstraint::dependencies)
            .collect()
    }

    fn node_bounds(&self, lookup: &mut Lookup<'_>) -> Option<(i64, i64)> {
        self.constraints.iter().find_map(|c| match c {
            GraphConstraint::NumNodes(min, max) => {
                match (min.eval(lookup), max.eval(lookup)) {
                    (Ok(lo), Ok(hi)) => Some((lo, hi)),
                    _ => None,
                }
            }
            _ => None,
        })
    }

    fn edge_bounds(&self, lookup: &mut Lookup<'_>) -> Option<(i64, i64)> {
        self.constraints.iter().find_map(|c| match c {
            GraphConstraint::NumEdges(min, max) => {
                match (min.eval(lookup), max.eval(lookup)) {
                    (Ok(lo), Ok(hi)) => Some((lo, hi)),
                    _ => None,
                }
            }
            _ => None,
        })
    }

    /// The graph's node count, if its declared `NumNodes` constraint
    /// evaluates to a single value. Textual reading has no inline count
    /// marker other than this.
    pub fn unique_node_count(&self, lookup: &mut Lookup<'_>) -> Option<i64> {
        let (lo, hi) = self.node_bounds(lookup)?;
        (lo == hi).then_some(lo)
    }

    /// The graph's edge count, if its declared `NumEdges` constraint
    /// evaluates to a single value.
    pub fn unique_edge_count(&self, lookup: &mut Lookup<'_>) -> Option<i64> {
        let (lo, hi) = self.edge_bounds(lookup)?;
        (lo == hi).then_some(lo)
    }

    fn requires_simple(&self) -> (bool, bool) {
        let mut no_parallel = false;
        let mut loopless = false;
        for c in &self.constraints {
            match c {
                GraphConstraint::NoParallelEdges => no_parallel = true,
                GraphConstraint::Loopless => loopless = true,
                GraphConstraint::SimpleGraph => {
                    no_parallel = true;
                    loopless = true;
                }
                _ => {}
            }
        }
        (no_parallel, loopless)
    }

    fn requires_connected(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, GraphConstraint::Connected))
    }

    /// Checks `graph` against every declared constraint.
    pub fn validate_value(
        &self,
        graph: &Graph,
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        for c in &self.constraints {
            c.check(graph, lookup, peer_env)?;
        }
        Ok(())
    }

    /// Generates a graph satisfying the declared node/edge counts and
    /// shape constraints.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        let (node_lo, node_hi) = self
            .node_bounds(&mut resolver.generate_lookup())
            .ok_or_else(|| {
                SpecimenError::configuration(name, "Graph generation requires a NumNodes constraint")
            })?;
        if node_lo < 0 || node_hi < node_lo {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: format!("evaluated node-count range [{node_lo}, {node_hi}] is empty"),
                policy: RetryPolicy::Retry,
            }));
        }
        let num_nodes = resolver.random_between(node_lo, node_hi)? as usize;

        let (edge_lo, edge_hi) = self
            .edge_bounds(&mut resolver.generate_lookup())
            .ok_or_else(|| {
                SpecimenError::configuration(name, "Graph generation requires a NumEdges constraint")
            })?;
        if edge_lo < 0 || edge_hi < edge_lo {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: format!("evaluated edge-count range [{edge_lo}, {edge_hi}] is empty"),
                policy: RetryPolicy::Retry,
            }));
        }
        let num_edges = resolver.random_between(edge_lo, edge_hi)? as usize;

        let (no_parallel, loopless) = self.requires_simple();
        let connected = self.requires_connected();

        const GRAPH_RETRY_BUDGET: u32 = 1_000;
        for _ in 0..GRAPH_RETRY_BUDGET {
            let mut edges: Vec<Edge> = Vec::with_capacity(num_edges);
            let mut seen: std::collections::HashSet<(usize, usize)> = std::collections::HashSet::new();

            // Build a spanning structure first when connectivity is required,
            // so the random edges on top of it don't need to discover it by chance.
            if connected && num_nodes > 0 {
                for i in 1..num_nodes {
                    let j = resolver.random_below(i as i64)? as usize;
                    let e = Edge::new(i, j);
                    seen.insert(e.unordered());
                    edges.push(e);
                }
            }

            while edges.len() < num_edges {
                if num_nodes == 0 {
                    break;
                }
                let u = resolver.random_below(num_nodes as i64)? as usize;
                let v = resolver.random_below(num_nodes as i64)? as usize;
                if loopless && u == v {
                    continue;
                }
                let e = Edge::new(u, v);
                if no_parallel && !seen.insert(e.unordered()) {
                    continue;
                }
                if !no_parallel {
                    seen.insert(e.unordered());
                }
                edges.push(e);
            }

            let graph = Graph {
                num_nodes,
                edges,
                node_labels: None,
            };

            let mut lookup = resolver.generate_lookup();
            if self
                .validate_value(&graph, &mut lookup, &PeerEnv::new())
                .is_ok()
            {
                return Ok(Value::Graph(graph));
            }
        }

        Err(SpecimenError::Generation(GenerationError {
            name: name.to_string(),
            message: "exhausted retry budget finding a graph satisfying all constraints".to_string(),
            policy: RetryPolicy::Retry,
        }))
    }

    /// Validates an already-produced value.
    pub fn validate(&self, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        let graph = value.as_graph().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "Graph".to_string(),
        })?;
        self.validate_value(graph, &mut resolver.value_lookup(), &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// A small curated set of boundary values: the empty graph and a single
    /// isolated node.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        vec![
            Value::Graph(Graph::empty(0)),
            Value::Graph(Graph::empty(1)),
        ]
    }
}
