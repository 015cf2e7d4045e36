//! Constraints for [`crate::variable::graph::GraphVariable`].

use std::collections::BTreeSet;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::error::EvalError;
use crate::expr::Expr;
use crate::value::Graph;

/// A lookup function from peer variable name to its resolved `i64` value.
pub type Lookup<'a> = dyn FnMut(&str) -> Result<i64, EvalError> + 'a;

/// A single constraint on a [`crate::variable::graph::GraphVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphConstraint {
    /// `min <= num_nodes <= max`, both inclusive.
    NumNodes(Expr, Expr),
    /// `min <= num_edges <= max`, both inclusive.
    NumEdges(Expr, Expr),
    /// The graph must be connected (one component, `num_nodes >= 1`).
    Connected,
    /// No two edges may share the same unordered endpoint pair.
    NoParallelEdges,
    /// No edge may have `u == v`.
    Loopless,
    /// `NoParallelEdges && Loopless`.
    SimpleGraph,
    /// A user-supplied predicate.
    Custom(CustomConstraint<Graph>),
}

impl GraphConstraint {
    /// Checks `graph` against this constraint under the given environment.
    pub fn check(
        &self,
        graph: &Graph,
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        match self {
            GraphConstraint::NumNodes(min, max) => {
                let min = min.eval(lookup).map_err(|e| e.to_string())?;
                let max = max.eval(lookup).map_err(|e| e.to_string())?;
                let n = graph.num_nodes as i64;
                if n < min || n > max {
                    Err(format!(
                        "has node count (which is {n}) that is not between {min} and {max}"
                    ))
                } else {
                    Ok(())
                }
            }
            GraphConstraint::NumEdges(min, max) => {
                let min = min.eval(lookup).map_err(|e| e.to_string())?;
                let max = max.eval(lookup).map_err(|e| e.to_string())?;
                let m = graph.edges.len() as i64;
                if m < min || m > max {
                    Err(format!(
                        "has edge count (which is {m}) that is not between {min} and {max}"
                    ))
                } else {
                    Ok(())
                }
            }
            GraphConstraint::Connected => {
                if graph.is_connected() {
                    Ok(())
                } else {
                    Err("is not connected".to_string())
                }
            }
            GraphConstraint::NoParallelEdges => {
                if graph.has_parallel_edges() {
                    Err("has parallel edges".to_string())
                } else {
                    Ok(())
                }
            }
            GraphConstraint::Loopless => {
                if graph.has_loops() {
                    Err("has a self loop".to_string())
                } else {
                    Ok(())
                }
            }
            GraphConstraint::SimpleGraph => {
                if graph.is_simple() {
                    Ok(())
                } else {
                    Err("is not a simple graph".to_string())
                }
            }
            GraphConstraint::Custom(c) => c.check(graph, peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            GraphConstraint::NumNodes(min, max) => {
                format!("has node count between {min} and {max}")
            }
            GraphConstraint::NumEdges(min, max) => {
                format!("has edge count between {min} and {max}")
            }
            GraphConstraint::Connected => "is connected".to_string(),
            GraphConstraint::NoParallelEdges => "has no parallel edges".to_string(),
            GraphConstraint::Loopless => "has no self loops".to_string(),
            GraphConstraint::SimpleGraph => "is a simple graph".to_string(),
            GraphConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint's expressions reference.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            GraphConstraint::NumNodes(min, max) | GraphConstraint::NumEdges(min, max) => {
                let mut out = min.dependencies();
                out.extend(max.dependencies());
                out
            }
            GraphConstraint::Connected
            | GraphConstraint::NoParallelEdges
            | GraphConstraint::Loopless
            | GraphConstraint::SimpleGraph => BTreeSet::new(),
            GraphConstraint::Custom(c) => c.dependencies().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Edge;

    fn no_lookup() -> impl FnMut(&str) -> Result<i64, EvalError> {
        |name: &str| {
            Err(EvalError::VariableNotFound {
                name: name.to_string(),
            })
        }
    }

    #[test]
    fn connected_checks_components() {
        let c = GraphConstraint::Connected;
        let peer = PeerEnv::new();
        let mut g = Graph::empty(2);
        assert!(c.check(&g, &mut no_lookup(), &peer).is_err());
        g.edges.push(Edge::new(0, 1));
        assert!(c.check(&g, &mut no_lookup(), &peer).is_ok());
    }

    #[test]
    fn simple_graph_rejects_loops_and_parallels() {
        let c = GraphConstraint::SimpleGraph;
        let peer = PeerEnv::new();
        let mut g = Graph::empty(2);
        g.edges.push(Edge::new(0, 0));
        assert!(c.check(&g, &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn num_nodes_checks_bounds() {
        let c = GraphConstraint::NumNodes(Expr::parse("1").unwrap(), Expr::parse("5").unwrap());
        let peer = PeerEnv::new();
        assert!(c.check(&Graph::empty(3), &mut no_lookup(), &peer).is_ok());
        assert!(c.check(&Graph::empty(0), &mut no_lookup(), &peer).is_err());
    }
}
