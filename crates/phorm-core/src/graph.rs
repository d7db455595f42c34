//! Dependency graph and the cycle guard.
//!
//! Nodes are `"form.field"` string keys; an edge runs source -> target for
//! every active dependency of a kind that writes its target. Validation
//! and visibility rules never write, so they contribute no edges and a
//! rule may reference the very field it guards. The graph is built fresh
//! per check over the current dependency set plus one candidate -- it is a
//! structural view, never persisted.
//!
//! The acyclicity check is the single guarantee standing between this
//! design and unbounded recursion in the processor, so it runs over the
//! FULL active set: a cycle can close through forms unrelated to the
//! candidate's endpoints.

use std::collections::{HashMap, HashSet};

use crate::dependency::FormDependency;

/// Directed graph over `"form.field"` node keys.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from the active, target-writing dependencies in
    /// `deps`.
    pub fn from_dependencies<'a>(deps: impl IntoIterator<Item = &'a FormDependency>) -> Self {
        let mut graph = Self::new();
        for dep in deps {
            if dep.is_active && dep.kind.writes_target() {
                graph.add_edge(dep.source_key(), dep.target_key());
            }
        }
        graph
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.entry(from.into()).or_default().insert(to.into());
    }

    pub fn node_count(&self) -> usize {
        let mut nodes: HashSet<&str> = HashSet::new();
        for (from, tos) in &self.edges {
            nodes.insert(from);
            nodes.extend(tos.iter().map(String::as_str));
        }
        nodes.len()
    }

    /// Returns `true` if the graph contains a directed cycle.
    ///
    /// Iterative depth-first search with an explicit recursion stack, so a
    /// long dependency chain cannot overflow the call stack.
    pub fn has_cycle(&self) -> bool {
        enum Step<'a> {
            Enter(&'a str),
            Leave(&'a str),
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_stack: HashSet<&str> = HashSet::new();

        for start in self.edges.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }

            let mut stack = vec![Step::Enter(start.as_str())];
            while let Some(step) = stack.pop() {
                match step {
                    Step::Enter(node) => {
                        if !visited.insert(node) {
                            continue;
                        }
                        on_stack.insert(node);
                        stack.push(Step::Leave(node));
                        if let Some(neighbors) = self.edges.get(node) {
                            for next in neighbors {
                                if on_stack.contains(next.as_str()) {
                                    // Back edge: `next` is an ancestor of `node`.
                                    return true;
                                }
                                if !visited.contains(next.as_str()) {
                                    stack.push(Step::Enter(next.as_str()));
                                }
                            }
                        }
                    }
                    Step::Leave(node) => {
                        on_stack.remove(node);
                    }
                }
            }
        }

        false
    }
}

/// Returns `true` if adding `candidate` to the active dependency set would
/// create a cycle.
///
/// The candidate edge is added regardless of its active flag: a record
/// being created or re-activated must pass the guard before persistence.
/// A candidate of a non-writing kind contributes no edge and always
/// passes.
pub fn would_create_cycle(existing: &[FormDependency], candidate: &FormDependency) -> bool {
    if !candidate.kind.writes_target() {
        return false;
    }
    let mut graph = DependencyGraph::from_dependencies(
        existing.iter().filter(|d| d.id != candidate.id),
    );
    graph.add_edge(candidate.source_key(), candidate.target_key());
    graph.has_cycle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::DependencyKind;

    fn dep(src: &str, dst: &str) -> FormDependency {
        let (sf, sfd) = src.split_once('.').unwrap();
        let (tf, tfd) = dst.split_once('.').unwrap();
        FormDependency::new(DependencyKind::Value, sf, sfd, tf, tfd)
    }

    #[test]
    fn empty_graph_is_acyclic() {
        assert!(!DependencyGraph::new().has_cycle());
    }

    #[test]
    fn chain_is_acyclic() {
        let deps = [dep("a.f1", "b.f2"), dep("b.f2", "c.f3")];
        assert!(!DependencyGraph::from_dependencies(&deps).has_cycle());
    }

    #[test]
    fn closing_edge_is_rejected_but_branch_is_accepted() {
        // A.f1 -> B.f2 -> C.f3 exists. C.f3 -> A.f1 closes the loop;
        // C.f3 -> D.f1 does not.
        let existing = vec![dep("a.f1", "b.f2"), dep("b.f2", "c.f3")];
        assert!(would_create_cycle(&existing, &dep("c.f3", "a.f1")));
        assert!(!would_create_cycle(&existing, &dep("c.f3", "d.f1")));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        assert!(would_create_cycle(&[], &dep("a.f1", "a.f1")));
    }

    #[test]
    fn non_writing_kinds_are_exempt_from_the_guard() {
        let mut validation = dep("a.qty", "a.qty");
        validation.kind = DependencyKind::Validation;
        assert!(!would_create_cycle(&[], &validation));

        let mut visibility = dep("a.kind", "a.kind");
        visibility.kind = DependencyKind::Visibility;
        assert!(!would_create_cycle(&[], &visibility));

        // Stored validation rules contribute no edges either: a value
        // dependency back along a "validation edge" is still legal.
        let existing = vec![dep("a.f1", "b.f2"), {
            let mut d = dep("b.f2", "a.f1");
            d.kind = DependencyKind::Validation;
            d
        }];
        assert!(!would_create_cycle(&existing, &dep("b.f2", "c.f1")));
    }

    #[test]
    fn cycle_through_unrelated_forms_is_found() {
        // The cycle closes through intermediate forms that share nothing
        // with the candidate's own form pair except graph connectivity.
        let existing = vec![
            dep("a.f1", "m.x"),
            dep("m.x", "n.y"),
            dep("n.y", "o.z"),
            dep("o.z", "b.f9"),
        ];
        assert!(would_create_cycle(&existing, &dep("b.f9", "a.f1")));
    }

    #[test]
    fn inactive_dependencies_do_not_block() {
        let existing = vec![dep("a.f1", "b.f2").inactive()];
        assert!(!would_create_cycle(&existing, &dep("b.f2", "a.f1")));
    }

    #[test]
    fn updating_a_dependency_ignores_its_own_old_edge() {
        let mut existing = vec![dep("a.f1", "b.f2")];
        // Reversing the same record must not collide with its stored edge.
        let mut updated = existing[0].clone();
        updated.source_form_id = "b".into();
        updated.source_field_id = "f2".into();
        updated.target_form_id = "a".into();
        updated.target_field_id = "f1".into();
        assert!(!would_create_cycle(&existing, &updated));

        // But reversing it as a NEW record does collide.
        existing.push(dep("c.f1", "d.f1"));
        assert!(would_create_cycle(&existing, &dep("b.f2", "a.f1")));
    }

    #[test]
    fn diamond_is_acyclic() {
        let deps = [
            dep("a.f", "b.f"),
            dep("a.f", "c.f"),
            dep("b.f", "d.f"),
            dep("c.f", "d.f"),
        ];
        assert!(!DependencyGraph::from_dependencies(&deps).has_cycle());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut graph = DependencyGraph::new();
        for i in 0..50_000 {
            graph.add_edge(format!("f{i}.x"), format!("f{}.x", i + 1));
        }
        assert!(!graph.has_cycle());
        graph.add_edge("f50000.x", "f0.x");
        assert!(graph.has_cycle());
    }
}
