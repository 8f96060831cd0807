use crate::graph::{Graph, GroupRef, Node, NodeId};
use crate::{CompileError, CompileResult};
use std::collections::HashMap;

/// Resolves references between nodes of an expression graph.
///
/// Back-references and repetitions of capture groups name their group by
/// index or by name. Linking replaces those names with the [`NodeId`] of the
/// group definition so the matcher never has to search for it. Linking is
/// idempotent, and it is all-or-nothing: when any reference fails to resolve
/// the graph is left untouched.
pub struct Linker {
    by_index: HashMap<u32, NodeId>,
    by_name: HashMap<String, NodeId>,
}

impl Linker {
    /// Create a new linker
    pub fn new() -> Self {
        Self {
            by_index: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Link every reference reachable from the root of `graph`. Returns the
    /// number of references that were resolved.
    pub fn link(mut self, graph: &mut Graph) -> CompileResult<usize> {
        let reachable = graph.reachable();
        self.collect_groups(graph, &reachable);

        let mut links = Vec::new();
        for &id in &reachable {
            let target = match graph.node(id) {
                Node::Repeat(rep) => rep.capture.as_ref(),
                Node::BackRef(backref) => Some(&backref.target),
                _ => None,
            };
            if let Some(target) = target {
                links.push((id, self.resolve(target)?));
            }
        }

        for &(id, group) in &links {
            match graph.node_mut(id) {
                Node::Repeat(rep) => rep.group = Some(group),
                Node::BackRef(backref) => backref.group = Some(group),
                other => {
                    return Err(CompileError::Internal(format!(
                        "node {} changed kind while linking: {:?}",
                        id, other
                    )))
                }
            }
        }

        debug!(
            "linked {} references against {} capture groups",
            links.len(),
            self.by_index.len()
        );
        Ok(links.len())
    }

    /// Record the definition site of every capture group. When an index or a
    /// name is defined twice the first definition in match order wins.
    fn collect_groups(&mut self, graph: &Graph, reachable: &[NodeId]) {
        for &id in reachable {
            if let Node::Group(group) = graph.node(id) {
                self.by_index.entry(group.index).or_insert(id);
                if let Some(name) = &group.name {
                    self.by_name.entry(name.clone()).or_insert(id);
                }
            }
        }
    }

    fn resolve(&self, target: &GroupRef) -> CompileResult<NodeId> {
        let found = match target {
            GroupRef::Index(index) => self.by_index.get(index),
            GroupRef::Name(name) => self.by_name.get(name),
        };
        found
            .copied()
            .ok_or_else(|| CompileError::UnresolvedReference(target.clone()))
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}
