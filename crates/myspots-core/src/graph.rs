//! Category graph construction and root resolution
//!
//! Categories arrive from the record store as a flat list where each record
//! optionally names a parent. This module builds an explicit adjacency
//! structure (node table plus child-to-parent map) and resolves any category
//! to its root ancestor with a bounded iterative walk, so a malformed cyclic
//! input fails with an error instead of hanging.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::CategoryRecord;

/// Reserved bucket for places that reference no categories.
/// Never a real record id.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Errors from building or walking the category graph
///
/// All of these are fatal for an export run; a partial document is never
/// emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A place or category references a category id not in the graph
    #[error("unknown category id: {0}")]
    UnknownCategory(String),

    /// A parent chain did not terminate within the node-count bound
    #[error("cycle in category graph: parent chain from '{0}' does not terminate")]
    CycleDetected(String),

    /// A category names a parent that is not among the loaded categories
    #[error("category '{child}' references parent '{parent}' which was not loaded")]
    OrphanParentReference { child: String, parent: String },

    /// The same category id appeared more than once in the input
    #[error("duplicate category id: {0}")]
    DuplicateCategory(String),
}

/// A category node: display name plus optional icon code
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub name: String,
    pub icon_code: Option<String>,
}

/// In-memory category tree, rebuilt from the record store on every run
///
/// Edges run parent-to-child conceptually, but the only traversal the
/// exporter needs is child-to-root, so the graph stores a child-to-parent
/// map. Input order is retained for deterministic style emission.
#[derive(Debug, Clone)]
pub struct CategoryGraph {
    nodes: HashMap<String, CategoryNode>,
    parent: HashMap<String, String>,
    order: Vec<String>,
}

impl CategoryGraph {
    /// Build the graph from flat category records
    ///
    /// Fails on a duplicate id (the single-parent invariant would otherwise
    /// be ambiguous) and on a parent reference naming an unloaded category.
    pub fn build(records: Vec<CategoryRecord>) -> Result<Self, GraphError> {
        let mut nodes = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());
        for record in &records {
            let node = CategoryNode {
                name: record.name.clone(),
                icon_code: record.icon_code.clone(),
            };
            if nodes.insert(record.id.clone(), node).is_some() {
                return Err(GraphError::DuplicateCategory(record.id.clone()));
            }
            order.push(record.id.clone());
        }

        let mut parent = HashMap::new();
        for record in records {
            if let Some(parent_id) = record.parent_id {
                if !nodes.contains_key(&parent_id) {
                    return Err(GraphError::OrphanParentReference {
                        child: record.id,
                        parent: parent_id,
                    });
                }
                parent.insert(record.id, parent_id);
            }
        }

        Ok(Self {
            nodes,
            parent,
            order,
        })
    }

    /// Number of categories in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the graph has no categories
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by record id
    pub fn node(&self, id: &str) -> Option<&CategoryNode> {
        self.nodes.get(id)
    }

    /// Iterate nodes in input order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryNode)> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|node| (id.as_str(), node)))
    }

    /// Display name for a resolved root id
    ///
    /// The `UNCATEGORIZED` sentinel maps to its literal name.
    pub fn display_name<'a>(&'a self, root_id: &'a str) -> &'a str {
        if root_id == UNCATEGORIZED {
            return UNCATEGORIZED;
        }
        self.nodes
            .get(root_id)
            .map(|node| node.name.as_str())
            .unwrap_or(root_id)
    }

    /// Walk parent links from `id` to the root ancestor
    ///
    /// The walk is capped at the node count: an acyclic chain terminates in
    /// at most `len - 1` hops, so exceeding the cap means a cycle.
    pub fn resolve_root<'a>(&'a self, id: &'a str) -> Result<&'a str, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownCategory(id.to_string()));
        }
        let mut current = id;
        for _ in 0..self.nodes.len() {
            match self.parent.get(current) {
                Some(parent_id) => current = parent_id.as_str(),
                None => return Ok(current),
            }
        }
        Err(GraphError::CycleDetected(id.to_string()))
    }

    /// Resolve the set of root categories for a place
    ///
    /// An empty reference list resolves to the `UNCATEGORIZED` sentinel,
    /// never to an empty set. Roots are deduplicated preserving first-seen
    /// order, which keeps folder creation order stable for stable input.
    pub fn resolve_roots(&self, category_ids: &[String]) -> Result<Vec<String>, GraphError> {
        if category_ids.is_empty() {
            return Ok(vec![UNCATEGORIZED.to_string()]);
        }
        let mut roots: Vec<String> = Vec::new();
        for id in category_ids {
            let root = self.resolve_root(id)?;
            if !roots.iter().any(|seen| seen == root) {
                roots.push(root.to_string());
            }
        }
        Ok(roots)
    }

    /// Root-first chain of category ids from the root ancestor down to `id`
    ///
    /// Used for hierarchical folder nesting. Same bounds and errors as
    /// [`resolve_root`](Self::resolve_root).
    pub fn path_to_root<'a>(&'a self, id: &'a str) -> Result<Vec<&'a str>, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownCategory(id.to_string()));
        }
        let mut path = vec![id];
        let mut current = id;
        for _ in 0..self.nodes.len() {
            match self.parent.get(current) {
                Some(parent_id) => {
                    current = parent_id.as_str();
                    path.push(current);
                }
                None => {
                    path.reverse();
                    return Ok(path);
                }
            }
        }
        Err(GraphError::CycleDetected(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, name: &str, parent_id: Option<&str>) -> CategoryRecord {
        CategoryRecord {
            id: id.to_string(),
            name: name.to_string(),
            icon_code: None,
            parent_id: parent_id.map(|p| p.to_string()),
        }
    }

    fn chain_graph() -> CategoryGraph {
        // A (root) <- B <- C
        CategoryGraph::build(vec![
            category("A", "Food", None),
            category("B", "Bakery", Some("A")),
            category("C", "Sourdough", Some("B")),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_and_lookup() {
        let graph = chain_graph();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node("B").unwrap().name, "Bakery");
        assert!(graph.node("missing").is_none());
    }

    #[test]
    fn test_resolve_root_chain() {
        let graph = chain_graph();
        assert_eq!(graph.resolve_root("C").unwrap(), "A");
        assert_eq!(graph.resolve_root("B").unwrap(), "A");
        assert_eq!(graph.resolve_root("A").unwrap(), "A");
    }

    #[test]
    fn test_resolve_roots_empty_is_uncategorized() {
        let graph = chain_graph();
        let roots = graph.resolve_roots(&[]).unwrap();
        assert_eq!(roots, vec![UNCATEGORIZED.to_string()]);
    }

    #[test]
    fn test_resolve_roots_dedups_shared_root() {
        let graph = chain_graph();
        let roots = graph
            .resolve_roots(&["B".to_string(), "C".to_string()])
            .unwrap();
        assert_eq!(roots, vec!["A".to_string()]);
    }

    #[test]
    fn test_resolve_roots_two_distinct_roots() {
        let graph = CategoryGraph::build(vec![
            category("A", "Food", None),
            category("B", "Bakery", Some("A")),
            category("D", "Parks", None),
        ])
        .unwrap();
        let roots = graph
            .resolve_roots(&["B".to_string(), "D".to_string()])
            .unwrap();
        assert_eq!(roots, vec!["A".to_string(), "D".to_string()]);
    }

    #[test]
    fn test_unknown_category() {
        let graph = chain_graph();
        assert_eq!(
            graph.resolve_roots(&["nope".to_string()]),
            Err(GraphError::UnknownCategory("nope".to_string()))
        );
    }

    #[test]
    fn test_cycle_detected() {
        let graph = CategoryGraph::build(vec![
            category("A", "Food", Some("B")),
            category("B", "Bakery", Some("A")),
        ])
        .unwrap();
        assert_eq!(
            graph.resolve_root("A"),
            Err(GraphError::CycleDetected("A".to_string()))
        );
    }

    #[test]
    fn test_self_loop_detected() {
        let graph = CategoryGraph::build(vec![category("A", "Food", Some("A"))]).unwrap();
        assert_eq!(
            graph.resolve_root("A"),
            Err(GraphError::CycleDetected("A".to_string()))
        );
    }

    #[test]
    fn test_orphan_parent_is_fatal() {
        let result = CategoryGraph::build(vec![category("B", "Bakery", Some("ghost"))]);
        assert_eq!(
            result.err(),
            Some(GraphError::OrphanParentReference {
                child: "B".to_string(),
                parent: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let result = CategoryGraph::build(vec![
            category("A", "Food", None),
            category("A", "Parks", None),
        ]);
        assert_eq!(result.err(), Some(GraphError::DuplicateCategory("A".to_string())));
    }

    #[test]
    fn test_path_to_root_is_root_first() {
        let graph = chain_graph();
        assert_eq!(graph.path_to_root("C").unwrap(), vec!["A", "B", "C"]);
        assert_eq!(graph.path_to_root("A").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_iter_preserves_input_order() {
        let graph = chain_graph();
        let ids: Vec<&str> = graph.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_display_name() {
        let graph = chain_graph();
        assert_eq!(graph.display_name("A"), "Food");
        assert_eq!(graph.display_name(UNCATEGORIZED), "Uncategorized");
    }

    #[test]
    fn test_deep_chain_terminates() {
        // every node's root-walk terminates at a parentless node
        let mut records = vec![category("n0", "n0", None)];
        for i in 1..100 {
            records.push(category(
                &format!("n{}", i),
                &format!("n{}", i),
                Some(&format!("n{}", i - 1)),
            ));
        }
        let graph = CategoryGraph::build(records).unwrap();
        assert_eq!(graph.resolve_root("n99").unwrap(), "n0");
    }
}
