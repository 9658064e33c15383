use cosmet_core::contracts::TaxonCandidate;
use cosmet_core::shelf_life::ShelfLifeRule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

mod seed;

pub use seed::seed_default;

pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("unknown taxon id {0}")]
    UnknownTaxon(i64),
    #[error("unknown parent id {0}")]
    UnknownParent(i64),
    #[error("duplicate taxon id {0}")]
    DuplicateTaxon(i64),
    #[error("taxon {0} cannot be moved under its own subtree")]
    ParentCycle(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonNode {
    pub id: i64,
    pub name: String,
    pub parent: Option<i64>,
    /// 0 for roots; parent depth + 1 otherwise. Derived, never set directly.
    pub depth: u32,
    /// Root-to-node breadcrumb joined by " > ". Derived, never set directly.
    pub full_path: String,
    pub shelf_life: ShelfLifeRule,
}

impl TaxonNode {
    pub fn candidate(&self) -> TaxonCandidate {
        TaxonCandidate::new(self.id, self.name.clone(), self.full_path.clone())
    }
}

/// In-memory arena of category nodes keyed by stable id. Reads are lock-free
/// (`&self`); structural edits go through `&mut self`, so a writer is
/// exclusive and derived fields are refreshed before any reader can observe
/// the change.
#[derive(Debug, Default, Clone)]
pub struct TaxonomyStore {
    nodes: BTreeMap<i64, TaxonNode>,
}

impl TaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&TaxonNode> {
        self.nodes.get(&id)
    }

    pub fn insert(
        &mut self,
        id: i64,
        name: impl Into<String>,
        parent: Option<i64>,
        shelf_life: ShelfLifeRule,
    ) -> Result<(), TaxonomyError> {
        if self.nodes.contains_key(&id) {
            return Err(TaxonomyError::DuplicateTaxon(id));
        }
        let name = name.into();
        let (depth, full_path) = self.derive_fields(parent, name.clone())?;
        self.nodes.insert(
            id,
            TaxonNode {
                id,
                name,
                parent,
                depth,
                full_path,
                shelf_life,
            },
        );
        Ok(())
    }

    /// Children of `parent` (roots for `None`), ordered by name then id.
    pub fn children(&self, parent: Option<i64>) -> Result<Vec<&TaxonNode>, TaxonomyError> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(TaxonomyError::UnknownParent(parent_id));
            }
        }
        let mut out = self
            .nodes
            .values()
            .filter(|node| node.parent == parent)
            .collect::<Vec<_>>();
        out.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
        Ok(out)
    }

    pub fn is_leaf(&self, id: i64) -> Result<bool, TaxonomyError> {
        if !self.nodes.contains_key(&id) {
            return Err(TaxonomyError::UnknownTaxon(id));
        }
        Ok(!self.nodes.values().any(|node| node.parent == Some(id)))
    }

    /// Root-to-node chain, inclusive.
    pub fn ancestors(&self, id: i64) -> Result<Vec<&TaxonNode>, TaxonomyError> {
        let mut chain = Vec::new();
        let mut cursor = Some(self.require(id)?);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = match node.parent {
                Some(parent_id) => Some(self.require(parent_id)?),
                None => None,
            };
        }
        chain.reverse();
        Ok(chain)
    }

    /// All ids in the subtree rooted at `id`, the root included, in BFS
    /// order. Iterative on purpose: tree depth is caller data and recursion
    /// would risk the stack on pathological chains.
    pub fn descendants(&self, id: i64) -> Result<Vec<i64>, TaxonomyError> {
        self.require(id)?;
        let mut children_of: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent {
                children_of.entry(parent_id).or_default().push(node.id);
            }
        }

        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            out.push(current);
            if let Some(children) = children_of.get(&current) {
                queue.extend(children.iter().copied());
            }
        }
        Ok(out)
    }

    /// Re-attach `id` under `new_parent` and refresh depth/full_path for the
    /// node and every descendant. The refresh is part of the operation, not
    /// an optimization: full_path embeds ancestor names.
    pub fn set_parent(&mut self, id: i64, new_parent: Option<i64>) -> Result<(), TaxonomyError> {
        self.require(id)?;
        if let Some(parent_id) = new_parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(TaxonomyError::UnknownParent(parent_id));
            }
            if self.descendants(id)?.contains(&parent_id) {
                return Err(TaxonomyError::ParentCycle(id));
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = new_parent;
        }
        self.refresh_subtree(id)
    }

    /// Rename a node. Refreshes the subtree for the same reason as
    /// `set_parent`.
    pub fn rename(&mut self, id: i64, name: impl Into<String>) -> Result<(), TaxonomyError> {
        self.require(id)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = name.into();
        }
        self.refresh_subtree(id)
    }

    pub fn set_shelf_life(&mut self, id: i64, rule: ShelfLifeRule) -> Result<(), TaxonomyError> {
        self.require(id)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.shelf_life = rule;
        }
        Ok(())
    }

    /// Cascade delete: removes the node and its whole subtree.
    pub fn remove(&mut self, id: i64) -> Result<usize, TaxonomyError> {
        let doomed = self.descendants(id)?;
        for node_id in &doomed {
            self.nodes.remove(node_id);
        }
        Ok(doomed.len())
    }

    /// Snapshot of every leaf in the canonical candidate shape, breadcrumbs
    /// included, ordered by path then id. This is the only form the
    /// classification pipeline sees.
    pub fn leaf_candidates(&self) -> Vec<TaxonCandidate> {
        let mut has_children: BTreeMap<i64, bool> = BTreeMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent {
                has_children.insert(parent_id, true);
            }
        }
        let mut out = self
            .nodes
            .values()
            .filter(|node| !has_children.get(&node.id).copied().unwrap_or(false))
            .map(TaxonNode::candidate)
            .collect::<Vec<_>>();
        out.sort_by(|left, right| left.path.cmp(&right.path).then(left.id.cmp(&right.id)));
        out
    }

    fn require(&self, id: i64) -> Result<&TaxonNode, TaxonomyError> {
        self.nodes.get(&id).ok_or(TaxonomyError::UnknownTaxon(id))
    }

    fn derive_fields(
        &self,
        parent: Option<i64>,
        name: String,
    ) -> Result<(u32, String), TaxonomyError> {
        match parent {
            None => Ok((0, name)),
            Some(parent_id) => {
                let parent_node = self
                    .nodes
                    .get(&parent_id)
                    .ok_or(TaxonomyError::UnknownParent(parent_id))?;
                Ok((
                    parent_node.depth + 1,
                    format!("{}{PATH_SEPARATOR}{name}", parent_node.full_path),
                ))
            }
        }
    }

    fn refresh_subtree(&mut self, id: i64) -> Result<(), TaxonomyError> {
        for node_id in self.descendants(id)? {
            let (parent, name) = {
                let node = self.require(node_id)?;
                (node.parent, node.name.clone())
            };
            let (depth, full_path) = self.derive_fields(parent, name)?;
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.depth = depth;
                node.full_path = full_path;
            }
        }
        Ok(())
    }
}
