//! Resource tree: the hierarchy of access-controlled nodes (menu entries).
//!
//! Pure data. [`ResourceTree::new`] checks the forest invariants once so the
//! resolver and the navigation projector can rely on them afterwards:
//! - ids are unique
//! - url-paths are unique (they are the resolver's join key)
//! - every parent exists
//! - every ancestor chain terminates (no cycles)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coursedesk_core::{DomainError, ResourceNodeId};

/// Normalised url-path of a resource node (no leading/trailing slashes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlPath(String);

impl UrlPath {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = raw.as_ref().trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(DomainError::validation("url path cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "url path '{trimmed}' contains whitespace"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UrlPath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UrlPath::new(value)
    }
}

impl From<UrlPath> for String {
    fn from(value: UrlPath) -> Self {
        value.0
    }
}

impl core::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An addressable unit of functionality subject to access control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: ResourceNodeId,
    pub url_path: UrlPath,
    pub parent_id: Option<ResourceNodeId>,
    pub label: String,
    pub icon: Option<String>,
    pub position: i32,
}

impl ResourceNode {
    pub fn new(
        id: ResourceNodeId,
        url_path: UrlPath,
        parent_id: Option<ResourceNodeId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            url_path,
            parent_id,
            label: label.into(),
            icon: None,
            position: 0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate resource node id {0}")]
    DuplicateId(ResourceNodeId),

    #[error("duplicate url path '{0}'")]
    DuplicatePath(UrlPath),

    #[error("resource node {node} references unknown parent {parent}")]
    UnknownParent {
        node: ResourceNodeId,
        parent: ResourceNodeId,
    },

    #[error("resource node {0} is part of a parent cycle")]
    Cycle(ResourceNodeId),
}

/// Validated resource forest. Sibling order is the input order.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    by_id: HashMap<ResourceNodeId, usize>,
    by_path: HashMap<UrlPath, usize>,
    children: HashMap<ResourceNodeId, Vec<usize>>,
    roots: Vec<usize>,
}

impl ResourceTree {
    pub fn new(nodes: Vec<ResourceNode>) -> Result<Self, TreeError> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut by_path = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id, idx).is_some() {
                return Err(TreeError::DuplicateId(node.id));
            }
            if by_path.insert(node.url_path.clone(), idx).is_some() {
                return Err(TreeError::DuplicatePath(node.url_path.clone()));
            }
        }

        let mut children: HashMap<ResourceNodeId, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            match node.parent_id {
                Some(parent) if !by_id.contains_key(&parent) => {
                    return Err(TreeError::UnknownParent {
                        node: node.id,
                        parent,
                    });
                }
                Some(parent) => children.entry(parent).or_default().push(idx),
                None => roots.push(idx),
            }
        }

        // Walk each chain upwards; revisiting a node means the chain never reaches a root.
        for node in &nodes {
            let mut seen = HashSet::new();
            let mut cursor = Some(node.id);
            while let Some(id) = cursor {
                if !seen.insert(id) {
                    return Err(TreeError::Cycle(node.id));
                }
                cursor = nodes[by_id[&id]].parent_id;
            }
        }

        Ok(Self {
            nodes,
            by_id,
            by_path,
            children,
            roots,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ResourceNodeId) -> Option<&ResourceNode> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn by_path(&self, path: &UrlPath) -> Option<&ResourceNode> {
        self.by_path.get(path).map(|&idx| &self.nodes[idx])
    }

    pub fn roots(&self) -> impl Iterator<Item = &ResourceNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn children(&self, id: ResourceNodeId) -> impl Iterator<Item = &ResourceNode> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.nodes[idx])
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: ResourceNodeId) -> Vec<&ResourceNode> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|n| n.parent_id);
        while let Some(parent) = cursor.and_then(|p| self.get(p)) {
            out.push(parent);
            cursor = parent.parent_id;
        }
        out
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }
}
