//! Grant matrix: sparse (resource node, permission group) -> action flags.
//!
//! A missing cell means every flag is false.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use coursedesk_core::{GroupId, ResourceNodeId};

use crate::Action;

/// The five independent action flags of one matrix cell.
/// Omitted flags deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantFlags {
    #[serde(rename = "can_view")]
    pub view: bool,
    #[serde(rename = "can_create")]
    pub create: bool,
    #[serde(rename = "can_edit")]
    pub edit: bool,
    #[serde(rename = "can_delete")]
    pub delete: bool,
    #[serde(rename = "can_upload")]
    pub upload: bool,
}

impl GrantFlags {
    pub const NONE: GrantFlags = GrantFlags {
        view: false,
        create: false,
        edit: false,
        delete: false,
        upload: false,
    };

    pub const ALL: GrantFlags = GrantFlags {
        view: true,
        create: true,
        edit: true,
        delete: true,
        upload: true,
    };

    /// Exactly the flag for `action`; no flag implies another.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::Upload => self.upload,
        }
    }

    pub fn with(mut self, action: Action, allowed: bool) -> Self {
        match action {
            Action::View => self.view = allowed,
            Action::Create => self.create = allowed,
            Action::Edit => self.edit = allowed,
            Action::Delete => self.delete = allowed,
            Action::Upload => self.upload = allowed,
        }
        self
    }

    pub fn only(actions: &[Action]) -> Self {
        actions
            .iter()
            .fold(GrantFlags::NONE, |flags, &a| flags.with(a, true))
    }

    pub fn is_empty(&self) -> bool {
        *self == GrantFlags::NONE
    }
}

/// One stored matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub resource_id: ResourceNodeId,
    pub group_id: GroupId,
    #[serde(flatten)]
    pub flags: GrantFlags,
}

/// In-memory sparse matrix, at most one cell per (node, group) pair.
#[derive(Debug, Clone, Default)]
pub struct GrantMatrix {
    cells: HashMap<(ResourceNodeId, GroupId), GrantFlags>,
}

impl GrantMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cell, returning the previous flags.
    pub fn upsert(&mut self, grant: Grant) -> Option<GrantFlags> {
        self.cells
            .insert((grant.resource_id, grant.group_id), grant.flags)
    }

    pub fn lookup(&self, resource: ResourceNodeId, group: GroupId) -> Option<GrantFlags> {
        self.cells.get(&(resource, group)).copied()
    }

    pub fn remove(&mut self, resource: ResourceNodeId, group: GroupId) -> bool {
        self.cells.remove(&(resource, group)).is_some()
    }

    /// Cascade for a deleted resource node. Returns the number of cells dropped.
    pub fn remove_resource(&mut self, resource: ResourceNodeId) -> usize {
        let before = self.cells.len();
        self.cells.retain(|(r, _), _| *r != resource);
        before - self.cells.len()
    }

    /// Cascade for a deleted permission group. Returns the number of cells dropped.
    pub fn remove_group(&mut self, group: GroupId) -> usize {
        let before = self.cells.len();
        self.cells.retain(|(_, g), _| *g != group);
        before - self.cells.len()
    }

    pub fn row(&self, group: GroupId) -> Vec<Grant> {
        self.cells
            .iter()
            .filter(|((_, g), _)| *g == group)
            .map(|(&(resource_id, group_id), &flags)| Grant {
                resource_id,
                group_id,
                flags,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<Grant> for GrantMatrix {
    fn from_iter<T: IntoIterator<Item = Grant>>(iter: T) -> Self {
        let mut matrix = GrantMatrix::new();
        for grant in iter {
            matrix.upsert(grant);
        }
        matrix
    }
}
