//! Per-run lookup cache for reference data.
//!
//! Built from four bulk reads at the start of each run, consulted for every
//! row, and thrown away with the run. Never persisted and never shared, so
//! there is nothing to invalidate — at worst a run races a concurrent
//! reference edit and resolves against a snapshot that is seconds stale.

use std::collections::HashMap;

use taskforge_core::types::DbId;

use crate::store::{NamedRef, ProjectRef, ReferenceReader, StoreError};

/// Status used when a row names no status or an unknown one. Falls back to
/// the first listed status when no status carries this name.
pub const DEFAULT_STATUS_NAME: &str = "to do";

/// Name -> id maps for everything a work item row can reference.
#[derive(Debug)]
pub struct LookupCache {
    statuses: HashMap<String, DbId>,
    priorities: HashMap<String, DbId>,
    item_types: HashMap<String, DbId>,
    projects_by_key: HashMap<String, DbId>,
    projects_by_name: HashMap<String, DbId>,
    default_status: Option<DbId>,
    default_item_type: Option<DbId>,
}

impl LookupCache {
    /// Load every reference table once.
    pub async fn build<S>(store: &S) -> Result<Self, StoreError>
    where
        S: ReferenceReader + ?Sized,
    {
        let statuses = store.list_statuses().await?;
        let priorities = store.list_priorities().await?;
        let item_types = store.list_item_types().await?;
        let projects = store.list_projects().await?;
        Ok(Self::from_reference_data(
            statuses, priorities, item_types, projects,
        ))
    }

    /// Pure assembly from already-fetched reference rows.
    pub fn from_reference_data(
        statuses: Vec<NamedRef>,
        priorities: Vec<NamedRef>,
        item_types: Vec<NamedRef>,
        projects: Vec<ProjectRef>,
    ) -> Self {
        let default_status = statuses
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(DEFAULT_STATUS_NAME))
            .or_else(|| statuses.first())
            .map(|s| s.id);
        let default_item_type = item_types.first().map(|t| t.id);

        let mut projects_by_key = HashMap::new();
        let mut projects_by_name = HashMap::new();
        for p in &projects {
            projects_by_key.insert(p.key.to_lowercase(), p.id);
            projects_by_name.insert(p.name.to_lowercase(), p.id);
        }

        Self {
            statuses: name_map(statuses),
            priorities: name_map(priorities),
            item_types: name_map(item_types),
            projects_by_key,
            projects_by_name,
            default_status,
            default_item_type,
        }
    }

    /// Resolve a status name. Unknown or missing names coerce silently to
    /// the default; `None` only when the status table is empty.
    pub fn resolve_status(&self, name: Option<&str>) -> Option<DbId> {
        match name {
            Some(n) => self
                .statuses
                .get(&n.to_lowercase())
                .copied()
                .or(self.default_status),
            None => self.default_status,
        }
    }

    /// Resolve an item type name, coercing to the first listed type.
    pub fn resolve_item_type(&self, name: Option<&str>) -> Option<DbId> {
        match name {
            Some(n) => self
                .item_types
                .get(&n.to_lowercase())
                .copied()
                .or(self.default_item_type),
            None => self.default_item_type,
        }
    }

    /// Resolve a priority name. Priorities have no default: unknown or
    /// missing means the item simply gets none.
    pub fn resolve_priority(&self, name: Option<&str>) -> Option<DbId> {
        name.and_then(|n| self.priorities.get(&n.to_lowercase()).copied())
    }

    /// Resolve a project reference, trying key before name. Projects are a
    /// required relationship, so the caller turns `None` into a row error
    /// instead of a default.
    pub fn resolve_project(&self, reference: &str) -> Option<DbId> {
        let needle = reference.to_lowercase();
        self.projects_by_key
            .get(&needle)
            .or_else(|| self.projects_by_name.get(&needle))
            .copied()
    }
}

fn name_map(refs: Vec<NamedRef>) -> HashMap<String, DbId> {
    refs.into_iter()
        .map(|r| (r.name.to_lowercase(), r.id))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
