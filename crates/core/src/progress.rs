//! Per-user navigation state: where a user was last, and which pages they
//! have finished.

use std::collections::HashMap;

use serde::Serialize;

use crate::clock::MonotonicClock;
use crate::hierarchy::Hierarchy;
use crate::section::Section;
use crate::types::{DbId, Timestamp, UserId};

/// Conventional page status values. Any other string is stored as given.
pub const STATUS_INCOMPLETE: &str = "incomplete";
pub const STATUS_COMPLETE: &str = "complete";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserVisit {
    pub user_id: UserId,
    pub section_id: DbId,
    pub last_visited: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageVisit {
    pub user_id: UserId,
    pub section_id: DbId,
    pub status: String,
    pub updated_at: Timestamp,
}

/// In-memory visit and status records, one of each per (user, section).
#[derive(Debug, Default)]
pub struct ProgressTracker {
    visits: HashMap<(UserId, DbId), UserVisit>,
    pages: HashMap<(UserId, DbId), PageVisit>,
    clock: MonotonicClock,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `user` is looking at `section` now.
    pub fn record_visit(&mut self, user_id: UserId, section_id: DbId) -> &UserVisit {
        let now = self.clock.now();
        tracing::debug!(user_id, section_id, "Visit recorded");
        let visit = self
            .visits
            .entry((user_id, section_id))
            .or_insert_with(|| UserVisit {
                user_id,
                section_id,
                last_visited: now,
            });
        visit.last_visited = now;
        visit
    }

    pub fn last_visit(&self, user_id: UserId, section_id: DbId) -> Option<&UserVisit> {
        self.visits.get(&(user_id, section_id))
    }

    /// The section of `hierarchy` the user visited most recently, or the
    /// root if they have not visited any.
    pub fn current_section<'h>(&self, hierarchy: &'h Hierarchy, user_id: UserId) -> &'h Section {
        self.visits
            .values()
            .filter(|v| v.user_id == user_id)
            .filter_map(|v| hierarchy.section(v.section_id).map(|s| (v.last_visited, s)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, s)| s)
            .unwrap_or_else(|| hierarchy.root())
    }

    /// Path of [`ProgressTracker::current_section`].
    pub fn current_location(&self, hierarchy: &Hierarchy, user_id: UserId) -> String {
        let section = self.current_section(hierarchy, user_id);
        hierarchy.path(section.id).unwrap_or_default()
    }

    pub fn record_page_status(
        &mut self,
        user_id: UserId,
        section_id: DbId,
        status: impl Into<String>,
    ) -> &PageVisit {
        let now = self.clock.now();
        let status = status.into();
        tracing::debug!(user_id, section_id, status = %status, "Page status recorded");
        let page = self
            .pages
            .entry((user_id, section_id))
            .or_insert_with(|| PageVisit {
                user_id,
                section_id,
                status: String::new(),
                updated_at: now,
            });
        page.status = status;
        page.updated_at = now;
        page
    }

    pub fn status(&self, user_id: UserId, section_id: DbId) -> Option<&str> {
        self.pages
            .get(&(user_id, section_id))
            .map(|p| p.status.as_str())
    }

    /// A section is open to a user once the section before it in reading
    /// order is complete. The first section is always open.
    pub fn is_unlocked(&self, hierarchy: &Hierarchy, user_id: UserId, section_id: DbId) -> bool {
        match hierarchy.previous(section_id) {
            None => true,
            Some(previous) => self.status(user_id, previous.id) == Some(STATUS_COMPLETE),
        }
    }

    /// Drop every record that refers to one of `section_ids`.
    pub fn forget_sections(&mut self, section_ids: &[DbId]) {
        self.visits.retain(|(_, s), _| !section_ids.contains(s));
        self.pages.retain(|(_, s), _| !section_ids.contains(s));
    }
}
