use dashmap::{DashMap, DashSet};

use super::SessionId;

/// Group membership: group -> sessions, session -> group.
///
/// A session belongs to at most one group; `join` replaces the previous one.
/// Never hold a `get()` guard on `group_to_sessions` while mutating that map,
/// both land on the same shard lock.
#[derive(Default)]
pub struct Presence {
    group_to_sessions: DashMap<String, DashSet<SessionId>>,
    session_to_group: DashMap<SessionId, String>,
}

impl Presence {
    pub fn new() -> Self {
        Self {
            group_to_sessions: DashMap::new(),
            session_to_group: DashMap::new(),
        }
    }

    /// Associate `session` with `group`. Returns the group it left, if it changed.
    pub fn join(&self, group: &str, session: SessionId) -> Option<String> {
        let prev = self.session_to_group.insert(session, group.to_string());
        let left = prev.filter(|p| p != group);
        if let Some(old) = &left {
            self.remove_member(old, session);
        }

        self.group_to_sessions
            .entry(group.to_string())
            .or_default()
            .insert(session);

        left
    }

    /// Drop the session's association. Returns the group it was in.
    pub fn leave(&self, session: SessionId) -> Option<String> {
        let (_, group) = self.session_to_group.remove(&session)?;
        self.remove_member(&group, session);
        Some(group)
    }

    pub fn group_of(&self, session: SessionId) -> Option<String> {
        self.session_to_group.get(&session).map(|g| g.value().clone())
    }

    /// Snapshot of the group's members, taken under the group's shard lock.
    pub fn members(&self, group: &str) -> Vec<SessionId> {
        self.group_to_sessions
            .get(group)
            .map(|set| set.iter().map(|s| *s.key()).collect())
            .unwrap_or_default()
    }

    pub fn group_count(&self) -> usize {
        self.group_to_sessions.len()
    }

    fn remove_member(&self, group: &str, session: SessionId) {
        let now_empty = match self.group_to_sessions.get(group) {
            Some(set) => {
                set.remove(&session);
                set.is_empty()
            }
            None => false,
        };
        if now_empty {
            // a concurrent join may have refilled the set in between
            self.group_to_sessions.remove_if(group, |_, set| set.is_empty());
        }
    }
}
