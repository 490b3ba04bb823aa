//! The permanent set of targets that turned hostile.

use indexmap::IndexSet;

use crate::types::TargetId;

/// Insertion-ordered, append-only set of hostile targets.
///
/// Membership is monotonic for the life of the process: there is no removal.
#[derive(Debug, Clone, Default)]
pub struct HostilityRoster {
    members: IndexSet<TargetId>,
}

impl HostilityRoster {
    /// An empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. Returns `false` if it was already present.
    pub fn insert(&mut self, target: TargetId) -> bool {
        self.members.insert(target)
    }

    /// Whether the target has turned hostile before.
    #[must_use]
    pub fn contains(&self, target: &TargetId) -> bool {
        self.members.contains(target)
    }

    /// Hostile targets in the order they turned.
    pub fn iter(&self) -> indexmap::set::Iter<'_, TargetId> {
        self.members.iter()
    }

    /// Number of hostile targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nobody has turned hostile yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<'a> IntoIterator for &'a HostilityRoster {
    type Item = &'a TargetId;
    type IntoIter = indexmap::set::Iter<'a, TargetId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
