//! Cross-mode summaries over union and intersection results.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::extract::MincomView;

/// Symbiont roles across every optimal community.
///
/// Only meaningful when union and intersection were computed against the
/// same optimum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbiontRoles {
    /// Members of at least one optimal community.
    pub keystone: BTreeSet<String>,
    /// Members of every optimal community.
    pub essential: BTreeSet<String>,
    /// Keystone but not essential.
    pub alternative: BTreeSet<String>,
}

impl SymbiontRoles {
    #[must_use]
    pub fn derive(union: &MincomView, intersection: &MincomView) -> Self {
        Self::from_sets(
            union.bacteria.iter().cloned().collect(),
            intersection.bacteria.iter().cloned().collect(),
        )
    }

    #[must_use]
    pub fn from_sets(union: BTreeSet<String>, intersection: BTreeSet<String>) -> Self {
        let alternative = union.difference(&intersection).cloned().collect();
        Self {
            keystone: union,
            essential: intersection,
            alternative,
        }
    }
}
