//! Include/exclude scoping of entity names.

use serde::{Deserialize, Serialize};

/// Decide whether `name` takes part in the run.
///
/// A non-empty include list must contain the name; a non-empty exclude list
/// must not. Exclude wins. Matching is exact and case-sensitive.
pub fn in_scope<S: AsRef<str>>(name: &str, include: &[S], exclude: &[S]) -> bool {
    if !include.is_empty() && !include.iter().any(|i| i.as_ref() == name) {
        return false;
    }
    !exclude.iter().any(|e| e.as_ref() == name)
}

/// Include and exclude lists for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ScopeFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn allows(&self, name: &str) -> bool {
        in_scope(name, self.include.as_slice(), self.exclude.as_slice())
    }
}
