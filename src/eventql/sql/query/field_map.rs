//! Per-scope field sets produced by exploration.

use serde::Serialize;
use std::collections::BTreeMap;

/// Which list of a [`FieldMap`] to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope<'a> {
    /// Every field referenced in the scope, regardless of target
    All,
    /// Fields that could not be attributed to a target
    Unknown,
    /// Fields of one target
    Target(&'a str),
}

/// Target name to sorted unique field names, plus the `ALL` and `UNKNOWN` buckets.
///
/// Serializes as `{"targets": {"TargetA": [...]}, "ALL": [...], "UNKNOWN": [...]}`.
/// Target lists sit under their own key, so a target named `ALL` or `UNKNOWN`
/// cannot clash with the buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMap {
    targets: BTreeMap<String, Vec<String>>,
    #[serde(rename = "ALL")]
    all: Vec<String>,
    #[serde(rename = "UNKNOWN")]
    unknown: Vec<String>,
}

impl FieldMap {
    pub(super) fn new(
        targets: BTreeMap<String, Vec<String>>,
        all: Vec<String>,
        unknown: Vec<String>,
    ) -> Self {
        Self {
            targets,
            all: sorted_unique(all),
            unknown: sorted_unique(unknown),
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        for fields in self.targets.values_mut() {
            let taken = std::mem::take(fields);
            *fields = sorted_unique(taken);
        }
        self
    }

    /// The requested list; `None` for a target this scope does not know.
    pub fn get(&self, scope: FieldScope<'_>) -> Option<&[String]> {
        match scope {
            FieldScope::All => Some(&self.all),
            FieldScope::Unknown => Some(&self.unknown),
            FieldScope::Target(name) => self.target(name),
        }
    }

    pub fn target(&self, name: &str) -> Option<&[String]> {
        self.targets.get(name).map(Vec::as_slice)
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn unknown(&self) -> &[String] {
        &self.unknown
    }

    /// Target keys, sorted. Includes outer targets merged into a subquery scope.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub(super) fn targets(&self) -> &BTreeMap<String, Vec<String>> {
        &self.targets
    }
}

fn sorted_unique(mut fields: Vec<String>) -> Vec<String> {
    fields.sort();
    fields.dedup();
    fields
}
