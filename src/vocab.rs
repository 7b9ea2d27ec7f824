//! Class vocabulary: sorted, deduplicated names with dense 0-based ids.

use std::collections::BTreeMap;

/// An ordered, deduplicated class-name list with a stable name-to-id mapping.
///
/// Ids are dense integers starting at 0, assigned in sorted-name order. The
/// mapping is a pure function of the name set, so two runs over the same
/// corpus snapshot produce the same ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassVocabulary {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl ClassVocabulary {
    /// Build a vocabulary from an arbitrary name collection.
    ///
    /// Names are deduplicated and sorted before ids are assigned.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();

        let index = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();

        Self { names, index }
    }

    /// Build a vocabulary from names whose order is already fixed, e.g. a
    /// manifest's `names` list. No sorting or deduplication is applied.
    pub fn from_ordered(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();

        Self { names, index }
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check whether `candidate` is prefix-compatible with `reference`:
    /// the shorter vocabulary must be a positional prefix of the longer,
    /// so every index the two share maps to the same name. Extra classes
    /// are allowed only past the end of the shorter list.
    ///
    /// Returns the first conflicting candidate name, or `None` when
    /// compatible.
    pub fn index_conflict<'a>(
        reference: &Self,
        candidate: &'a Self,
    ) -> Option<&'a str> {
        reference
            .names
            .iter()
            .zip(&candidate.names)
            .find(|(reference_name, candidate_name)| reference_name != candidate_name)
            .map(|(_, candidate_name)| candidate_name.as_str())
    }
}
