//! Named outputs of a user function, handed to a destination plugin.

use crate::value::Value;

/// One named output.
#[derive(Debug, Clone)]
pub struct NamedResult {
    pub name: String,
    pub value: Value,
}

impl NamedResult {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered collection of a function's outputs.
#[derive(Debug, Clone, Default)]
pub struct ResultsCollection {
    results: Vec<NamedResult>,
}

impl ResultsCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.results.push(NamedResult::new(name, value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedResult> {
        self.results.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn into_results(self) -> Vec<NamedResult> {
        self.results
    }
}

impl FromIterator<NamedResult> for ResultsCollection {
    fn from_iter<I: IntoIterator<Item = NamedResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultsCollection {
    type Item = NamedResult;
    type IntoIter = std::vec::IntoIter<NamedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultsCollection {
    type Item = &'a NamedResult;
    type IntoIter = std::slice::Iter<'a, NamedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
