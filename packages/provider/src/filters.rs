//! Value filters applied to a record's attribute map before rendering.

use std::sync::Arc;

use crate::models::Record;

/// A pure transform of one term's values.
pub type ValueFilter = Arc<dyn Fn(&str, Vec<String>) -> Vec<String> + Send + Sync>;

/// Ordered list of value filters.
///
/// Filters run in registration order; a term whose values end up empty is
/// removed from the record.
#[derive(Clone, Default)]
pub struct ValueFilterChain {
    filters: Vec<ValueFilter>,
}

impl ValueFilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: ValueFilter) {
        self.filters.push(filter);
    }

    #[must_use]
    pub fn with(mut self, filter: ValueFilter) -> Self {
        self.push(filter);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter over every term of `record`.
    #[must_use]
    pub fn apply(&self, mut record: Record) -> Record {
        if self.filters.is_empty() {
            return record;
        }

        let values = std::mem::take(&mut record.values);
        record.values = values
            .into_iter()
            .filter_map(|(term, values)| {
                let values = self
                    .filters
                    .iter()
                    .fold(values, |values, filter| filter(&term, values));
                (!values.is_empty()).then_some((term, values))
            })
            .collect();
        record
    }
}

impl std::fmt::Debug for ValueFilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueFilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Trim every value and drop the ones left blank.
#[must_use]
pub fn trim_values() -> ValueFilter {
    Arc::new(|_term: &str, values: Vec<String>| -> Vec<String> {
        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    })
}

/// Remove every value of the given terms.
#[must_use]
pub fn hide_terms(terms: Vec<String>) -> ValueFilter {
    Arc::new(move |term: &str, values: Vec<String>| -> Vec<String> {
        if terms.iter().any(|t| t == term) {
            Vec::new()
        } else {
            values
        }
    })
}
