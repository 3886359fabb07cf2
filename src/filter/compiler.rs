//! FilterSet -> CompiledPredicate

use crate::filter::{Condition, CompiledPredicate, FilterSet, PUBLICATION_DATE_FIELD};

/// Compiles structured filters into the engine's predicate form
///
/// Compilation never fails. Entries that cannot be expressed are skipped with a
/// warning and the rest of the filter still applies. An inverted date range is
/// still forwarded, so it narrows the search to nothing rather than widening it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler;

impl FilterCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, filters: &FilterSet) -> CompiledPredicate {
        tracing::debug!("Building filter conditions from: {}", filters.to_json());

        let mut conditions = Vec::with_capacity(filters.len());

        for (field, value) in filters.fields() {
            if value.trim().is_empty() {
                tracing::warn!("Skipping filter {}: empty value", field.as_key());
                continue;
            }
            tracing::debug!("Adding filter: {} = {}", field.as_key(), value);
            conditions.push(Condition::Phrase {
                key: field.as_key().to_string(),
                phrase: value.to_string(),
            });
        }

        if let Some(range) = filters.date_range() {
            if range.is_unbounded() {
                tracing::warn!("Skipping date_range filter: no bounds set");
            } else {
                if range.is_inverted() {
                    tracing::warn!(
                        "date_range bounds can never be satisfied ({}), search will match nothing",
                        range.to_json()
                    );
                }
                conditions.push(Condition::DateRange {
                    key: PUBLICATION_DATE_FIELD.to_string(),
                    range: *range,
                });
            }
        }

        if conditions.is_empty() {
            tracing::info!("No filters applied to search");
        } else {
            tracing::info!("Created {} filter conditions", conditions.len());
        }

        CompiledPredicate::from_conditions(conditions)
    }
}
