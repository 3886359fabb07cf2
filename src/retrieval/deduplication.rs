//! Result consolidation: one representative per logical job

use crate::retrieval::RetrievedItem;
use ahash::{HashMap, HashMapExt};

/// Deduplicate items by job identifier, keeping the highest-scored chunk, then
/// rank by score and truncate to `limit`
///
/// Equal scores keep the earlier item, both within a group and in the final
/// ordering. Items with a NaN score cannot be ranked and are dropped.
pub fn consolidate(items: Vec<RetrievedItem>, limit: usize) -> Vec<RetrievedItem> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut representatives: Vec<RetrievedItem> = Vec::new();

    for item in items {
        if item.score.is_nan() {
            tracing::warn!(
                "Dropping result {} (point {}) with NaN score",
                item.identifier,
                item.point_id
            );
            continue;
        }

        match position.get(&item.identifier) {
            Some(&pos) => {
                if item.score > representatives[pos].score {
                    representatives[pos] = item;
                }
            }
            None => {
                position.insert(item.identifier.clone(), representatives.len());
                representatives.push(item);
            }
        }
    }

    representatives.sort_by(|a, b| b.score.total_cmp(&a.score));
    representatives.truncate(limit);

    representatives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::JobRecord;

    fn item(point: &str, id: &str, score: f32) -> RetrievedItem {
        RetrievedItem::new(point, id, score, JobRecord::default())
    }

    fn summary(items: &[RetrievedItem]) -> Vec<(&str, f32)> {
        items
            .iter()
            .map(|i| (i.identifier.as_str(), i.score))
            .collect()
    }

    #[test]
    fn test_keeps_max_score_per_identifier() {
        let items = vec![item("p1", "A", 0.80), item("p2", "A", 0.95), item("p3", "B", 0.50)];

        let result = consolidate(items, 10);

        assert_eq!(summary(&result), vec![("A", 0.95), ("B", 0.50)]);
        assert_eq!(result[0].point_id, "p2");
    }

    #[test]
    fn test_truncates_after_dedup() {
        let items = vec![
            item("p1", "A", 0.9),
            item("p2", "A", 0.8),
            item("p3", "B", 0.7),
            item("p4", "C", 0.6),
            item("p5", "D", 0.5),
        ];

        let result = consolidate(items, 3);
        assert_eq!(summary(&result), vec![("A", 0.9), ("B", 0.7), ("C", 0.6)]);
    }

    #[test]
    fn test_ties_keep_retrieval_order() {
        let items = vec![
            item("p1", "X", 0.5),
            item("p2", "Y", 0.5),
            item("p3", "X", 0.5),
            item("p4", "Z", 0.7),
        ];

        let result = consolidate(items, 10);
        assert_eq!(summary(&result), vec![("Z", 0.7), ("X", 0.5), ("Y", 0.5)]);
        // Equal-score duplicate does not replace the first representative
        assert_eq!(result[1].point_id, "p1");
    }

    #[test]
    fn test_invariants_hold() {
        let items = vec![
            item("p1", "A", 0.1),
            item("p2", "B", 0.4),
            item("p3", "A", 0.3),
            item("p4", "C", f32::NAN),
            item("p5", "B", 0.2),
            item("p6", "D", 0.35),
        ];

        let result = consolidate(items.clone(), 10);

        let mut ids: Vec<&str> = result.iter().map(|i| i.identifier.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), result.len());

        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));

        for survivor in &result {
            let max = items
                .iter()
                .filter(|i| i.identifier == survivor.identifier)
                .map(|i| i.score)
                .fold(f32::MIN, f32::max);
            assert_eq!(survivor.score, max);
        }
        assert!(result.iter().all(|i| i.identifier != "C"));
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(Vec::new(), 5).is_empty());
        assert!(consolidate(vec![item("p1", "A", 1.0)], 0).is_empty());
    }
}
