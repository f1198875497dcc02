use std::collections::HashMap;

/// Per-product occurrence counts for one run's window.
///
/// Built fresh each run and discarded after commit. Each distinct product
/// appears exactly once, with its count equal to the number of qualifying
/// line items; `distinct_products` preserves first-sighting order so the
/// downstream adjacency build and commit are deterministic.
#[derive(Debug, Default)]
pub struct WindowCounts {
    counts: HashMap<i64, i64>,
    first_seen: Vec<i64>,
}

impl WindowCounts {
    /// Occurrence count for a product id; zero if it was not in the window.
    #[must_use]
    pub fn get(&self, product_id: i64) -> i64 {
        self.counts.get(&product_id).copied().unwrap_or(0)
    }

    /// Distinct product ids in first-sighting order.
    #[must_use]
    pub fn distinct_products(&self) -> &[i64] {
        &self.first_seen
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }
}

/// Counts line-item occurrences per product id.
///
/// A line item counts as one occurrence regardless of its quantity field;
/// popularity here tracks how often a product shows up in orders, not how
/// many units moved.
#[must_use]
pub fn count_occurrences(product_ids: &[i64]) -> WindowCounts {
    let mut result = WindowCounts::default();

    for &product_id in product_ids {
        let count = result.counts.entry(product_id).or_insert(0);
        if *count == 0 {
            result.first_seen.push(product_id);
        }
        *count += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_occurrences() {
        let counts = count_occurrences(&[7, 3, 7, 7, 3, 9]);
        assert_eq!(counts.get(7), 3);
        assert_eq!(counts.get(3), 2);
        assert_eq!(counts.get(9), 1);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn unknown_product_counts_zero() {
        let counts = count_occurrences(&[1, 2]);
        assert_eq!(counts.get(99), 0);
    }

    #[test]
    fn distinct_products_preserve_first_sighting_order() {
        let counts = count_occurrences(&[5, 2, 5, 8, 2]);
        assert_eq!(counts.distinct_products(), &[5, 2, 8]);
    }

    #[test]
    fn empty_input_produces_empty_counts() {
        let counts = count_occurrences(&[]);
        assert!(counts.is_empty());
        assert_eq!(counts.distinct_products(), &[] as &[i64]);
    }
}
