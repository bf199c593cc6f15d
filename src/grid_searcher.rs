// Hash-based energy grid searcher
//
// Precomputes a uniform hash over the grid range so that the lower bin index
// containing a query energy can be found in O(1) average time instead of a
// full binary search. Shared by every reaction built on one energy grid.

use std::sync::Arc;

/// Hash-based grid searcher for O(1) average-case bin lookup.
///
/// The grid is partitioned into `hash_bins` equal spans of the (possibly
/// processed) grid range. Each hash bin stores the grid index range it can
/// map to, so a query only binary searches a handful of grid points.
#[derive(Debug)]
pub struct HashGridSearcher {
    grid: Arc<Vec<f64>>,
    /// hash bin -> first grid index that can contain values hashing there
    hash_index: Vec<usize>,
    min_value: f64,
    max_value: f64,
    inv_bin_width: f64,
}

impl HashGridSearcher {
    /// Construct a searcher over an ascending grid.
    ///
    /// `hash_bins` is typically `grid.len()/10 + 1`. Panics if the grid has
    /// fewer than two points or is not strictly ascending.
    pub fn new(grid: Arc<Vec<f64>>, hash_bins: usize) -> Self {
        if grid.len() < 2 {
            panic!("grid searcher requires at least two grid points");
        }
        if grid.windows(2).any(|w| w[0] >= w[1]) {
            panic!("grid searcher requires a strictly ascending grid");
        }
        let hash_bins = hash_bins.max(1);

        let min_value = grid[0];
        let max_value = grid[grid.len() - 1];
        let inv_bin_width = hash_bins as f64 / (max_value - min_value);

        // For each hash bin, record the largest grid index whose value is
        // <= the bin's lower edge. Queries then search forward from there.
        let mut hash_index = Vec::with_capacity(hash_bins + 1);
        let mut grid_idx = 0usize;
        for bin in 0..=hash_bins {
            let edge = min_value + bin as f64 / inv_bin_width;
            while grid_idx + 1 < grid.len() - 1 && grid[grid_idx + 1] <= edge {
                grid_idx += 1;
            }
            hash_index.push(grid_idx);
        }

        HashGridSearcher {
            grid,
            hash_index,
            min_value,
            max_value,
            inv_bin_width,
        }
    }

    /// Construct with the default bin count used by the reaction classes
    pub fn with_default_bins(grid: Arc<Vec<f64>>) -> Self {
        let bins = grid.len() / 10 + 1;
        Self::new(grid, bins)
    }

    /// Test if a value falls within the grid bounds (inclusive)
    #[inline]
    pub fn is_value_within_grid_bounds(&self, value: f64) -> bool {
        value >= self.min_value && value <= self.max_value
    }

    /// Find the lower bin index `i` such that `grid[i] <= value <= grid[i+1]`.
    ///
    /// The value must be within the grid bounds. The top grid point maps to
    /// the last bin (`grid.len() - 2`).
    pub fn find_lower_bin_index(&self, value: f64) -> usize {
        debug_assert!(self.is_value_within_grid_bounds(value));

        let hash_bin =
            (((value - self.min_value) * self.inv_bin_width) as usize).min(self.hash_index.len() - 1);

        let mut idx = self.hash_index[hash_bin];
        while idx + 1 < self.grid.len() - 1 && self.grid[idx + 1] <= value {
            idx += 1;
        }
        idx
    }

    /// The shared grid this searcher was built over
    pub fn grid(&self) -> &Arc<Vec<f64>> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_grid(n: usize) -> Arc<Vec<f64>> {
        Arc::new((0..n).map(|i| 1.0 + i as f64 * 0.25).collect())
    }

    #[test]
    fn test_bounds_check() {
        let searcher = HashGridSearcher::with_default_bins(linear_grid(41));
        assert!(searcher.is_value_within_grid_bounds(1.0));
        assert!(searcher.is_value_within_grid_bounds(11.0));
        assert!(!searcher.is_value_within_grid_bounds(0.999));
        assert!(!searcher.is_value_within_grid_bounds(11.001));
    }

    #[test]
    fn test_lower_bin_matches_binary_search() {
        let grid = linear_grid(97);
        let searcher = HashGridSearcher::with_default_bins(grid.clone());

        let mut query = grid[0];
        while query < grid[grid.len() - 1] {
            let idx = searcher.find_lower_bin_index(query);
            assert!(grid[idx] <= query && query <= grid[idx + 1], "query {}", query);
            query += 0.0937;
        }

        // Top of grid maps to the last bin
        let top = grid[grid.len() - 1];
        assert_eq!(searcher.find_lower_bin_index(top), grid.len() - 2);
    }

    #[test]
    fn test_grid_point_queries() {
        let grid = linear_grid(25);
        let searcher = HashGridSearcher::with_default_bins(grid.clone());
        for (i, &e) in grid.iter().enumerate().take(grid.len() - 1) {
            assert_eq!(searcher.find_lower_bin_index(e), i);
        }
    }

    #[test]
    #[should_panic]
    fn test_unsorted_grid_rejected() {
        HashGridSearcher::with_default_bins(Arc::new(vec![1.0, 0.5, 2.0]));
    }

    #[test]
    fn test_log_spaced_grid() {
        let grid: Arc<Vec<f64>> =
            Arc::new((0..50).map(|i| 1e-3 * 10f64.powf(i as f64 * 0.1)).collect());
        let searcher = HashGridSearcher::with_default_bins(grid.clone());

        for i in 0..grid.len() - 1 {
            let mid = 0.5 * (grid[i] + grid[i + 1]);
            let idx = searcher.find_lower_bin_index(mid);
            assert!(grid[idx] <= mid && mid <= grid[idx + 1]);
        }
    }
}
