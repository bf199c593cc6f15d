// Tabulated energy-dependent cross section
//
// Owns a cross section array aligned to a suffix of a shared energy grid:
// grid points below `threshold_energy_index` have an implicit cross section
// of exactly zero and are not stored. The grid (and the values, when the
// table is "processed") may be pre-transformed by the interpolation policy
// so in-bin evaluation is a single affine step.

use crate::grid_searcher::HashGridSearcher;
use crate::interpolation::InterpolationPolicy;
use std::sync::Arc;

/// A tabulated cross section over a shared energy grid.
///
/// Immutable after construction. Queries never mutate state, so one instance
/// can be shared across concurrent particle histories.
#[derive(Debug)]
pub struct TabulatedCrossSection {
    /// Shared energy grid (processed values when `processed` is true)
    energy_grid: Arc<Vec<f64>>,
    /// Cross section values aligned to `energy_grid[threshold_energy_index..]`
    cross_section: Vec<f64>,
    /// First grid index where the reaction is energetically possible
    threshold_energy_index: usize,
    /// Last grid index covered by the stored cross section array
    max_energy_index: usize,
    policy: InterpolationPolicy,
    /// True if grid and values are stored pre-transformed by `policy`
    processed: bool,
    grid_searcher: Arc<HashGridSearcher>,
}

impl TabulatedCrossSection {
    /// Construct a cross section table, building a default grid searcher.
    pub fn new(
        energy_grid: Arc<Vec<f64>>,
        cross_section: Vec<f64>,
        threshold_energy_index: usize,
        policy: InterpolationPolicy,
        processed: bool,
    ) -> Self {
        let grid_searcher = Arc::new(HashGridSearcher::with_default_bins(energy_grid.clone()));
        Self::with_grid_searcher(
            energy_grid,
            cross_section,
            threshold_energy_index,
            policy,
            processed,
            grid_searcher,
        )
    }

    /// Construct a cross section table sharing an existing grid searcher.
    ///
    /// Panics on malformed data: empty or non-ascending grid, threshold out
    /// of range, array length not matching the grid suffix, or non-finite
    /// values. Data errors are fatal before any history begins.
    pub fn with_grid_searcher(
        energy_grid: Arc<Vec<f64>>,
        cross_section: Vec<f64>,
        threshold_energy_index: usize,
        policy: InterpolationPolicy,
        processed: bool,
        grid_searcher: Arc<HashGridSearcher>,
    ) -> Self {
        if energy_grid.len() < 2 {
            panic!("cross section energy grid must have at least two points");
        }
        if energy_grid.windows(2).any(|w| w[0] >= w[1]) {
            panic!("cross section energy grid must be strictly ascending");
        }
        if threshold_energy_index >= energy_grid.len() {
            panic!(
                "threshold energy index {} outside energy grid of size {}",
                threshold_energy_index,
                energy_grid.len()
            );
        }
        if cross_section.len() < 2 {
            panic!("cross section array must have at least two points");
        }
        if cross_section.len() + threshold_energy_index > energy_grid.len() {
            panic!(
                "cross section array of size {} with threshold index {} overruns energy grid of size {}",
                cross_section.len(),
                threshold_energy_index,
                energy_grid.len()
            );
        }
        if cross_section.iter().any(|v| !v.is_finite()) {
            panic!("cross section array contains non-finite values");
        }
        if !processed && cross_section.iter().any(|&v| v < 0.0) {
            panic!("cross section array contains negative values");
        }

        let max_energy_index = threshold_energy_index + cross_section.len() - 1;

        TabulatedCrossSection {
            energy_grid,
            cross_section,
            threshold_energy_index,
            max_energy_index,
            policy,
            processed,
            grid_searcher,
        }
    }

    /// Test if the (raw) energy falls within the energy grid
    #[inline]
    pub fn is_energy_within_energy_grid(&self, energy: f64) -> bool {
        self.grid_searcher
            .is_value_within_grid_bounds(self.query_value(energy))
    }

    /// The lowest energy at which the cross section is nonzero
    pub fn threshold_energy(&self) -> f64 {
        self.recover_grid_value(self.energy_grid[self.threshold_energy_index])
    }

    /// The highest energy covered by the stored cross section array
    pub fn max_energy(&self) -> f64 {
        self.recover_grid_value(self.energy_grid[self.max_energy_index])
    }

    /// Return the cross section at the given energy.
    ///
    /// Below the threshold energy (or the grid front) this is exactly zero.
    /// At or above the top of the grid the boundary value is returned
    /// directly rather than extrapolating.
    pub fn cross_section_at(&self, energy: f64) -> f64 {
        let query = self.query_value(energy);

        if query < self.energy_grid[0] {
            return 0.0;
        }
        if query >= self.energy_grid[self.energy_grid.len() - 1] {
            let value = if self.max_energy_index == self.energy_grid.len() - 1 {
                self.recover_cs_value(self.cross_section[self.cross_section.len() - 1])
            } else {
                0.0
            };
            return value;
        }

        let bin_index = self.grid_searcher.find_lower_bin_index(query);
        self.cross_section_at_bin(energy, bin_index)
    }

    /// Return the cross section at the given energy with the containing bin
    /// already known (e.g. from a shared grid searcher lookup).
    ///
    /// Returns zero for bins below the threshold index or above the stored
    /// array's extent.
    pub fn cross_section_at_bin(&self, energy: f64, bin_index: usize) -> f64 {
        debug_assert!(bin_index < self.energy_grid.len() - 1);

        let query = self.query_value(energy);

        let value = if bin_index > self.threshold_energy_index {
            if bin_index < self.max_energy_index {
                let cs_index = bin_index - self.threshold_energy_index;
                self.interpolate_bin(
                    self.energy_grid[bin_index],
                    self.energy_grid[bin_index + 1],
                    query,
                    self.cross_section[cs_index],
                    self.cross_section[cs_index + 1],
                    self.policy,
                )
            } else {
                0.0
            }
        } else if bin_index == self.threshold_energy_index {
            self.first_bin_cross_section(query)
        } else {
            0.0
        };

        // Data corruption upstream (bad grids, bad sums) must fail loudly
        // rather than silently feeding the transport loop garbage.
        assert!(
            value.is_finite() && value >= 0.0,
            "invalid cross section {} at energy {}",
            value,
            energy
        );

        value
    }

    /// First-bin evaluation handling exact zeros that a log axis cannot
    /// represent: the offending axis falls back to linear interpolation for
    /// this bin only.
    fn first_bin_cross_section(&self, query: f64) -> f64 {
        let e0 = self.energy_grid[self.threshold_energy_index];
        let e1 = self.energy_grid[self.threshold_energy_index + 1];
        let cs0 = self.cross_section[0];
        let cs1 = self.cross_section[1];

        // A 0.0 can only occur at the first stored point
        let zero_cs = !self.processed && cs0 == 0.0 && self.policy.dep_var_is_log();
        let zero_energy = self.threshold_energy_index == 0
            && !self.processed
            && e0 == 0.0
            && self.policy.indep_var_is_log();

        let policy = match (zero_cs, zero_energy) {
            (false, false) => self.policy,
            (true, false) => self.policy.with_lin_dep_var(),
            (false, true) => self.policy.with_lin_indep_var(),
            (true, true) => InterpolationPolicy::LinLin,
        };

        self.interpolate_bin(e0, e1, query, cs0, cs1, policy)
    }

    fn interpolate_bin(
        &self,
        e0: f64,
        e1: f64,
        query: f64,
        cs0: f64,
        cs1: f64,
        policy: InterpolationPolicy,
    ) -> f64 {
        if self.processed {
            let slope = (cs1 - cs0) / (e1 - e0);
            policy.interpolate_processed(e0, query, cs0, slope)
        } else {
            policy.interpolate(e0, e1, query, cs0, cs1)
        }
    }

    /// Raw energy -> grid-space query value
    #[inline]
    fn query_value(&self, energy: f64) -> f64 {
        if self.processed {
            self.policy.process_indep_var(energy)
        } else {
            energy
        }
    }

    /// Grid-space value -> raw energy
    #[inline]
    fn recover_grid_value(&self, value: f64) -> f64 {
        if self.processed {
            self.policy.recover_processed_indep_var(value)
        } else {
            value
        }
    }

    /// Stored cross section value -> raw cross section
    #[inline]
    fn recover_cs_value(&self, value: f64) -> f64 {
        if self.processed {
            self.policy.recover_processed_dep_var(value)
        } else {
            value
        }
    }

    /// First grid index where the reaction is energetically possible
    pub fn threshold_energy_index(&self) -> usize {
        self.threshold_energy_index
    }

    /// The shared energy grid
    pub fn energy_grid(&self) -> &Arc<Vec<f64>> {
        &self.energy_grid
    }

    /// The shared grid searcher
    pub fn grid_searcher(&self) -> &Arc<HashGridSearcher> {
        &self.grid_searcher
    }

    /// True if this table shares its energy grid with another table
    pub fn is_energy_grid_shared(&self, other: &TabulatedCrossSection) -> bool {
        Arc::ptr_eq(&self.energy_grid, &other.energy_grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_grid() -> Arc<Vec<f64>> {
        Arc::new(vec![1e-3, 1e-2, 1e-1, 1.0, 10.0, 100.0])
    }

    #[test]
    fn test_threshold_semantics() {
        // Reaction turns on at the third grid point
        let xs = TabulatedCrossSection::new(
            simple_grid(),
            vec![2.0, 4.0, 8.0, 16.0],
            2,
            InterpolationPolicy::LinLin,
            false,
        );

        assert_eq!(xs.threshold_energy(), 1e-1);
        assert_eq!(xs.cross_section_at(1e-3), 0.0);
        assert_eq!(xs.cross_section_at(5e-2), 0.0);
        assert_eq!(xs.cross_section_at(1e-1), 2.0);
        assert_eq!(xs.cross_section_at(100.0), 16.0);
    }

    #[test]
    fn test_exact_at_grid_points() {
        let grid = simple_grid();
        let values = vec![1.0, 3.0, 9.0, 27.0, 81.0, 243.0];
        let xs = TabulatedCrossSection::new(
            grid.clone(),
            values.clone(),
            0,
            InterpolationPolicy::LogLog,
            false,
        );

        for (e, v) in grid.iter().zip(values.iter()) {
            let got = xs.cross_section_at(*e);
            assert!((got - v).abs() / v < 1e-12, "at E={}: {} != {}", e, got, v);
        }
    }

    #[test]
    fn test_processed_matches_raw() {
        let policy = InterpolationPolicy::LogLog;
        let grid = simple_grid();
        let values = vec![1.0, 3.0, 9.0, 27.0, 81.0, 243.0];

        let raw = TabulatedCrossSection::new(grid.clone(), values.clone(), 0, policy, false);

        let processed_grid: Arc<Vec<f64>> =
            Arc::new(grid.iter().map(|&e| policy.process_indep_var(e)).collect());
        let processed_values: Vec<f64> =
            values.iter().map(|&v| policy.process_dep_var(v)).collect();
        let processed =
            TabulatedCrossSection::new(processed_grid, processed_values, 0, policy, true);

        let mut e = 1.5e-3;
        while e < 100.0 {
            let a = raw.cross_section_at(e);
            let b = processed.cross_section_at(e);
            assert!((a - b).abs() / a < 1e-12, "at E={}: {} vs {}", e, a, b);
            e *= 1.7;
        }
    }

    #[test]
    fn test_first_bin_zero_value_fallback() {
        // LogLog table whose first stored value is exactly zero: the
        // dependent axis must fall back to linear in the first bin
        let xs = TabulatedCrossSection::new(
            Arc::new(vec![1.0, 2.0, 4.0, 8.0]),
            vec![0.0, 6.0, 12.0],
            1,
            InterpolationPolicy::LogLog,
            false,
        );

        let v = xs.cross_section_at(2.0_f64.sqrt() * 2.0); // log-midpoint of [2,4]
        assert!(v > 0.0 && v < 6.0);
        assert_eq!(xs.cross_section_at(2.0), 0.0);
    }

    #[test]
    fn test_bin_indexed_lookup() {
        let grid = simple_grid();
        let xs = TabulatedCrossSection::new(
            grid.clone(),
            vec![2.0, 4.0, 8.0, 16.0],
            2,
            InterpolationPolicy::LinLin,
            false,
        );

        // Bin below threshold
        assert_eq!(xs.cross_section_at_bin(5e-3, 0), 0.0);
        // Bin at threshold
        assert!(xs.cross_section_at_bin(0.5, 2) > 0.0);
        // Consistency with the searching overload
        let e = 5.0;
        let bin = xs.grid_searcher().find_lower_bin_index(e);
        assert_eq!(xs.cross_section_at(e), xs.cross_section_at_bin(e, bin));
    }

    #[test]
    #[should_panic]
    fn test_mismatched_sizes_rejected() {
        TabulatedCrossSection::new(
            simple_grid(),
            vec![1.0; 10],
            0,
            InterpolationPolicy::LinLin,
            false,
        );
    }

    #[test]
    #[should_panic]
    fn test_negative_values_rejected() {
        TabulatedCrossSection::new(
            simple_grid(),
            vec![1.0, -2.0, 3.0, 4.0, 5.0, 6.0],
            0,
            InterpolationPolicy::LinLin,
            false,
        );
    }
}
