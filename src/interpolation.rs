// Interpolation policies for tabulated cross section data
//
// Cross section tables may be stored "raw" (energies and values as read from
// the data library) or "processed" (pre-transformed, e.g. ln(E) and ln(xs)
// for a log-log table) so that in-bin interpolation reduces to a single
// affine evaluation with a precomputed slope. Both paths must agree at bin
// boundaries to numerical precision.

use serde::{Deserialize, Serialize};

/// Interpolation policy for reconstructing a dependent value from two grid
/// points. The first tag names the dependent-variable scale, the second the
/// independent-variable scale (ENDF convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationPolicy {
    /// Linear in y, linear in x
    LinLin,
    /// Linear in y, logarithmic in x
    LinLog,
    /// Logarithmic in y, linear in x
    LogLin,
    /// Logarithmic in y, logarithmic in x (power-law interpolation)
    LogLog,
}

impl InterpolationPolicy {
    /// Transform an independent variable value for processed storage
    #[inline]
    pub fn process_indep_var(&self, x: f64) -> f64 {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LogLin => x,
            InterpolationPolicy::LinLog | InterpolationPolicy::LogLog => x.ln(),
        }
    }

    /// Invert the independent variable transform
    #[inline]
    pub fn recover_processed_indep_var(&self, x: f64) -> f64 {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LogLin => x,
            InterpolationPolicy::LinLog | InterpolationPolicy::LogLog => x.exp(),
        }
    }

    /// Transform a dependent variable value for processed storage
    #[inline]
    pub fn process_dep_var(&self, y: f64) -> f64 {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LinLog => y,
            InterpolationPolicy::LogLin | InterpolationPolicy::LogLog => y.ln(),
        }
    }

    /// Invert the dependent variable transform
    #[inline]
    pub fn recover_processed_dep_var(&self, y: f64) -> f64 {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LinLog => y,
            InterpolationPolicy::LogLin | InterpolationPolicy::LogLog => y.exp(),
        }
    }

    /// True if the dependent variable is interpolated on a log scale
    #[inline]
    pub fn dep_var_is_log(&self) -> bool {
        matches!(
            self,
            InterpolationPolicy::LogLin | InterpolationPolicy::LogLog
        )
    }

    /// True if the independent variable is interpolated on a log scale
    #[inline]
    pub fn indep_var_is_log(&self) -> bool {
        matches!(
            self,
            InterpolationPolicy::LinLog | InterpolationPolicy::LogLog
        )
    }

    /// Interpolate between two raw grid points.
    ///
    /// Requires `x0 <= x <= x1` and, for log axes, strictly positive values
    /// on that axis.
    #[inline]
    pub fn interpolate(&self, x0: f64, x1: f64, x: f64, y0: f64, y1: f64) -> f64 {
        let (px0, px1, px) = (
            self.process_indep_var(x0),
            self.process_indep_var(x1),
            self.process_indep_var(x),
        );
        let (py0, py1) = (self.process_dep_var(y0), self.process_dep_var(y1));

        let processed = py0 + (py1 - py0) * (px - px0) / (px1 - px0);

        self.recover_processed_dep_var(processed)
    }

    /// Interpolate within a bin of a processed grid.
    ///
    /// `x0_processed` and `x_processed` are pre-transformed independent
    /// values, `y0_processed` is the pre-transformed dependent value at the
    /// lower bin edge and `slope` is the processed-space slope across the
    /// bin. The raw dependent value is returned.
    #[inline]
    pub fn interpolate_processed(
        &self,
        x0_processed: f64,
        x_processed: f64,
        y0_processed: f64,
        slope: f64,
    ) -> f64 {
        self.recover_processed_dep_var(y0_processed + slope * (x_processed - x0_processed))
    }

    /// Fallback policy with the dependent axis forced linear (used for bins
    /// containing a 0.0 value that a log axis cannot represent)
    #[inline]
    pub fn with_lin_dep_var(&self) -> InterpolationPolicy {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LogLin => {
                InterpolationPolicy::LinLin
            }
            InterpolationPolicy::LinLog | InterpolationPolicy::LogLog => {
                InterpolationPolicy::LinLog
            }
        }
    }

    /// Fallback policy with the independent axis forced linear (used for
    /// bins whose lower edge is exactly 0.0 energy)
    #[inline]
    pub fn with_lin_indep_var(&self) -> InterpolationPolicy {
        match self {
            InterpolationPolicy::LinLin | InterpolationPolicy::LinLog => {
                InterpolationPolicy::LinLin
            }
            InterpolationPolicy::LogLin | InterpolationPolicy::LogLog => {
                InterpolationPolicy::LogLin
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lin_lin_interpolation() {
        let policy = InterpolationPolicy::LinLin;
        assert_eq!(policy.interpolate(0.0, 1.0, 0.5, 0.0, 10.0), 5.0);
        assert_eq!(policy.interpolate(1.0, 3.0, 2.0, 4.0, 8.0), 6.0);
    }

    #[test]
    fn test_log_log_is_power_law() {
        // y = x^2 is exact under log-log interpolation
        let policy = InterpolationPolicy::LogLog;
        let y = policy.interpolate(2.0, 8.0, 4.0, 4.0, 64.0);
        assert!((y - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_lin_log_interpolation() {
        // y linear in ln(x): exact for y = ln(x)
        let policy = InterpolationPolicy::LinLog;
        let y = policy.interpolate(1.0, std::f64::consts::E.powi(2), std::f64::consts::E, 0.0, 2.0);
        assert!((y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_at_grid_points() {
        for policy in [
            InterpolationPolicy::LinLin,
            InterpolationPolicy::LinLog,
            InterpolationPolicy::LogLin,
            InterpolationPolicy::LogLog,
        ] {
            let y0 = policy.interpolate(1.0, 2.0, 1.0, 3.0, 7.0);
            let y1 = policy.interpolate(1.0, 2.0, 2.0, 3.0, 7.0);
            assert!((y0 - 3.0).abs() < 1e-12, "{:?}", policy);
            assert!((y1 - 7.0).abs() < 1e-12, "{:?}", policy);
        }
    }

    #[test]
    fn test_processed_matches_raw() {
        let policy = InterpolationPolicy::LogLog;
        let (x0, x1, x) = (1.0e-3, 2.0e-3, 1.5e-3);
        let (y0, y1) = (5.0, 9.0);

        let raw = policy.interpolate(x0, x1, x, y0, y1);

        let px0 = policy.process_indep_var(x0);
        let px1 = policy.process_indep_var(x1);
        let py0 = policy.process_dep_var(y0);
        let py1 = policy.process_dep_var(y1);
        let slope = (py1 - py0) / (px1 - px0);
        let processed =
            policy.interpolate_processed(px0, policy.process_indep_var(x), py0, slope);

        assert!((raw - processed).abs() / raw < 1e-14);
    }

    #[test]
    fn test_lin_fallback_policies() {
        assert_eq!(
            InterpolationPolicy::LogLog.with_lin_dep_var(),
            InterpolationPolicy::LinLog
        );
        assert_eq!(
            InterpolationPolicy::LogLog.with_lin_indep_var(),
            InterpolationPolicy::LogLin
        );
        assert_eq!(
            InterpolationPolicy::LinLin.with_lin_dep_var(),
            InterpolationPolicy::LinLin
        );
    }
}
