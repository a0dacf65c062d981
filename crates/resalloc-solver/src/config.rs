/// Slack magnitude at or below which a constraint counts as binding.
pub const DEFAULT_BINDING_TOLERANCE: f64 = 1e-6;

/// Pivot elements and reduced costs below this are treated as zero.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

pub const DEFAULT_SEARCH_RADIUS: u32 = 2;

pub const DEFAULT_MAX_CANDIDATES: usize = 1_000_000;

pub const DEFAULT_FINITE_DIFFERENCE_STEP: f64 = 1e-3;

/// LP core solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Maximum pivots across both simplex phases
    pub max_iterations: usize,
    pub pivot_tolerance: f64,
    pub binding_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            binding_tolerance: DEFAULT_BINDING_TOLERANCE,
        }
    }
}

/// Integer rounding settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IntegerConfig {
    /// Each coordinate is searched within +/- this many units of its rounded value
    pub search_radius: u32,
    /// Upper limit on neighborhood points examined
    pub max_candidates: usize,
}

impl Default for IntegerConfig {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// How shadow prices are obtained
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ShadowPriceMethod {
    /// Dual values read off the final simplex tableau
    #[default]
    Dual,
    /// Relax the limit by `step`, re-solve and take the objective slope
    FiniteDifference { step: f64 },
}

impl ShadowPriceMethod {
    /// Finite differences with the default step
    pub fn finite_difference() -> Self {
        ShadowPriceMethod::FiniteDifference {
            step: DEFAULT_FINITE_DIFFERENCE_STEP,
        }
    }
}

/// Duality analysis settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Use finite-difference re-solves instead of tableau duals
    pub finite_difference: bool,
    pub step: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            finite_difference: false,
            step: DEFAULT_FINITE_DIFFERENCE_STEP,
        }
    }
}

impl AnalysisConfig {
    pub fn method(&self) -> ShadowPriceMethod {
        if self.finite_difference {
            ShadowPriceMethod::FiniteDifference { step: self.step }
        } else {
            ShadowPriceMethod::Dual
        }
    }
}
