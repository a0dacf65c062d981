//! Whole-unit allocations from a continuous optimum.
//!
//! The rounded optimum is accepted only after it has been checked against
//! every constraint. When it fails, every integer point within a fixed radius
//! of it is examined and the best feasible one wins. When none is feasible
//! the result says so; widening the radius or running a real integer
//! program is up to the caller.

use tracing::debug;

use crate::config::{DEFAULT_BINDING_TOLERANCE, IntegerConfig};
use crate::problem::Problem;
use crate::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IntegerStatus {
    /// Coordinate-wise rounding was already feasible
    Rounded,
    /// Rounding was infeasible; a feasible neighbor was found
    Searched,
    /// No feasible integer point within the search radius
    Exhausted,
    /// The continuous problem has no optimum to round
    NoContinuousOptimum,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IntegerSolution {
    pub status: IntegerStatus,
    pub feasible: bool,
    pub variables: Vec<String>,
    /// Whole-unit values (empty unless feasible)
    pub values: Vec<i64>,
    pub objective_value: Option<f64>,
    pub continuous_objective: Option<f64>,
    /// Objective quality lost by requiring whole units (never negative)
    pub objective_gap: Option<f64>,
    /// Gap relative to the continuous objective
    pub relative_gap: Option<f64>,
    pub candidates_examined: usize,
    /// The candidate cap stopped the search before the neighborhood was covered
    pub truncated: bool,
}

impl IntegerSolution {
    fn failed(problem: &Problem, status: IntegerStatus, continuous_objective: Option<f64>) -> Self {
        Self {
            status,
            feasible: false,
            variables: problem.variable_names(),
            values: Vec::new(),
            objective_value: None,
            continuous_objective,
            objective_gap: None,
            relative_gap: None,
            candidates_examined: 0,
            truncated: false,
        }
    }

    pub fn value(&self, name: &str) -> Option<i64> {
        let j = self.variables.iter().position(|v| v == name)?;
        self.values.get(j).copied()
    }
}

#[derive(Debug, Clone)]
pub struct IntegerResolver {
    search_radius: u32,
    max_candidates: usize,
    tolerance: f64,
}

impl Default for IntegerResolver {
    fn default() -> Self {
        Self::from_config(&IntegerConfig::default())
    }
}

impl IntegerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &IntegerConfig) -> Self {
        Self {
            search_radius: config.search_radius,
            max_candidates: config.max_candidates,
            tolerance: DEFAULT_BINDING_TOLERANCE,
        }
    }

    pub fn with_search_radius(mut self, radius: u32) -> Self {
        self.search_radius = radius;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Feasibility tolerance for constraint checks
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn round_to_feasible(&self, problem: &Problem, continuous: &Solution) -> IntegerSolution {
        let continuous_objective = match continuous.objective_value {
            Some(value) if continuous.is_optimal() && continuous.values.len() == problem.num_variables() => value,
            _ => {
                return IntegerSolution::failed(
                    problem,
                    IntegerStatus::NoContinuousOptimum,
                    continuous.objective_value,
                );
            }
        };

        // Integer range allowed by each variable's bounds
        let bounds: Vec<(i64, Option<i64>)> = problem
            .variables()
            .iter()
            .map(|v| (v.lower.ceil() as i64, v.upper.map(|u| u.floor() as i64)))
            .collect();
        if bounds.iter().any(|&(lo, hi)| hi.is_some_and(|hi| hi < lo)) {
            debug!("a variable has no integer value within its bounds");
            return IntegerSolution::failed(problem, IntegerStatus::Exhausted, Some(continuous_objective));
        }

        let rounded: Vec<i64> = continuous
            .values
            .iter()
            .zip(&bounds)
            .map(|(&x, &(lo, hi))| {
                let r = (x.round() as i64).max(lo);
                hi.map_or(r, |hi| r.min(hi))
            })
            .collect();

        if let Some(objective) = self.evaluate(problem, &rounded) {
            debug!(?rounded, "rounded point is feasible");
            return self.accept(
                problem,
                IntegerStatus::Rounded,
                rounded,
                objective,
                continuous_objective,
                1,
                false,
            );
        }

        let radius = i64::from(self.search_radius);
        let lows: Vec<i64> = rounded.iter().zip(&bounds).map(|(&r, &(lo, _))| (r - radius).max(lo)).collect();
        let highs: Vec<i64> = rounded
            .iter()
            .zip(&bounds)
            .map(|(&r, &(_, hi))| hi.map_or(r + radius, |hi| (r + radius).min(hi)))
            .collect();

        let mut best: Option<(Vec<i64>, f64, f64)> = None;
        let mut examined = 0;
        let mut truncated = false;
        let mut point = lows.clone();

        'search: loop {
            if examined >= self.max_candidates {
                truncated = true;
                break;
            }
            examined += 1;

            if let Some(objective) = self.evaluate(problem, &point) {
                let distance: f64 = point
                    .iter()
                    .zip(&continuous.values)
                    .map(|(&p, &x)| (p as f64 - x).abs())
                    .sum();
                let better = match &best {
                    None => true,
                    Some((_, best_obj, best_distance)) => {
                        let gain = problem.direction().improvement(objective, *best_obj);
                        let eps = 1e-9 * (1.0 + best_obj.abs());
                        gain > eps || (gain.abs() <= eps && distance < *best_distance)
                    }
                };
                if better {
                    best = Some((point.clone(), objective, distance));
                }
            }

            // Advance to the next point of the box
            let mut j = 0;
            loop {
                if j == point.len() {
                    break 'search;
                }
                if point[j] < highs[j] {
                    point[j] += 1;
                    break;
                }
                point[j] = lows[j];
                j += 1;
            }
        }

        debug!(examined, truncated, found = best.is_some(), "neighborhood search finished");

        match best {
            Some((values, objective, _)) => self.accept(
                problem,
                IntegerStatus::Searched,
                values,
                objective,
                continuous_objective,
                examined + 1,
                truncated,
            ),
            None => IntegerSolution {
                candidates_examined: examined + 1,
                truncated,
                ..IntegerSolution::failed(problem, IntegerStatus::Exhausted, Some(continuous_objective))
            },
        }
    }

    /// Objective at `point` when it satisfies every bound and constraint
    fn evaluate(&self, problem: &Problem, point: &[i64]) -> Option<f64> {
        let values: Vec<f64> = point.iter().map(|&v| v as f64).collect();
        problem
            .is_feasible_point(&values, self.tolerance)
            .then(|| problem.evaluate(&values))
    }

    #[allow(clippy::too_many_arguments)]
    fn accept(
        &self,
        problem: &Problem,
        status: IntegerStatus,
        values: Vec<i64>,
        objective: f64,
        continuous_objective: f64,
        examined: usize,
        truncated: bool,
    ) -> IntegerSolution {
        let gap = problem.direction().improvement(continuous_objective, objective);
        let relative_gap = (continuous_objective.abs() > f64::EPSILON).then(|| gap / continuous_objective.abs());
        IntegerSolution {
            status,
            feasible: true,
            variables: problem.variable_names(),
            values,
            objective_value: Some(objective),
            continuous_objective: Some(continuous_objective),
            objective_gap: Some(gap),
            relative_gap,
            candidates_examined: examined,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;
    use crate::simplex::Solver;

    fn resolve(problem: &Problem, resolver: &IntegerResolver) -> IntegerSolution {
        let continuous = Solver::new().solve(problem);
        resolver.round_to_feasible(problem, &continuous)
    }

    #[test]
    fn test_integral_optimum_is_kept() {
        let problem = Problem::builder()
            .variable("phones")
            .variable("tablets")
            .maximize([("phones", 8000.0), ("tablets", 12000.0)])
            .constraint("Labor Hours", [("phones", 1.0), ("tablets", 2.0)], ConstraintOp::Le, 320.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert_eq!(result.status, IntegerStatus::Rounded);
        assert!(result.feasible);
        assert_eq!(result.value("phones"), Some(320));
        assert_eq!(result.value("tablets"), Some(0));
        assert_eq!(result.objective_gap, Some(0.0));
    }

    #[test]
    fn test_infeasible_rounding_falls_back_to_search() {
        // Continuous optimum x = 2.5 rounds up to 3, which breaks the budget
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0), ("y", 1.0)])
            .constraint("budget", [("x", 2.0), ("y", 2.0)], ConstraintOp::Le, 5.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert_eq!(result.status, IntegerStatus::Searched);
        assert!(result.feasible);
        // (2, 0) is the closest of the objective-2 points
        assert_eq!(result.values, vec![2, 0]);
        assert_eq!(result.objective_value, Some(2.0));
        assert!((result.objective_gap.unwrap() - 0.5).abs() < 1e-9);
        assert!((result.relative_gap.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_exhausted_search_is_tagged() {
        let problem = Problem::builder()
            .variable("x")
            .maximize([("x", 1.0)])
            .constraint("exact", [("x", 2.0)], ConstraintOp::Eq, 3.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert_eq!(result.status, IntegerStatus::Exhausted);
        assert!(!result.feasible);
        assert!(result.values.is_empty());
        assert_eq!(result.continuous_objective, Some(1.5));
    }

    #[test]
    fn test_zero_radius_only_checks_rounding() {
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0), ("y", 1.0)])
            .constraint("budget", [("x", 2.0), ("y", 2.0)], ConstraintOp::Le, 5.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new().with_search_radius(0));
        assert_eq!(result.status, IntegerStatus::Exhausted);
        assert!(!result.truncated);
    }

    #[test]
    fn test_candidate_cap_truncates() {
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0), ("y", 1.0)])
            .constraint("budget", [("x", 2.0), ("y", 2.0)], ConstraintOp::Le, 5.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new().with_max_candidates(3));
        assert!(result.truncated);
        assert!(result.candidates_examined <= 4);
    }

    #[test]
    fn test_infeasible_continuous_problem() {
        let problem = Problem::builder()
            .variable("x1")
            .maximize([("x1", 1.0)])
            .constraint("at least", [("x1", 1.0)], ConstraintOp::Ge, 10.0)
            .constraint("at most", [("x1", 1.0)], ConstraintOp::Le, 5.0)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert_eq!(result.status, IntegerStatus::NoContinuousOptimum);
        assert!(!result.feasible);
    }

    #[test]
    fn test_minimization_gap_is_non_negative() {
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .minimize([("x", 1.0), ("y", 1.0)])
            .constraint("demand", [("x", 1.0), ("y", 1.0)], ConstraintOp::Ge, 2.5)
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert!(result.feasible);
        assert_eq!(result.objective_value, Some(3.0));
        assert!((result.objective_gap.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_respects_bounds() {
        let problem = Problem::builder()
            .bounded_variable("x", 0.0, Some(2.6))
            .maximize([("x", 1.0)])
            .build()
            .unwrap();

        let result = resolve(&problem, &IntegerResolver::new());
        assert!(result.feasible);
        assert_eq!(result.values, vec![2]);
    }
}
