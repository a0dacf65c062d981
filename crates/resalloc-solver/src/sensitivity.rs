//! What-if analysis: solve a baseline and a perturbed instance of the same
//! problem and report how the optimal plan shifts.

use tracing::debug;

use crate::config::SolverConfig;
use crate::error::ModelError;
use crate::problem::Problem;
use crate::simplex::Solver;
use crate::solution::{Solution, SolveStatus};

/// A single parameter change applied to a problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Perturbation {
    /// Replace a variable's objective coefficient
    ObjectiveCoefficient { variable: String, value: f64 },
    /// Multiply a variable's objective coefficient
    ScaleObjectiveCoefficient { variable: String, factor: f64 },
    /// Replace one coefficient of a constraint
    Coefficient {
        constraint: String,
        variable: String,
        value: f64,
    },
    /// Multiply every coefficient of a constraint
    ScaleConstraint { constraint: String, factor: f64 },
    /// Replace a constraint's limit
    Limit { constraint: String, value: f64 },
    /// Multiply a constraint's limit
    ScaleLimit { constraint: String, factor: f64 },
    /// Add to a constraint's limit
    ShiftLimit { constraint: String, delta: f64 },
    /// Replace a variable's upper bound
    UpperBound { variable: String, value: Option<f64> },
}

impl Problem {
    /// A new, validated problem with `perturbations` applied in order.
    /// `self` is left untouched.
    pub fn perturbed(&self, perturbations: &[Perturbation]) -> Result<Problem, ModelError> {
        let mut next = self.clone();
        for p in perturbations {
            let j_of = |name: &str| {
                self.variable_index(name).ok_or_else(|| ModelError::UnknownVariable {
                    context: "perturbation".to_string(),
                    name: name.to_string(),
                })
            };
            let i_of = |label: &str| {
                self.constraint_index(label)
                    .ok_or_else(|| ModelError::UnknownConstraint(label.to_string()))
            };

            let (variables, objective, constraints) = next.parts_mut();
            match p {
                Perturbation::ObjectiveCoefficient { variable, value } => {
                    objective.coefficients[j_of(variable)?] = *value;
                }
                Perturbation::ScaleObjectiveCoefficient { variable, factor } => {
                    objective.coefficients[j_of(variable)?] *= factor;
                }
                Perturbation::Coefficient {
                    constraint,
                    variable,
                    value,
                } => {
                    let j = j_of(variable)?;
                    constraints[i_of(constraint)?].coefficients[j] = *value;
                }
                Perturbation::ScaleConstraint { constraint, factor } => {
                    let c = &mut constraints[i_of(constraint)?];
                    c.coefficients.iter_mut().for_each(|a| *a *= factor);
                }
                Perturbation::Limit { constraint, value } => {
                    constraints[i_of(constraint)?].limit = *value;
                }
                Perturbation::ScaleLimit { constraint, factor } => {
                    constraints[i_of(constraint)?].limit *= factor;
                }
                Perturbation::ShiftLimit { constraint, delta } => {
                    constraints[i_of(constraint)?].limit += delta;
                }
                Perturbation::UpperBound { variable, value } => {
                    variables[j_of(variable)?].upper = *value;
                }
            }
        }
        next.revalidated()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ComparisonOutcome {
    /// Both instances solved to optimality; deltas are populated
    Compared,
    /// The perturbation made the problem infeasible
    BecameInfeasible,
    /// The perturbation made an infeasible problem feasible
    BecameFeasible,
    /// Any other combination (unbounded, iteration limit, both infeasible)
    NotComparable {
        base: SolveStatus,
        perturbed: SolveStatus,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariableDelta {
    pub variable: String,
    pub base: f64,
    pub perturbed: f64,
    pub delta: f64,
}

/// Baseline versus perturbed solve
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comparison {
    pub base: Solution,
    pub perturbed: Solution,
    pub outcome: ComparisonOutcome,
    /// Signed change per variable (empty unless compared)
    pub variable_deltas: Vec<VariableDelta>,
    /// Signed objective change (only when compared)
    pub objective_delta: Option<f64>,
    /// Objective change relative to the baseline, in percent
    pub objective_change_percent: Option<f64>,
}

/// Objective value of one re-solve in a limit sweep
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SweepPoint {
    pub limit: f64,
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SensitivityEngine {
    solver: Solver,
}

impl SensitivityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            solver: Solver::from_config(config),
        }
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Solve both instances independently and diff the results.
    ///
    /// The instances must share variable names and constraint labels, in order.
    pub fn compare(&self, base: &Problem, perturbed: &Problem) -> Result<Comparison, ModelError> {
        base.ensure_same_shape(perturbed)?;

        let base_solution = self.solver.solve(base);
        let perturbed_solution = self.solver.solve(perturbed);

        let outcome = match (base_solution.status, perturbed_solution.status) {
            (SolveStatus::Optimal, SolveStatus::Optimal) => ComparisonOutcome::Compared,
            (SolveStatus::Optimal, SolveStatus::Infeasible) => ComparisonOutcome::BecameInfeasible,
            (SolveStatus::Infeasible, SolveStatus::Optimal) => ComparisonOutcome::BecameFeasible,
            (base, perturbed) => ComparisonOutcome::NotComparable { base, perturbed },
        };

        let mut comparison = Comparison {
            base: base_solution,
            perturbed: perturbed_solution,
            outcome,
            variable_deltas: Vec::new(),
            objective_delta: None,
            objective_change_percent: None,
        };

        if outcome == ComparisonOutcome::Compared {
            comparison.variable_deltas = comparison
                .base
                .named_values()
                .zip(comparison.perturbed.values.iter())
                .map(|((name, before), &after)| VariableDelta {
                    variable: name.to_string(),
                    base: before,
                    perturbed: after,
                    delta: after - before,
                })
                .collect();

            if let (Some(before), Some(after)) = (
                comparison.base.objective_value,
                comparison.perturbed.objective_value,
            ) {
                let delta = after - before;
                comparison.objective_delta = Some(delta);
                if before.abs() > f64::EPSILON {
                    comparison.objective_change_percent = Some(delta / before.abs() * 100.0);
                }
            }
        }

        debug!(outcome = ?comparison.outcome, delta = ?comparison.objective_delta, "compared scenarios");
        Ok(comparison)
    }

    /// Apply `perturbations` to `base` and compare the two
    pub fn what_if(&self, base: &Problem, perturbations: &[Perturbation]) -> Result<Comparison, ModelError> {
        let perturbed = base.perturbed(perturbations)?;
        self.compare(base, &perturbed)
    }

    /// Re-solve `base` once per limit of the constraint labelled `label`
    pub fn sweep_limit(&self, base: &Problem, label: &str, limits: &[f64]) -> Result<Vec<SweepPoint>, ModelError> {
        limits
            .iter()
            .map(|&limit| {
                let problem = base.perturbed(&[Perturbation::Limit {
                    constraint: label.to_string(),
                    value: limit,
                }])?;
                let solution = self.solver.solve(&problem);
                Ok(SweepPoint {
                    limit,
                    status: solution.status,
                    objective_value: solution.objective_value,
                    values: solution.values,
                })
            })
            .collect()
    }
}
