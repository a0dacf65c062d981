//! Binding-constraint detection and shadow prices.
//!
//! A shadow price is the change in the optimal objective value per unit of
//! relaxation of a constraint's limit: raising the limit of a `<=` or `=`
//! constraint, lowering the limit of a `>=` constraint. Constraints with
//! slack always have a shadow price of exactly zero.

use tracing::{debug, warn};

use crate::config::{AnalysisConfig, DEFAULT_BINDING_TOLERANCE, ShadowPriceMethod, SolverConfig};
use crate::problem::{ConstraintOp, Direction, Problem};
use crate::simplex::Solver;
use crate::solution::{Solution, is_binding};

/// Shadow prices and usage for every constraint of a solved problem
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadowPriceTable {
    /// One entry per constraint, in problem order
    pub constraints: Vec<ConstraintReport>,
    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintReport {
    pub label: String,
    pub op: ConstraintOp,
    pub limit: f64,
    pub consumed: f64,
    pub slack: f64,
    pub binding: bool,
    pub shadow_price: f64,
    /// Interpretation
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Objective change per unit increase of the variable
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

impl ShadowPriceTable {
    /// Shadow price of the constraint with this label
    pub fn get(&self, label: &str) -> Option<f64> {
        self.report(label).map(|r| r.shadow_price)
    }

    pub fn report(&self, label: &str) -> Option<&ConstraintReport> {
        self.constraints.iter().find(|r| r.label == label)
    }

    pub fn binding(&self) -> impl Iterator<Item = &ConstraintReport> {
        self.constraints.iter().filter(|r| r.binding)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.reduced_costs.is_empty()
    }

    /// Binding constraint with the largest marginal value
    pub fn bottleneck(&self) -> Option<&ConstraintReport> {
        self.binding()
            .filter(|r| r.shadow_price != 0.0)
            .max_by(|a, b| a.shadow_price.abs().total_cmp(&b.shadow_price.abs()))
    }
}

#[derive(Debug, Clone)]
pub struct DualityAnalyzer {
    binding_tolerance: f64,
    method: ShadowPriceMethod,
    solver: Solver,
}

impl Default for DualityAnalyzer {
    fn default() -> Self {
        Self {
            binding_tolerance: DEFAULT_BINDING_TOLERANCE,
            method: ShadowPriceMethod::Dual,
            solver: Solver::new(),
        }
    }
}

impl DualityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(solver: &SolverConfig, analysis: &AnalysisConfig) -> Self {
        Self {
            binding_tolerance: solver.binding_tolerance,
            method: analysis.method(),
            solver: Solver::from_config(solver),
        }
    }

    pub fn with_method(mut self, method: ShadowPriceMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_binding_tolerance(mut self, tol: f64) -> Self {
        self.binding_tolerance = tol;
        self
    }

    /// Solver used for finite-difference re-solves
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Classify every constraint and price the binding ones.
    ///
    /// Returns an empty table unless `solution` is an optimal solution of `problem`.
    pub fn analyze(&self, problem: &Problem, solution: &Solution) -> ShadowPriceTable {
        let Some(objective) = solution.objective_value else {
            return ShadowPriceTable::default();
        };
        if !solution.is_optimal() || solution.values.len() != problem.num_variables() {
            warn!(status = ?solution.status, "no optimal point to analyze");
            return ShadowPriceTable::default();
        }

        let direction_word = match problem.direction() {
            Direction::Maximize => "objective",
            Direction::Minimize => "cost",
        };

        let constraints = problem
            .constraints()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let consumed = c.consumed(&solution.values);
                let slack = c.slack(consumed);
                let binding = is_binding(slack, self.binding_tolerance);
                let shadow_price = if binding {
                    self.price(problem, solution, i, objective)
                } else {
                    0.0
                };

                let interpretation = if !binding {
                    format!("Non-binding constraint ({:.4} unused)", slack)
                } else if shadow_price.abs() < self.binding_tolerance {
                    "Binding, but relaxing it does not change the optimum".to_string()
                } else {
                    let verb = if shadow_price > 0.0 { "increase" } else { "decrease" };
                    format!(
                        "Relaxing {} by 1 unit would {} the {} by {:.4}",
                        c.label,
                        verb,
                        direction_word,
                        shadow_price.abs()
                    )
                };

                ConstraintReport {
                    label: c.label.clone(),
                    op: c.op,
                    limit: c.limit,
                    consumed,
                    slack,
                    binding,
                    shadow_price,
                    interpretation,
                }
            })
            .collect();

        let reduced_costs = problem
            .variables()
            .iter()
            .enumerate()
            .map(|(j, v)| {
                let is_basic = solution.basic.get(j).copied().unwrap_or(false);
                ReducedCost {
                    variable: v.name.clone(),
                    value: solution.values[j],
                    reduced_cost: solution.reduced_costs.get(j).copied().unwrap_or(0.0),
                    is_basic,
                }
            })
            .collect();

        ShadowPriceTable {
            constraints,
            reduced_costs,
        }
    }

    fn price(&self, problem: &Problem, solution: &Solution, index: usize, objective: f64) -> f64 {
        let dual = solution.duals.get(index).copied().unwrap_or(0.0);
        match self.method {
            ShadowPriceMethod::Dual => dual,
            ShadowPriceMethod::FiniteDifference { step } => {
                let relaxed = problem.with_relaxed_limit(index, step);
                let resolved = self.solver.solve(&relaxed);
                match resolved.objective_value {
                    Some(value) if resolved.is_optimal() => {
                        let slope = (value - objective) / step;
                        debug!(
                            constraint = %problem.constraints()[index].label,
                            slope,
                            dual,
                            "finite-difference shadow price"
                        );
                        slope
                    }
                    _ => {
                        warn!(
                            constraint = %problem.constraints()[index].label,
                            status = ?resolved.status,
                            "relaxed re-solve not optimal, using dual value"
                        );
                        dual
                    }
                }
            }
        }
    }
}
