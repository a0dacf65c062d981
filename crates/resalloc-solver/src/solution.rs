use crate::problem::{ConstraintOp, Problem};

/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Solution status
    pub status: SolveStatus,
    /// Variable names, in problem order
    pub variables: Vec<String>,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value (only when optimal)
    pub objective_value: Option<f64>,
    /// Resource usage per constraint (empty unless optimal)
    pub constraints: Vec<ConstraintUsage>,
    /// Constraint violations at the least-infeasible point (populated when infeasible)
    pub violations: Vec<ConstraintViolation>,
    /// Simplex pivots performed
    pub iterations: usize,
    /// Objective change per unit relaxation of each constraint, from the final tableau
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) duals: Vec<f64>,
    /// Objective change per unit increase of each variable, from the final tableau
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) reduced_costs: Vec<f64>,
    /// Whether each variable ended in the basis
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) basic: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// No point satisfies every constraint
    Infeasible,
    /// The objective improves without limit inside the feasible region
    Unbounded,
    /// The pivot budget ran out before optimality was proven
    IterationLimit,
}

/// How much of a constraint's limit an allocation uses
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintUsage {
    pub label: String,
    pub consumed: f64,
    pub slack: f64,
    pub binding: bool,
}

/// Information about a violated constraint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintViolation {
    /// Constraint label
    pub constraint: String,
    /// Required value (the constraint limit)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Solution {
    pub(crate) fn without_point(problem: &Problem, status: SolveStatus, iterations: usize) -> Self {
        Self {
            status,
            variables: problem.variable_names(),
            values: Vec::new(),
            objective_value: None,
            constraints: Vec::new(),
            violations: Vec::new(),
            iterations,
            duals: Vec::new(),
            reduced_costs: Vec::new(),
            basic: Vec::new(),
        }
    }

    pub fn infeasible(problem: &Problem, violations: Vec<ConstraintViolation>, iterations: usize) -> Self {
        Self {
            violations,
            ..Self::without_point(problem, SolveStatus::Infeasible, iterations)
        }
    }

    pub fn unbounded(problem: &Problem, iterations: usize) -> Self {
        Self::without_point(problem, SolveStatus::Unbounded, iterations)
    }

    pub fn iteration_limit(problem: &Problem, iterations: usize) -> Self {
        Self::without_point(problem, SolveStatus::IterationLimit, iterations)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Whether some point satisfies every constraint. True for unbounded problems.
    pub fn is_feasible(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Unbounded)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        let j = self.variables.iter().position(|v| v == name)?;
        self.values.get(j).copied()
    }

    pub fn usage(&self, label: &str) -> Option<&ConstraintUsage> {
        self.constraints.iter().find(|c| c.label == label)
    }

    pub fn named_values(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Labels of constraints with no slack left
    pub fn binding_constraints(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| c.binding)
            .map(|c| c.label.as_str())
            .collect()
    }
}

/// Measure every constraint of `problem` at `values`.
pub fn measure_usage(problem: &Problem, values: &[f64], binding_tolerance: f64) -> Vec<ConstraintUsage> {
    problem
        .constraints()
        .iter()
        .map(|c| {
            let consumed = c.consumed(values);
            let slack = c.slack(consumed);
            ConstraintUsage {
                label: c.label.clone(),
                consumed,
                slack,
                binding: is_binding(slack, binding_tolerance),
            }
        })
        .collect()
}

/// Binding means |slack| <= tolerance; the boundary itself counts as binding.
pub fn is_binding(slack: f64, tolerance: f64) -> bool {
    slack.abs() <= tolerance
}

/// Constraints of `problem` that `values` violates, worst first
pub fn find_violations(problem: &Problem, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for c in problem.constraints() {
        if c.is_satisfied(values, tolerance) {
            continue;
        }
        let lhs = c.consumed(values);
        let amount = c.slack(lhs).abs();
        let description = match c.op {
            ConstraintOp::Le => {
                format!("{} exceeds maximum of {:.2} by {:.2}", c.label, c.limit, amount)
            }
            ConstraintOp::Ge => {
                format!("{} is below minimum of {:.2} by {:.2}", c.label, c.limit, amount)
            }
            ConstraintOp::Eq => {
                format!("{} requires exactly {:.2} but got {:.2}", c.label, c.limit, lhs)
            }
        };
        violations.push(ConstraintViolation {
            constraint: c.label.clone(),
            required: c.limit,
            actual: lhs,
            violation_amount: amount,
            description,
        });
    }

    violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_at_tolerance_is_binding() {
        // 0.25 and 0.5 are exact in binary, so the boundary is hit exactly
        assert!(is_binding(0.25, 0.25));
        assert!(is_binding(-0.25, 0.25));
        assert!(!is_binding(0.5, 0.25));
        assert!(is_binding(0.0, 0.0));
    }

    #[test]
    fn test_find_violations_sorted_worst_first() {
        let problem = Problem::builder()
            .variable("x")
            .maximize([("x", 1.0)])
            .constraint("small", [("x", 1.0)], ConstraintOp::Le, 9.0)
            .constraint("large", [("x", 1.0)], ConstraintOp::Ge, 15.0)
            .constraint("fine", [("x", 1.0)], ConstraintOp::Le, 20.0)
            .build()
            .unwrap();

        let violations = find_violations(&problem, &[10.0], 1e-9);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].constraint, "large");
        assert_eq!(violations[0].violation_amount, 5.0);
        assert_eq!(violations[1].constraint, "small");
        assert!(violations[1].description.contains("exceeds maximum"));
    }
}
