use std::collections::HashSet;
use std::fmt;

use crate::error::ModelError;

/// A decision variable: a non-negative quantity chosen by the solver
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Variable {
    /// Variable name (unique within a problem)
    pub name: String,
    /// Lower bound, never negative
    pub lower: f64,
    /// Optional upper bound
    pub upper: Option<f64>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: None,
        }
    }

    pub fn bounded(name: impl Into<String>, lower: f64, upper: Option<f64>) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }
}

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[cfg_attr(feature = "serde", serde(rename = "max", alias = "maximize"))]
    Maximize,
    #[cfg_attr(feature = "serde", serde(rename = "min", alias = "minimize"))]
    Minimize,
}

impl Direction {
    /// +1 for maximization, -1 for minimization
    pub fn sign(self) -> f64 {
        match self {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        }
    }

    /// How much better `a` is than `b` in this direction (positive means better)
    pub fn improvement(self, a: f64, b: f64) -> f64 {
        self.sign() * (a - b)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Objective {
    /// Maximize or minimize
    pub direction: Direction,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
}

impl Objective {
    pub fn maximize(coefficients: Vec<f64>) -> Self {
        Self {
            direction: Direction::Maximize,
            coefficients,
        }
    }

    pub fn minimize(coefficients: Vec<f64>) -> Self {
        Self {
            direction: Direction::Minimize,
            coefficients,
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        dot(&self.coefficients, values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<=", alias = "le"))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">=", alias = "ge"))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "=", alias = "eq", alias = "=="))]
    Eq,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        };
        f.pad(symbol)
    }
}

/// A linear resource constraint `coefficients . x {<=, =, >=} limit`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Constraint {
    /// Human-readable label, unique within a problem
    pub label: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side limit
    pub limit: f64,
}

impl Constraint {
    pub fn new(label: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, limit: f64) -> Self {
        Self {
            label: label.into(),
            coefficients,
            op,
            limit,
        }
    }

    /// Amount of the resource used by `values`
    pub fn consumed(&self, values: &[f64]) -> f64 {
        dot(&self.coefficients, values)
    }

    /// Remaining room before the constraint is violated.
    ///
    /// `<=` and `=`: limit - consumed. `>=`: consumed - limit.
    /// Negative slack means the constraint is violated.
    pub fn slack(&self, consumed: f64) -> f64 {
        match self.op {
            ConstraintOp::Le | ConstraintOp::Eq => self.limit - consumed,
            ConstraintOp::Ge => consumed - self.limit,
        }
    }

    /// Direction in which moving the limit loosens the constraint
    pub fn relaxation_sign(&self) -> f64 {
        match self.op {
            ConstraintOp::Le | ConstraintOp::Eq => 1.0,
            ConstraintOp::Ge => -1.0,
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let slack = self.slack(self.consumed(values));
        match self.op {
            ConstraintOp::Le | ConstraintOp::Ge => slack >= -tolerance,
            ConstraintOp::Eq => slack.abs() <= tolerance,
        }
    }
}

/// Represents an immutable linear programming problem instance
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    variables: Vec<Variable>,
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl Problem {
    /// Validate and build a problem from dense coefficient vectors
    pub fn new(
        variables: Vec<Variable>,
        objective: Objective,
        constraints: Vec<Constraint>,
    ) -> Result<Self, ModelError> {
        let problem = Self {
            variables,
            objective,
            constraints,
        };
        problem.validate()?;
        Ok(problem)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.variables.is_empty() {
            return Err(ModelError::NoVariables);
        }

        let mut names = HashSet::new();
        for v in &self.variables {
            if !names.insert(v.name.as_str()) {
                return Err(ModelError::DuplicateVariable(v.name.clone()));
            }
            if !v.lower.is_finite() {
                return Err(ModelError::NonFinite(format!("lower bound of {}", v.name)));
            }
            if v.lower < 0.0 {
                return Err(ModelError::NegativeLowerBound {
                    variable: v.name.clone(),
                    lower: v.lower,
                });
            }
            if let Some(upper) = v.upper {
                if !upper.is_finite() {
                    return Err(ModelError::NonFinite(format!("upper bound of {}", v.name)));
                }
                if upper < v.lower {
                    return Err(ModelError::InvertedBounds {
                        variable: v.name.clone(),
                        lower: v.lower,
                        upper,
                    });
                }
            }
        }

        let n = self.variables.len();
        check_coefficients("objective", &self.objective.coefficients, n, &self.variables)?;

        let mut labels = HashSet::new();
        for c in &self.constraints {
            if !labels.insert(c.label.as_str()) {
                return Err(ModelError::DuplicateConstraint(c.label.clone()));
            }
            let context = format!("constraint {}", c.label);
            check_coefficients(&context, &c.coefficients, n, &self.variables)?;
            if !c.limit.is_finite() {
                return Err(ModelError::NonFinite(format!("limit of {context}")));
            }
        }

        Ok(())
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn direction(&self) -> Direction {
        self.objective.direction
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn constraint_index(&self, label: &str) -> Option<usize> {
        self.constraints.iter().position(|c| c.label == label)
    }

    /// Objective value at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Whether `values` lies inside the variable bounds and satisfies every constraint
    pub fn is_feasible_point(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within_bounds = self.variables.iter().zip(values).all(|(v, &x)| {
            x >= v.lower - tolerance && v.upper.is_none_or(|u| x <= u + tolerance)
        });
        within_bounds && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }

    /// Check that `other` has the same variables and constraint labels in the same order
    pub fn ensure_same_shape(&self, other: &Problem) -> Result<(), ModelError> {
        let base = self.variable_names();
        let perturbed = other.variable_names();
        if base != perturbed {
            return Err(ModelError::ShapeMismatch {
                what: "variables".to_string(),
                base: base.join(", "),
                perturbed: perturbed.join(", "),
            });
        }

        let base: Vec<&str> = self.constraints.iter().map(|c| c.label.as_str()).collect();
        let perturbed: Vec<&str> = other.constraints.iter().map(|c| c.label.as_str()).collect();
        if base != perturbed {
            return Err(ModelError::ShapeMismatch {
                what: "constraints".to_string(),
                base: base.join(", "),
                perturbed: perturbed.join(", "),
            });
        }

        let ops = |p: &Problem| p.constraints.iter().map(|c| c.op.to_string()).collect::<Vec<_>>();
        let (base, perturbed) = (ops(self), ops(other));
        if base != perturbed {
            return Err(ModelError::ShapeMismatch {
                what: "operators".to_string(),
                base: base.join(", "),
                perturbed: perturbed.join(", "),
            });
        }

        Ok(())
    }

    /// A copy of this problem with one constraint's limit moved by `delta`
    /// in its relaxing direction. A negative `delta` tightens it.
    pub fn with_relaxed_limit(&self, index: usize, delta: f64) -> Problem {
        let mut relaxed = self.clone();
        let c = &mut relaxed.constraints[index];
        c.limit += c.relaxation_sign() * delta;
        relaxed
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<Variable>, &mut Objective, &mut Vec<Constraint>) {
        (&mut self.variables, &mut self.objective, &mut self.constraints)
    }

    pub(crate) fn revalidated(self) -> Result<Self, ModelError> {
        self.validate()?;
        Ok(self)
    }
}

fn check_coefficients(
    context: &str,
    coefficients: &[f64],
    expected: usize,
    variables: &[Variable],
) -> Result<(), ModelError> {
    if coefficients.len() != expected {
        return Err(ModelError::CoefficientLength {
            context: context.to_string(),
            expected,
            found: coefficients.len(),
        });
    }
    if let Some(j) = coefficients.iter().position(|x| !x.is_finite()) {
        return Err(ModelError::NonFinite(format!(
            "{context} coefficient for {}",
            variables[j].name
        )));
    }
    Ok(())
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
