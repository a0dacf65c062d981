//! Named problem definitions.
//!
//! This is the shape in which callers describe a problem: variables by name,
//! objective and constraint coefficients as name -> number maps. Compiling a
//! definition resolves every name into the dense vectors used by [`Problem`].

use std::collections::{BTreeMap, HashMap};

use crate::error::ModelError;
use crate::problem::{Constraint, ConstraintOp, Direction, Objective, Problem, Variable};

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemDefinition {
    pub variables: Vec<VariableDefinition>,
    pub objective: ObjectiveDefinition,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<ConstraintDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableDefinition {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, alias = "lowerBound"))]
    pub lower_bound: f64,
    #[cfg_attr(feature = "serde", serde(default, alias = "upperBound"))]
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveDefinition {
    pub direction: Direction,
    /// Variables missing from this map get a zero coefficient
    #[cfg_attr(feature = "serde", serde(default))]
    pub coefficients: BTreeMap<String, f64>,
}

impl Default for ObjectiveDefinition {
    fn default() -> Self {
        Self {
            direction: Direction::Maximize,
            coefficients: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintDefinition {
    pub label: String,
    pub coefficients: BTreeMap<String, f64>,
    #[cfg_attr(feature = "serde", serde(alias = "op"))]
    pub operator: ConstraintOp,
    pub limit: f64,
}

impl Problem {
    pub fn builder() -> ProblemBuilder {
        ProblemBuilder::new()
    }

    /// Resolve variable names and build a validated problem
    pub fn from_definition(definition: &ProblemDefinition) -> Result<Problem, ModelError> {
        let mut index = HashMap::new();
        let mut variables = Vec::with_capacity(definition.variables.len());
        for (j, v) in definition.variables.iter().enumerate() {
            if index.insert(v.name.as_str(), j).is_some() {
                return Err(ModelError::DuplicateVariable(v.name.clone()));
            }
            variables.push(Variable::bounded(v.name.clone(), v.lower_bound, v.upper_bound));
        }

        let n = variables.len();
        let coefficients = resolve(&index, n, "objective", &definition.objective.coefficients)?;
        let objective = Objective {
            direction: definition.objective.direction,
            coefficients,
        };

        let constraints = definition
            .constraints
            .iter()
            .map(|c| {
                let context = format!("constraint {}", c.label);
                let coefficients = resolve(&index, n, &context, &c.coefficients)?;
                Ok(Constraint::new(c.label.clone(), coefficients, c.operator, c.limit))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Problem::new(variables, objective, constraints)
    }
}

fn resolve(
    index: &HashMap<&str, usize>,
    n: usize,
    context: &str,
    named: &BTreeMap<String, f64>,
) -> Result<Vec<f64>, ModelError> {
    let mut dense = vec![0.0; n];
    for (name, &coef) in named {
        let Some(&j) = index.get(name.as_str()) else {
            return Err(ModelError::UnknownVariable {
                context: context.to_string(),
                name: name.clone(),
            });
        };
        dense[j] = coef;
    }
    Ok(dense)
}

impl TryFrom<&ProblemDefinition> for Problem {
    type Error = ModelError;

    fn try_from(definition: &ProblemDefinition) -> Result<Self, Self::Error> {
        Problem::from_definition(definition)
    }
}

/// Fluent construction of a [`Problem`] by variable name
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    definition: ProblemDefinition,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a non-negative variable with no upper bound
    pub fn variable(self, name: impl Into<String>) -> Self {
        self.bounded_variable(name, 0.0, None)
    }

    pub fn bounded_variable(mut self, name: impl Into<String>, lower: f64, upper: Option<f64>) -> Self {
        self.definition.variables.push(VariableDefinition {
            name: name.into(),
            lower_bound: lower,
            upper_bound: upper,
        });
        self
    }

    pub fn maximize<I, S>(self, coefficients: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.objective(Direction::Maximize, coefficients)
    }

    pub fn minimize<I, S>(self, coefficients: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.objective(Direction::Minimize, coefficients)
    }

    fn objective<I, S>(mut self, direction: Direction, coefficients: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.definition.objective = ObjectiveDefinition {
            direction,
            coefficients: coefficients.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        };
        self
    }

    pub fn constraint<I, S>(mut self, label: impl Into<String>, coefficients: I, op: ConstraintOp, limit: f64) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.definition.constraints.push(ConstraintDefinition {
            label: label.into(),
            coefficients: coefficients.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            operator: op,
            limit,
        });
        self
    }

    pub fn definition(&self) -> &ProblemDefinition {
        &self.definition
    }

    pub fn build(self) -> Result<Problem, ModelError> {
        Problem::from_definition(&self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_resolves_names() {
        let problem = Problem::builder()
            .variable("phones")
            .bounded_variable("tablets", 1.0, Some(50.0))
            .maximize([("tablets", 12.0), ("phones", 8.0)])
            .constraint("Labor Hours", [("phones", 1.0), ("tablets", 2.0)], ConstraintOp::Le, 320.0)
            .build()
            .unwrap();

        assert_eq!(problem.variable_names(), vec!["phones", "tablets"]);
        assert_eq!(problem.objective().coefficients, vec![8.0, 12.0]);
        assert_eq!(problem.constraints()[0].coefficients, vec![1.0, 2.0]);
        assert_eq!(problem.variables()[1].upper, Some(50.0));
    }

    #[test]
    fn test_missing_objective_coefficient_is_zero() {
        let problem = Problem::builder()
            .variable("a")
            .variable("b")
            .maximize([("a", 3.0)])
            .constraint("cap", [("b", 1.0)], ConstraintOp::Le, 2.0)
            .build()
            .unwrap();

        assert_eq!(problem.objective().coefficients, vec![3.0, 0.0]);
    }

    #[test]
    fn test_unknown_variable_names_the_field() {
        let err = Problem::builder()
            .variable("a")
            .maximize([("a", 1.0)])
            .constraint("Material", [("b", 1.0)], ConstraintOp::Le, 2.0)
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            ModelError::UnknownVariable {
                context: "constraint Material".to_string(),
                name: "b".to_string(),
            }
        );
        assert_eq!(err.to_string(), "Unknown variable 'b' referenced in constraint Material");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "variables": [{"name": "x1"}, {"name": "x2", "upperBound": 10}],
            "objective": {"direction": "maximize", "coefficients": {"x1": 3, "x2": 2}},
            "constraints": [
                {"label": "sum", "coefficients": {"x1": 1, "x2": 1}, "operator": "<=", "limit": 4},
                {"label": "floor", "coefficients": {"x1": 1}, "operator": "ge", "limit": 1}
            ]
        }"#;
        let definition: ProblemDefinition = serde_json::from_str(json).unwrap();
        let problem = Problem::try_from(&definition).unwrap();

        assert_eq!(problem.direction(), Direction::Maximize);
        assert_eq!(problem.variables()[1].upper, Some(10.0));
        assert_eq!(problem.constraints()[1].op, ConstraintOp::Ge);
    }
}
