mod config;
mod definition;
mod duality;
mod error;
mod integer;
mod problem;
pub mod scenario;
mod sensitivity;
mod simplex;
mod solution;

#[cfg(feature = "serde")]
pub mod report;

pub use config::{
    AnalysisConfig, DEFAULT_BINDING_TOLERANCE, DEFAULT_FINITE_DIFFERENCE_STEP, DEFAULT_MAX_CANDIDATES,
    DEFAULT_MAX_ITERATIONS, DEFAULT_PIVOT_TOLERANCE, DEFAULT_SEARCH_RADIUS, IntegerConfig, ShadowPriceMethod,
    SolverConfig,
};
pub use definition::{ConstraintDefinition, ObjectiveDefinition, ProblemBuilder, ProblemDefinition, VariableDefinition};
pub use duality::{ConstraintReport, DualityAnalyzer, ReducedCost, ShadowPriceTable};
pub use error::ModelError;
pub use integer::{IntegerResolver, IntegerSolution, IntegerStatus};
pub use problem::{Constraint, ConstraintOp, Direction, Objective, Problem, Variable};
pub use sensitivity::{Comparison, ComparisonOutcome, Perturbation, SensitivityEngine, SweepPoint, VariableDelta};
pub use simplex::Solver;
pub use solution::{ConstraintUsage, ConstraintViolation, Solution, SolveStatus, find_violations, is_binding, measure_usage};
