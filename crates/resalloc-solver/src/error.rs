use thiserror::Error;

/// Structural problems with a problem instance, reported before any solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Problem has no decision variables")]
    NoVariables,
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),
    #[error("Duplicate constraint label: {0}")]
    DuplicateConstraint(String),
    #[error("Unknown variable '{name}' referenced in {context}")]
    UnknownVariable { context: String, name: String },
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),
    #[error("{context} has {found} coefficients but the problem has {expected} variables")]
    CoefficientLength {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("Variable {variable} has negative lower bound {lower}")]
    NegativeLowerBound { variable: String, lower: f64 },
    #[error("Variable {variable} has upper bound {upper} below lower bound {lower}")]
    InvertedBounds {
        variable: String,
        lower: f64,
        upper: f64,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("Problems differ in {what}: {base} vs {perturbed}")]
    ShapeMismatch {
        what: String,
        base: String,
        perturbed: String,
    },
}
