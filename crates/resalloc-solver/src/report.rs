//! Serializable result records keyed by variable name and constraint label.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::duality::{ConstraintReport, ShadowPriceTable};
use crate::integer::{IntegerSolution, IntegerStatus};
use crate::sensitivity::{Comparison, ComparisonOutcome};
use crate::solution::{ConstraintViolation, Solution, SolveStatus};

#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub feasible: bool,
    pub status: SolveStatus,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    pub values: BTreeMap<String, f64>,
    pub constraint_report: Vec<ConstraintReport>,
    /// Reduced cost of each variable
    pub reduced_costs: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ConstraintViolation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_result: Option<IntegerReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegerReport {
    pub feasible: bool,
    pub status: IntegerStatus,
    pub values: BTreeMap<String, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_gap: Option<f64>,
    pub candidates_examined: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub outcome: ComparisonOutcome,
    pub base_status: SolveStatus,
    pub perturbed_status: SolveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_objective: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perturbed_objective: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_change_percent: Option<f64>,
    pub variable_deltas: BTreeMap<String, ValueDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueDelta {
    pub base: f64,
    pub perturbed: f64,
    pub delta: f64,
}

impl SolveReport {
    pub fn new(solution: &Solution, prices: &ShadowPriceTable, integer: Option<&IntegerSolution>) -> Self {
        Self {
            feasible: solution.is_feasible(),
            status: solution.status,
            iterations: solution.iterations,
            objective_value: solution.objective_value,
            values: solution
                .named_values()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            constraint_report: prices.constraints.clone(),
            reduced_costs: prices
                .reduced_costs
                .iter()
                .map(|r| (r.variable.clone(), r.reduced_cost))
                .collect(),
            violations: solution.violations.clone(),
            integer_result: integer.map(IntegerReport::from),
        }
    }
}

impl From<&IntegerSolution> for IntegerReport {
    fn from(integer: &IntegerSolution) -> Self {
        Self {
            feasible: integer.feasible,
            status: integer.status,
            values: integer
                .variables
                .iter()
                .cloned()
                .zip(integer.values.iter().copied())
                .collect(),
            objective_value: integer.objective_value,
            objective_gap: integer.objective_gap,
            relative_gap: integer.relative_gap,
            candidates_examined: integer.candidates_examined,
            truncated: integer.truncated,
        }
    }
}

impl From<&Comparison> for ComparisonReport {
    fn from(comparison: &Comparison) -> Self {
        Self {
            outcome: comparison.outcome,
            base_status: comparison.base.status,
            perturbed_status: comparison.perturbed.status,
            base_objective: comparison.base.objective_value,
            perturbed_objective: comparison.perturbed.objective_value,
            objective_delta: comparison.objective_delta,
            objective_change_percent: comparison.objective_change_percent,
            variable_deltas: comparison
                .variable_deltas
                .iter()
                .map(|d| {
                    let delta = ValueDelta {
                        base: d.base,
                        perturbed: d.perturbed,
                        delta: d.delta,
                    };
                    (d.variable.clone(), delta)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duality::DualityAnalyzer;
    use crate::integer::IntegerResolver;
    use crate::scenario::ProductionMix;
    use crate::sensitivity::SensitivityEngine;
    use crate::simplex::Solver;

    #[test]
    fn test_solve_report_json_is_keyed() {
        let problem = ProductionMix::default().problem().unwrap();
        let solution = Solver::new().solve(&problem);
        let prices = DualityAnalyzer::new().analyze(&problem, &solution);
        let integer = IntegerResolver::new().round_to_feasible(&problem, &solution);

        let report = SolveReport::new(&solution, &prices, Some(&integer));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["feasible"], true);
        assert_eq!(json["status"], "optimal");
        assert!((json["values"]["phones"].as_f64().unwrap() - 320.0).abs() < 1e-6);
        assert_eq!(json["constraint_report"][0]["label"], "Labor Hours");
        assert_eq!(json["constraint_report"][0]["binding"], true);
        assert_eq!(json["integer_result"]["status"], "rounded");
        assert_eq!(json["integer_result"]["values"]["tablets"], 0);
        assert!(json.get("violations").is_none());
    }

    #[test]
    fn test_infeasible_report_lists_violations() {
        let problem = crate::Problem::builder()
            .variable("x1")
            .maximize([("x1", 1.0)])
            .constraint("at least", [("x1", 1.0)], crate::ConstraintOp::Ge, 10.0)
            .constraint("at most", [("x1", 1.0)], crate::ConstraintOp::Le, 5.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem);
        let prices = DualityAnalyzer::new().analyze(&problem, &solution);

        let json = serde_json::to_value(SolveReport::new(&solution, &prices, None)).unwrap();
        assert_eq!(json["feasible"], false);
        assert_eq!(json["status"], "infeasible");
        assert!(json.get("objective_value").is_none());
        assert!(!json["violations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_comparison_report() {
        let base = ProductionMix::default().problem().unwrap();
        let doubled = ProductionMix {
            workers: 80.0,
            ..Default::default()
        }
        .problem()
        .unwrap();
        let comparison = SensitivityEngine::new().compare(&base, &doubled).unwrap();

        let json = serde_json::to_value(ComparisonReport::from(&comparison)).unwrap();
        assert_eq!(json["outcome"], "compared");
        assert!((json["variable_deltas"]["phones"]["delta"].as_f64().unwrap() - 180.0).abs() < 1e-6);
        assert!((json["objective_delta"].as_f64().unwrap() - 1_440_000.0).abs() < 1e-3);
    }
}
