//! Ready-made allocation problems: a two-product production plan and a
//! three-asset portfolio.

use crate::error::ModelError;
use crate::problem::{ConstraintOp, Problem};
use crate::sensitivity::Perturbation;

pub const LABOR_HOURS: &str = "Labor Hours";
pub const MATERIAL_BUDGET: &str = "Material Budget";
pub const STORAGE_SPACE: &str = "Storage Space";

/// Daily smartphone/tablet production under labor, material and storage limits
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProductionMix {
    pub workers: f64,
    pub hours_per_worker: f64,
    pub phone_hours: f64,
    pub tablet_hours: f64,
    /// Material cost per unit, in rupees
    pub phone_material: f64,
    pub tablet_material: f64,
    /// Total material budget, in rupees
    pub material_budget: f64,
    /// Storage area in sq ft
    pub storage_space: f64,
    pub phone_space: f64,
    pub tablet_space: f64,
    pub phone_profit: f64,
    pub tablet_profit: f64,
}

impl Default for ProductionMix {
    fn default() -> Self {
        Self {
            workers: 40.0,
            hours_per_worker: 8.0,
            phone_hours: 1.0,
            tablet_hours: 2.0,
            phone_material: 3000.0,
            tablet_material: 6000.0,
            // 50 lakh
            material_budget: 5_000_000.0,
            storage_space: 1000.0,
            phone_space: 2.0,
            tablet_space: 4.0,
            phone_profit: 8000.0,
            tablet_profit: 12000.0,
        }
    }
}

impl ProductionMix {
    pub fn labor_hours(&self) -> f64 {
        self.workers * self.hours_per_worker
    }

    pub fn problem(&self) -> Result<Problem, ModelError> {
        Problem::builder()
            .variable("phones")
            .variable("tablets")
            .maximize([("phones", self.phone_profit), ("tablets", self.tablet_profit)])
            .constraint(
                LABOR_HOURS,
                [("phones", self.phone_hours), ("tablets", self.tablet_hours)],
                ConstraintOp::Le,
                self.labor_hours(),
            )
            .constraint(
                MATERIAL_BUDGET,
                [("phones", self.phone_material), ("tablets", self.tablet_material)],
                ConstraintOp::Le,
                self.material_budget,
            )
            .constraint(
                STORAGE_SPACE,
                [("phones", self.phone_space), ("tablets", self.tablet_space)],
                ConstraintOp::Le,
                self.storage_space,
            )
            .build()
    }
}

/// Parameter shifts for a production what-if question
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProductionWhatIf {
    /// Percent change of every per-unit material cost
    pub material_cost_change: f64,
    /// Workers added (or removed when negative)
    pub worker_change: f64,
    /// Percent change of per-phone profit
    pub phone_profit_change: f64,
    /// Percent change of per-tablet profit
    pub tablet_profit_change: f64,
}

impl ProductionWhatIf {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Perturbations of `base`'s problem that this what-if describes
    pub fn perturbations(&self, base: &ProductionMix) -> Vec<Perturbation> {
        let mut out = Vec::new();
        if self.material_cost_change != 0.0 {
            out.push(Perturbation::ScaleConstraint {
                constraint: MATERIAL_BUDGET.to_string(),
                factor: 1.0 + self.material_cost_change / 100.0,
            });
        }
        if self.worker_change != 0.0 {
            out.push(Perturbation::Limit {
                constraint: LABOR_HOURS.to_string(),
                value: (base.workers + self.worker_change) * base.hours_per_worker,
            });
        }
        if self.phone_profit_change != 0.0 {
            out.push(Perturbation::ScaleObjectiveCoefficient {
                variable: "phones".to_string(),
                factor: 1.0 + self.phone_profit_change / 100.0,
            });
        }
        if self.tablet_profit_change != 0.0 {
            out.push(Perturbation::ScaleObjectiveCoefficient {
                variable: "tablets".to_string(),
                factor: 1.0 + self.tablet_profit_change / 100.0,
            });
        }
        out
    }
}

/// Fully invested split across equity, bonds and fixed deposits.
///
/// Returns are annual percentages, so the objective is the portfolio's
/// expected return in percent. Limits are fractions of the total.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Portfolio {
    pub equity_return: f64,
    pub bond_return: f64,
    pub fd_return: f64,
    pub max_equity: f64,
    pub min_bonds: f64,
    pub min_fd: f64,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            equity_return: 12.0,
            bond_return: 7.0,
            fd_return: 5.0,
            max_equity: 0.6,
            min_bonds: 0.2,
            min_fd: 0.1,
        }
    }
}

impl Portfolio {
    pub fn problem(&self) -> Result<Problem, ModelError> {
        Problem::builder()
            .bounded_variable("equity", 0.0, Some(1.0))
            .bounded_variable("bonds", 0.0, Some(1.0))
            .bounded_variable("fixed_deposits", 0.0, Some(1.0))
            .maximize([
                ("equity", self.equity_return),
                ("bonds", self.bond_return),
                ("fixed_deposits", self.fd_return),
            ])
            .constraint(
                "Fully Invested",
                [("equity", 1.0), ("bonds", 1.0), ("fixed_deposits", 1.0)],
                ConstraintOp::Eq,
                1.0,
            )
            .constraint("Max Equity", [("equity", 1.0)], ConstraintOp::Le, self.max_equity)
            .constraint("Min Bonds", [("bonds", 1.0)], ConstraintOp::Ge, self.min_bonds)
            .constraint("Min FD", [("fixed_deposits", 1.0)], ConstraintOp::Ge, self.min_fd)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duality::DualityAnalyzer;
    use crate::sensitivity::{ComparisonOutcome, SensitivityEngine};
    use crate::simplex::Solver;

    #[test]
    fn test_default_production_mix() {
        let problem = ProductionMix::default().problem().unwrap();
        let solution = Solver::new().solve(&problem);

        assert!(solution.is_optimal());
        assert!((solution.value("phones").unwrap() - 320.0).abs() < 1e-6);
        assert!(solution.value("tablets").unwrap().abs() < 1e-6);
        assert!((solution.objective_value.unwrap() - 2_560_000.0).abs() < 1e-3);
        assert_eq!(solution.binding_constraints(), vec![LABOR_HOURS]);
    }

    #[test]
    fn test_empty_what_if_has_no_perturbations() {
        let what_if = ProductionWhatIf::default();
        assert!(what_if.is_empty());
        assert!(what_if.perturbations(&ProductionMix::default()).is_empty());
    }

    #[test]
    fn test_hiring_shifts_bottleneck_to_storage() {
        let mix = ProductionMix::default();
        let what_if = ProductionWhatIf {
            worker_change: 40.0,
            ..Default::default()
        };
        let base = mix.problem().unwrap();
        let comparison = SensitivityEngine::new()
            .what_if(&base, &what_if.perturbations(&mix))
            .unwrap();

        assert_eq!(comparison.outcome, ComparisonOutcome::Compared);
        assert!((comparison.perturbed.objective_value.unwrap() - 4_000_000.0).abs() < 1e-3);
        assert!(comparison.perturbed.usage(STORAGE_SPACE).unwrap().binding);
    }

    #[test]
    fn test_material_cost_change_scales_row() {
        let mix = ProductionMix::default();
        let what_if = ProductionWhatIf {
            material_cost_change: 10.0,
            ..Default::default()
        };
        let perturbed = mix.problem().unwrap().perturbed(&what_if.perturbations(&mix)).unwrap();
        let row = &perturbed.constraints()[1];
        assert!((row.coefficients[0] - 3300.0).abs() < 1e-9);
        assert!((row.coefficients[1] - 6600.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_portfolio() {
        let problem = Portfolio::default().problem().unwrap();
        let solution = Solver::new().solve(&problem);

        assert!(solution.is_optimal());
        let expected = [("equity", 0.6), ("bonds", 0.3), ("fixed_deposits", 0.1)];
        for (name, value) in expected {
            assert!((solution.value(name).unwrap() - value).abs() < 1e-9, "{name}");
        }
        assert!((solution.objective_value.unwrap() - 9.8).abs() < 1e-9);

        let table = DualityAnalyzer::new().analyze(&problem, &solution);
        assert!((table.get("Fully Invested").unwrap() - 7.0).abs() < 1e-9);
        assert!((table.get("Max Equity").unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(table.get("Min Bonds"), Some(0.0));
        assert!((table.get("Min FD").unwrap() - 2.0).abs() < 1e-9);
    }
}
