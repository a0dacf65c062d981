use tracing::{debug, trace, warn};

use crate::config::SolverConfig;
use crate::problem::{ConstraintOp, Problem, dot};
use crate::solution::{Solution, SolveStatus, find_violations, measure_usage};

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_STREAK_LIMIT: usize = 50;

/// Two-phase simplex solver for linear programming problems.
///
/// Holds configuration only, so one solver can be shared between threads and
/// used for any number of independent solves.
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots across both phases before giving up
    max_iterations: usize,
    /// Tolerance for pivot elements and reduced costs
    tolerance: f64,
    /// Slack at or below which a constraint is binding
    binding_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.pivot_tolerance,
            binding_tolerance: config.binding_tolerance,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_binding_tolerance(mut self, tol: f64) -> Self {
        self.binding_tolerance = tol;
        self
    }

    pub fn binding_tolerance(&self) -> f64 {
        self.binding_tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &Problem) -> Solution {
        let mut tableau = Tableau::build(problem);
        let mut iterations = 0;
        debug!(
            rows = tableau.rows.len(),
            columns = tableau.rhs_col(),
            artificials = tableau.n_artificial,
            "built simplex tableau"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut iterations) {
                Phase1::Feasible => {}
                Phase1::Infeasible => {
                    let values = tableau.point();
                    let violations = find_violations(problem, &values, self.binding_tolerance);
                    debug!(iterations, violated = violations.len(), "problem is infeasible");
                    return Solution::infeasible(problem, violations, iterations);
                }
                Phase1::IterationLimit => {
                    warn!(iterations, "iteration limit reached in phase 1");
                    return Solution::iteration_limit(problem, iterations);
                }
            }
        }

        // Phase 2: Optimize, never letting artificials re-enter
        let art_start = tableau.art_start();
        match self.iterate(&mut tableau, art_start, &mut iterations) {
            Pivoting::Optimal => {}
            Pivoting::Unbounded => {
                debug!(iterations, "problem is unbounded");
                return Solution::unbounded(problem, iterations);
            }
            Pivoting::IterationLimit => {
                warn!(iterations, "iteration limit reached in phase 2");
                return Solution::iteration_limit(problem, iterations);
            }
        }

        let solution = self.extract_solution(&tableau, problem, iterations);
        debug!(
            iterations,
            objective = solution.objective_value,
            "found optimal solution"
        );
        solution
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> Phase1 {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let original = std::mem::replace(&mut tableau.data[obj_row], vec![0.0; n_cols]);
        for j in art_start..(n_cols - 1) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Make objective row consistent with basic artificial variables
        for i in 0..obj_row {
            if tableau.basis[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1, iterations) {
            Pivoting::Optimal => {}
            // The auxiliary objective is bounded by zero, so this only
            // happens through round-off
            Pivoting::Unbounded => return Phase1::Infeasible,
            Pivoting::IterationLimit => return Phase1::IterationLimit,
        }

        let rhs_col = tableau.rhs_col();
        let residual: f64 = (0..obj_row)
            .filter(|&i| tableau.basis[i] >= art_start)
            .map(|i| tableau.data[i][rhs_col])
            .sum();
        trace!(residual, "phase 1 finished");
        if residual > self.binding_tolerance {
            return Phase1::Infeasible;
        }

        self.drive_out_artificials(tableau);

        // Restore original objective and price out the basis
        tableau.data[obj_row] = original;
        for i in 0..obj_row {
            let basic = tableau.basis[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Phase1::Feasible
    }

    /// Pivot zero-level artificials out of the basis. A row with no usable
    /// column is redundant and keeps its artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.rows.len() {
            if tableau.basis[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                self.pivot(tableau, i, col);
            } else {
                trace!(row = i, "redundant row");
            }
        }
    }

    fn iterate(&self, tableau: &mut Tableau, col_limit: usize, iterations: &mut usize) -> Pivoting {
        let rhs_col = tableau.rhs_col();
        let mut degenerate_streak = 0;

        loop {
            let bland = degenerate_streak >= DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, col_limit, bland) else {
                return Pivoting::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Pivoting::Unbounded;
            };
            if *iterations >= self.max_iterations {
                return Pivoting::IterationLimit;
            }
            *iterations += 1;

            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            trace!(row = pivot_row, col = pivot_col, bland, "pivot");
            self.pivot(tableau, pivot_row, pivot_col);
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = &tableau.data[tableau.obj_row()];

        if bland {
            // Lowest index with an improving reduced cost
            return (0..col_limit).find(|&j| obj_row[j] > self.tolerance);
        }

        // Look for the most positive reduced cost (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &val) in obj_row.iter().enumerate().take(col_limit) {
            if val > max_val {
                max_val = val;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut best: Option<(f64, usize)> = None;
        for i in 0..tableau.rows.len() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            let better = match best {
                None => true,
                Some((min_ratio, row)) => {
                    ratio < min_ratio - self.tolerance
                        || ((ratio - min_ratio).abs() <= self.tolerance
                            && tableau.basis[i] < tableau.basis[row])
                }
            };
            if better {
                best = Some((ratio, i));
            }
        }

        best.map(|(_, row)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        // Update basic variable
        tableau.basis[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &Problem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();
        let obj_row = tableau.obj_row();
        let sign = problem.direction().sign();

        let values = tableau.point();
        let objective_value = problem.evaluate(&values);
        let constraints = measure_usage(problem, &values, self.binding_tolerance);

        // Dual of row i is -(reduced cost of its initial unit column). Undo
        // the row negation and the internal maximization, then express it
        // per unit of relaxation.
        let mut duals = vec![0.0; problem.num_constraints()];
        for row in &tableau.rows {
            if let RowOrigin::Constraint(k) = row.origin {
                let mut y = -tableau.data[obj_row][row.unit_col];
                if row.negated {
                    y = -y;
                }
                duals[k] = sign * y * problem.constraints()[k].relaxation_sign();
            }
        }

        let mut basic = vec![false; n_vars];
        for &b in &tableau.basis {
            if b < n_vars {
                basic[b] = true;
            }
        }
        let reduced_costs = (0..n_vars)
            .map(|j| if basic[j] { 0.0 } else { sign * tableau.data[obj_row][j] })
            .collect();

        Solution {
            status: SolveStatus::Optimal,
            variables: problem.variable_names(),
            values,
            objective_value: Some(objective_value),
            constraints,
            violations: Vec::new(),
            iterations,
            duals,
            reduced_costs,
            basic,
        }
    }
}

struct Tableau {
    /// Constraint rows followed by the objective row; the last column is the RHS
    data: Vec<Vec<f64>>,
    basis: Vec<usize>,
    rows: Vec<RowInfo>,
    lower: Vec<f64>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

struct RowInfo {
    origin: RowOrigin,
    /// Column holding +1 in this row of the initial tableau
    unit_col: usize,
    /// Row was multiplied by -1 to make its RHS non-negative
    negated: bool,
}

#[derive(Debug, Clone, Copy)]
enum RowOrigin {
    Constraint(usize),
    UpperBound,
}

struct StandardRow {
    coefficients: Vec<f64>,
    op: ConstraintOp,
    rhs: f64,
    origin: RowOrigin,
    negated: bool,
}

impl Tableau {
    fn build(problem: &Problem) -> Self {
        let n_vars = problem.num_variables();
        let lower: Vec<f64> = problem.variables().iter().map(|v| v.lower).collect();

        // Substitute x = x' + lower so every shifted variable starts at zero
        let mut standard: Vec<StandardRow> = Vec::new();
        for (i, c) in problem.constraints().iter().enumerate() {
            standard.push(StandardRow {
                coefficients: c.coefficients.clone(),
                op: c.op,
                rhs: c.limit - dot(&c.coefficients, &lower),
                origin: RowOrigin::Constraint(i),
                negated: false,
            });
        }
        for (j, v) in problem.variables().iter().enumerate() {
            if let Some(upper) = v.upper {
                let mut coefficients = vec![0.0; n_vars];
                coefficients[j] = 1.0;
                standard.push(StandardRow {
                    coefficients,
                    op: ConstraintOp::Le,
                    rhs: upper - v.lower,
                    origin: RowOrigin::UpperBound,
                    negated: false,
                });
            }
        }

        // RHS (ensure non-negative)
        for row in &mut standard {
            if row.rhs < 0.0 {
                row.rhs = -row.rhs;
                row.coefficients.iter_mut().for_each(|a| *a = -*a);
                row.op = match row.op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
                row.negated = true;
            }
        }

        let n_slack = standard.iter().filter(|r| r.op != ConstraintOp::Eq).count();
        let n_artificial = standard.iter().filter(|r| r.op != ConstraintOp::Le).count();
        let n_rows = standard.len();
        let total_cols = n_vars + n_slack + n_artificial + 1;

        let mut data = vec![vec![0.0; total_cols]; n_rows + 1];
        let mut basis = vec![0; n_rows];
        let mut rows = Vec::with_capacity(n_rows);

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, row) in standard.into_iter().enumerate() {
            data[i][..n_vars].copy_from_slice(&row.coefficients);
            data[i][total_cols - 1] = row.rhs;

            let unit_col = match row.op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    slack_idx += 1;
                    slack_idx - 1
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    artificial_idx += 1;
                    artificial_idx - 1
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    artificial_idx += 1;
                    artificial_idx - 1
                }
            };

            basis[i] = unit_col;
            rows.push(RowInfo {
                origin: row.origin,
                unit_col,
                negated: row.negated,
            });
        }

        // Objective row holds reduced costs of the internal maximization
        let sign = problem.direction().sign();
        for (j, &coef) in problem.objective().coefficients.iter().enumerate() {
            data[n_rows][j] = sign * coef;
        }

        Self {
            data,
            basis,
            rows,
            lower,
            n_vars,
            n_slack,
            n_artificial,
        }
    }

    fn obj_row(&self) -> usize {
        self.rows.len()
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    /// Current basic point in the original (unshifted) variables
    fn point(&self) -> Vec<f64> {
        let rhs_col = self.rhs_col();
        let mut values = self.lower.clone();
        for (i, &basic) in self.basis.iter().enumerate() {
            if basic < self.n_vars {
                let shifted = self.data[i][rhs_col];
                values[basic] += if shifted.abs() < 1e-12 { 0.0 } else { shifted };
            }
        }
        values
    }
}

enum Phase1 {
    Feasible,
    Infeasible,
    IterationLimit,
}

enum Pivoting {
    Optimal,
    Unbounded,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 3.0), ("y", 2.0)])
            .constraint("sum", [("x", 1.0), ("y", 1.0)], ConstraintOp::Le, 4.0)
            .constraint("x_max", [("x", 1.0)], ConstraintOp::Le, 3.0)
            .constraint("y_max", [("y", 1.0)], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.values[0], 3.0), "x = {} (expected 3)", solution.values[0]);
        assert!(close(solution.values[1], 1.0), "y = {} (expected 1)", solution.values[1]);
        assert!(close(solution.objective_value.unwrap(), 11.0));
        assert_eq!(solution.binding_constraints(), vec!["sum", "x_max"]);

        // Relaxing `sum` buys one more y (worth 2); relaxing `x_max` swaps a y for an x
        assert!(close(solution.duals[0], 2.0), "duals = {:?}", solution.duals);
        assert!(close(solution.duals[1], 1.0), "duals = {:?}", solution.duals);
        assert_eq!(solution.duals[2], 0.0);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .minimize([("x", 2.0), ("y", 3.0)])
            .constraint("sum", [("x", 1.0), ("y", 1.0)], ConstraintOp::Ge, 4.0)
            .constraint("x_max", [("x", 1.0)], ConstraintOp::Le, 3.0)
            .constraint("y_max", [("y", 1.0)], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.values[0], 3.0), "x = {} (expected 3)", solution.values[0]);
        assert!(close(solution.values[1], 1.0), "y = {} (expected 1)", solution.values[1]);
        assert!(close(solution.objective_value.unwrap(), 9.0));

        // Relaxing a cost problem lowers the cost
        assert!(close(solution.duals[0], -3.0), "duals = {:?}", solution.duals);
        assert!(close(solution.duals[1], -1.0), "duals = {:?}", solution.duals);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let problem = Problem::builder()
            .variable("x")
            .minimize([("x", 1.0)])
            .constraint("lower", [("x", 1.0)], ConstraintOp::Ge, 5.0)
            .constraint("upper", [("x", 1.0)], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(!solution.is_feasible());
        assert_eq!(solution.objective_value, None);
        assert_eq!(solution.violations.len(), 1);
        assert_eq!(solution.violations[0].constraint, "lower");
        assert!(close(solution.violations[0].violation_amount, 2.0));
    }

    #[test]
    fn test_unbounded() {
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0), ("y", 1.0)])
            .constraint("diff", [("x", 1.0), ("y", -1.0)], ConstraintOp::Le, 2.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Unbounded);
        assert!(solution.is_feasible());
        assert_eq!(solution.objective_value, None);
    }

    #[test]
    fn test_no_constraints() {
        let problem = Problem::builder()
            .variable("x")
            .maximize([("x", -1.0)])
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.values, vec![0.0]);

        let problem = Problem::builder()
            .variable("x")
            .maximize([("x", 1.0)])
            .build()
            .unwrap();
        assert_eq!(Solver::new().solve(&problem).status, SolveStatus::Unbounded);
    }

    #[test]
    fn test_equality_and_negative_limit() {
        // Maximize x + 2y subject to x + y = 10, x - y <= -2 (i.e. y >= x + 2)
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0), ("y", 2.0)])
            .constraint("total", [("x", 1.0), ("y", 1.0)], ConstraintOp::Eq, 10.0)
            .constraint("gap", [("x", 1.0), ("y", -1.0)], ConstraintOp::Le, -2.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.values[0], 0.0));
        assert!(close(solution.values[1], 10.0));
        assert!(close(solution.objective_value.unwrap(), 20.0));
        // One more unit of total is worth one more y
        assert!(close(solution.duals[0], 2.0), "duals = {:?}", solution.duals);
        assert_eq!(solution.duals[1], 0.0);
    }

    #[test]
    fn test_variable_bounds() {
        // Maximize x + y with 2 <= x <= 3, y <= 1.5 and x + y <= 10
        let problem = Problem::builder()
            .bounded_variable("x", 2.0, Some(3.0))
            .bounded_variable("y", 0.0, Some(1.5))
            .maximize([("x", 1.0), ("y", 1.0)])
            .constraint("cap", [("x", 1.0), ("y", 1.0)], ConstraintOp::Le, 10.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.values[0], 3.0));
        assert!(close(solution.values[1], 1.5));
        assert!(!solution.usage("cap").unwrap().binding);

        // A lower bound that pushes the point off the origin
        let problem = Problem::builder()
            .bounded_variable("x", 4.0, None)
            .minimize([("x", 1.0)])
            .constraint("cap", [("x", 1.0)], ConstraintOp::Le, 10.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem);
        assert!(close(solution.values[0], 4.0));
        assert!(close(solution.objective_value.unwrap(), 4.0));
    }

    #[test]
    fn test_degenerate_problem_terminates() {
        // Beale's example, which cycles under the textbook largest-coefficient rule
        let problem = Problem::builder()
            .variable("x4")
            .variable("x5")
            .variable("x6")
            .variable("x7")
            .maximize([("x4", 0.75), ("x5", -150.0), ("x6", 0.02), ("x7", -6.0)])
            .constraint("r1", [("x4", 0.25), ("x5", -60.0), ("x6", -0.04), ("x7", 9.0)], ConstraintOp::Le, 0.0)
            .constraint("r2", [("x4", 0.5), ("x5", -90.0), ("x6", -0.02), ("x7", 3.0)], ConstraintOp::Le, 0.0)
            .constraint("r3", [("x6", 1.0)], ConstraintOp::Le, 1.0)
            .build()
            .unwrap();

        let solution = Solver::new().with_max_iterations(500).solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.objective_value.unwrap(), 0.05));
    }

    #[test]
    fn test_iteration_limit_is_tagged() {
        let problem = Problem::builder()
            .variable("x")
            .maximize([("x", 1.0)])
            .constraint("cap", [("x", 1.0)], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().with_max_iterations(0).solve(&problem);

        assert_eq!(solution.status, SolveStatus::IterationLimit);
        assert!(!solution.is_optimal());
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_redundant_equalities() {
        // The second equality repeats the first
        let problem = Problem::builder()
            .variable("x")
            .variable("y")
            .maximize([("x", 1.0)])
            .constraint("a", [("x", 1.0), ("y", 1.0)], ConstraintOp::Eq, 4.0)
            .constraint("b", [("x", 2.0), ("y", 2.0)], ConstraintOp::Eq, 8.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(close(solution.objective_value.unwrap(), 4.0));
    }
}
