use anyhow::Result;
use clap::ValueEnum;
use resalloc_solver::report::{ComparisonReport, IntegerReport, SolveReport};
use resalloc_solver::{ComparisonOutcome, IntegerStatus, Problem, SolveStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_word(status: SolveStatus) -> &'static str {
    match status {
        SolveStatus::Optimal => "OPTIMAL",
        SolveStatus::Infeasible => "INFEASIBLE",
        SolveStatus::Unbounded => "UNBOUNDED",
        SolveStatus::IterationLimit => "ITERATION LIMIT",
    }
}

pub fn print_solve(report: &SolveReport) {
    println!("Status: {}", status_word(report.status));

    match report.status {
        SolveStatus::Optimal => {}
        SolveStatus::Infeasible => {
            println!("No allocation satisfies all constraints.");
            if !report.violations.is_empty() {
                println!();
                println!("Closest attempt violates:");
                for v in &report.violations {
                    println!("  - {}", v.description);
                }
            }
            return;
        }
        SolveStatus::Unbounded => {
            println!("The objective can be improved without limit.");
            return;
        }
        SolveStatus::IterationLimit => {
            println!("Gave up after {} pivots without proving optimality.", report.iterations);
            return;
        }
    }

    if let Some(objective) = report.objective_value {
        println!("Objective: {:.2}", objective);
    }
    println!();

    println!("Allocation:");
    for (name, value) in &report.values {
        println!("  {:20} {:14.4}", name, value);
    }
    println!();

    println!("Constraints:");
    for c in &report.constraint_report {
        let marker = if c.binding { "BINDING" } else { "" };
        println!(
            "  {:20} {:14.4} {:2} {:14.4}  slack {:12.4}  {:7}  price {:10.4}",
            c.label, c.consumed, c.op, c.limit, c.slack, marker, c.shadow_price
        );
        if c.binding {
            println!("    {}", c.interpretation);
        }
    }

    let entering: Vec<_> = report
        .reduced_costs
        .iter()
        .filter(|(_, rc)| rc.abs() > 0.001)
        .collect();
    if !entering.is_empty() {
        println!();
        println!("Reduced costs (variables left at their bound):");
        for (name, rc) in entering {
            println!("  {:20} objective changes by {:.4} per unit forced in", name, rc);
        }
    }

    if let Some(integer) = &report.integer_result {
        println!();
        print_integer(integer);
    }
}

fn print_integer(integer: &IntegerReport) {
    let how = match integer.status {
        IntegerStatus::Rounded => "rounded",
        IntegerStatus::Searched => "neighborhood search",
        IntegerStatus::Exhausted => "search exhausted",
        IntegerStatus::NoContinuousOptimum => "no continuous optimum",
    };
    println!("Whole-unit allocation ({how}):");
    if !integer.feasible {
        println!("  No feasible whole-unit allocation found near the optimum.");
        if integer.truncated {
            println!("  Search stopped after {} candidates.", integer.candidates_examined);
        }
        return;
    }
    for (name, value) in &integer.values {
        println!("  {:20} {:14}", name, value);
    }
    if let (Some(objective), Some(gap)) = (integer.objective_value, integer.objective_gap) {
        println!("  Objective: {:.2} (gap {:.2})", objective, gap);
    }
}

pub fn print_comparison(report: &ComparisonReport) {
    match report.outcome {
        ComparisonOutcome::Compared => {}
        ComparisonOutcome::BecameInfeasible => {
            println!("The change makes the problem infeasible.");
            return;
        }
        ComparisonOutcome::BecameFeasible => {
            println!("The change makes an infeasible problem solvable.");
            if let Some(objective) = report.perturbed_objective {
                println!("New objective: {:.2}", objective);
            }
            return;
        }
        ComparisonOutcome::NotComparable { base, perturbed } => {
            println!(
                "Not comparable: base is {}, perturbed is {}.",
                status_word(base),
                status_word(perturbed)
            );
            return;
        }
    }

    println!("{:20} {:>14} {:>14} {:>14}", "", "base", "perturbed", "change");
    for (name, d) in &report.variable_deltas {
        println!("{:20} {:14.4} {:14.4} {:+14.4}", name, d.base, d.perturbed, d.delta);
    }
    if let (Some(base), Some(perturbed), Some(delta)) =
        (report.base_objective, report.perturbed_objective, report.objective_delta)
    {
        println!("{:20} {:14.2} {:14.2} {:+14.2}", "objective", base, perturbed, delta);
    }
    if let Some(percent) = report.objective_change_percent {
        println!();
        println!("Objective changed by {:+.2}%", percent);
    }
}

pub fn print_summary(problem: &Problem) {
    println!("  {} variables", problem.num_variables());
    println!("  {} constraints", problem.num_constraints());
    println!("  direction: {:?}", problem.direction());
    for v in problem.variables() {
        match v.upper {
            Some(upper) => println!("    {:20} [{}, {}]", v.name, v.lower, upper),
            None => println!("    {:20} [{}, inf)", v.name, v.lower),
        }
    }
}
