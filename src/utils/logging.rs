use took::Took;

use crate::solution::{Solution, SolutionDescription};

pub fn format_log_method_solution_timed(method: &str, sol: &Solution, took: Took) -> String {
    format!("{method} - {}, took: {took}", format_log_solution(sol))
}

/// `unrouted/routes/distance (feasible: ..)`
pub fn format_log_solution(sol: &Solution) -> String {
    format!(
        "{}/{}/{:.2} (feasible: {})",
        sol.ejection_pool.len() + sol.w.map_or(0, |_| 1),
        sol.num_routes(),
        sol.total_distance(),
        sol.is_feasible(),
    )
}

pub fn format_log_solution_desc(desc: &SolutionDescription) -> String {
    format!(
        "{}/{}",
        desc.number_of_unrouted_customers(),
        desc.number_of_routes(),
    )
}
