use log::info;
use took::{Timer, Took};

use crate::cli::SolverArguments;
use crate::problem::vrptw::VRPTWInstance;
use crate::solution::SolutionDescription;
use crate::solver::eama::{EamaSolver, Parameters};
use crate::utils::logging::format_log_method_solution_timed;
use crate::utils::{Countdown, Random, TimeLimit};

pub mod eama;
pub mod penalty_counter;

pub struct SolverResult {
    pub solution: SolutionDescription,
    pub time: Took,
}

pub fn eama(instance: &VRPTWInstance, args: &SolverArguments, rng: &mut Random) -> SolverResult {
    let timer = Timer::new();
    let countdown = Countdown::new(timer.clone(), TimeLimit::from_seconds(args.t_max));

    let mut solver = EamaSolver::with_instance(
        instance,
        Parameters {
            n_near: args.n_near,
            k_max: args.k_max,
            i_rand: args.i_rand,
            beta_correction: args.beta_correction,
            lower_bound: args.lower_bound,
        },
    );
    let sol = solver.solve(rng, &countdown);
    info!("{}", format_log_method_solution_timed("eama", &sol, timer.took()));

    SolverResult {
        solution: sol.to_description(),
        time: timer.took(),
    }
}
