#![allow(dead_code)]

use clap::{CommandFactory, FromArgMatches};
use log::info;
use os_str_bytes::OsStrBytesExt;
use rand::random;
use took::Timer;

use crate::io::load_instance;
use crate::utils::create_seeded_rng;
use crate::utils::logging::format_log_solution_desc;
#[cfg(feature = "search_assertions")]
use crate::utils::validator::assert_valid_solution_description;

mod cli;
mod ejection;
mod io;
mod neighbourhood;
mod penalty;
mod problem;
mod solution;
mod solver;
mod utils;

fn main() -> anyhow::Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )?;
    let args = cli::ProgramArguments::from_arg_matches(
        &cli::ProgramArguments::command()
            .get_matches_from(args.iter().flat_map(|it| {
                it.split(" ").into_iter().collect::<Vec<_>>()
            }))
    )?;

    let (problem_file, solution_file) = match (&args.problem_file, &args.solution_file) {
        (Some(problem_file), Some(solution_file)) => (problem_file, solution_file),
        _ => {
            cli::ProgramArguments::command().print_help()?;
            return Ok(());
        }
    };

    env_logger::Builder::new()
        .filter_level(args.solver.log_level.level_filter())
        .parse_default_env()
        .init();
    info!("{:?}", &args);

    let mut rng = {
        let seed_value = args.seed.unwrap_or_else(|| random::<i128>().abs());
        info!("seed: {}", seed_value);
        create_seeded_rng(seed_value)
    };

    let load_timer = Timer::new();
    let instance = load_instance(problem_file)?;
    info!(
        "instance {} with {} customers loaded after {}",
        instance.name,
        instance.num_customers,
        load_timer.took()
    );

    let res = solver::eama(&instance, &args.solver, &mut rng);
    info!("finished after {}", res.time);
    info!(
        "best solution found: {} (distance: {:.2})",
        format_log_solution_desc(&res.solution),
        res.solution.total_distance(&instance)
    );

    #[cfg(feature = "search_assertions")]
    assert_valid_solution_description(&instance, &res.solution);

    println!("n_routes: {}", res.solution.number_of_routes());
    io::solution_writer::write_solution(solution_file.to_string(), &res.solution, &instance)?;
    info!("solution written to {}", solution_file);

    Ok(())
}
