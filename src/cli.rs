use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Route minimization for the VRPTW by ejection search")]
pub struct ProgramArguments {
    #[arg(help = "problem file (Solomon format)")]
    pub problem_file: Option<String>,

    #[arg(help = "where to write the solution")]
    pub solution_file: Option<String>,

    #[arg(long, help = "rng seed")]
    pub seed: Option<i128>,

    #[command(flatten)]
    pub solver: SolverArguments,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum LogLevel {
    None,
    Normal,
    Verbose,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::None => LevelFilter::Off,
            LogLevel::Normal => LevelFilter::Info,
            LogLevel::Verbose => LevelFilter::Debug,
        }
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct SolverArguments {
    #[arg(long = "beta_correction", help = "enables the beta-correction mechanism")]
    pub beta_correction: bool,
    #[arg(long = "log_level", value_enum, default_value = "verbose")]
    pub log_level: LogLevel,
    #[arg(
        long = "n_near",
        default_value = "100",
        help = "number of neighbours examined per customer"
    )]
    pub n_near: usize,
    #[arg(long = "k_max", default_value = "5", help = "maximum number of ejected customers")]
    pub k_max: usize,
    #[arg(long = "t_max", help = "time limit in seconds (default: unlimited)")]
    pub t_max: Option<u64>,
    #[arg(
        long = "i_rand",
        default_value = "1000",
        help = "number of random moves per perturbation"
    )]
    pub i_rand: usize,
    #[arg(long = "lower_bound", default_value = "0", help = "stop at this number of routes")]
    pub lower_bound: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        ProgramArguments::command().debug_assert()
    }

    #[test]
    fn underscore_flags_with_and_without_equals() -> anyhow::Result<()> {
        let args = ProgramArguments::try_parse_from([
            "eama-vrptw",
            "c101.txt",
            "c101.sol",
            "--beta_correction",
            "--log_level=normal",
            "--n_near",
            "20",
            "--k_max=3",
            "--t_max=60",
        ])?;
        assert_eq!(args.problem_file.as_deref(), Some("c101.txt"));
        assert_eq!(args.solution_file.as_deref(), Some("c101.sol"));
        assert!(args.solver.beta_correction);
        assert_eq!(args.solver.log_level, LogLevel::Normal);
        assert_eq!(args.solver.n_near, 20);
        assert_eq!(args.solver.k_max, 3);
        assert_eq!(args.solver.t_max, Some(60));
        assert_eq!(args.solver.i_rand, 1000);
        assert_eq!(args.solver.lower_bound, 0);
        Ok(())
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let args = ProgramArguments::try_parse_from(["eama-vrptw"])?;
        assert!(args.problem_file.is_none());
        assert!(!args.solver.beta_correction);
        assert_eq!(args.solver.log_level.level_filter(), LevelFilter::Debug);
        assert_eq!(args.solver.t_max, None);
        assert!(ProgramArguments::try_parse_from(["eama-vrptw", "a", "b", "--k_max=x"]).is_err());
        Ok(())
    }
}
