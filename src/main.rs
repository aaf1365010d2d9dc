//! Tournament Scheduler - Command Line Interface
//!
//! Builds a round-robin schedule for a set of teams and optimizes it for travel.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ordered_float::OrderedFloat;
use tourney_scheduler::distance::DistanceMatrix;
use tourney_scheduler::exact::{ExactSolver, ExhaustiveConfig, ExhaustiveVenueSolver, Objective};
use tourney_scheduler::moves::MoveKind;
use tourney_scheduler::optimizers::{
    optimize, AnnealingConfig, GreedySwapConfig, HillClimbingConfig, Strategy,
};
use tourney_scheduler::schedule::{build_balanced_schedule, build_schedule, Schedule};
use tourney_scheduler::team::{generate_teams, load_teams, Team, TeamGenerationConfig};
use tourney_scheduler::travel::evaluate_travel;
use tourney_scheduler::validators::{validate, DEFAULT_MAX_CONSECUTIVE_AWAY};
use tourney_scheduler::Result;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tourney-scheduler")]
#[command(version = "1.0")]
#[command(about = "Round-robin tournament scheduling with travel minimization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a schedule for total travel
    Solve {
        #[command(flatten)]
        teams: TeamSource,

        /// Optimizer to run
        #[arg(short, long, value_enum, default_value = "sa")]
        strategy: StrategyArg,

        /// Starting schedule
        #[arg(short, long, value_enum, default_value = "balanced")]
        baseline: Baseline,

        /// Iteration budget (defaults: 1000 for hc, 10000 for sa)
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Hill climbing: non-improving candidates before stopping
        #[arg(long, default_value = "100")]
        max_no_improve: usize,

        /// Annealing: initial temperature
        #[arg(long, default_value = "1.0")]
        temperature: f64,

        /// Annealing: temperature multiplier per iteration
        #[arg(long, default_value = "0.995")]
        cooling_rate: f64,

        /// Move kinds to sample from
        #[arg(long, value_enum, value_delimiter = ',')]
        moves: Vec<MoveArg>,

        /// Accept candidates that break the tournament rules
        #[arg(long)]
        no_validate: bool,

        /// Longest allowed run of away games
        #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_AWAY)]
        max_consecutive_away: usize,

        /// Random seed for the optimizer
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print per-team travel and the full schedule
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report distances, baseline travel and rule violations
    Analyze {
        #[command(flatten)]
        teams: TeamSource,

        #[arg(short, long, value_enum, default_value = "balanced")]
        baseline: Baseline,

        #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_AWAY)]
        max_consecutive_away: usize,
    },

    /// Exhaustively assign venues for a small tournament
    Exact {
        #[command(flatten)]
        teams: TeamSource,

        #[arg(short, long, value_enum, default_value = "raw")]
        baseline: Baseline,

        #[arg(long, value_enum, default_value = "chained")]
        objective: ObjectiveArg,

        /// Largest team count the solver accepts
        #[arg(long, default_value = "6")]
        max_teams: usize,

        #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_AWAY)]
        max_consecutive_away: usize,
    },
}

#[derive(Args)]
struct TeamSource {
    /// Team file (.json or .csv with id,name,lat,lon)
    #[arg(short, long)]
    teams: Option<PathBuf>,

    /// Number of random teams when no file is given
    #[arg(short = 'n', long, default_value = "10")]
    generate: usize,

    /// Seed for random team placement
    #[arg(long, default_value = "42")]
    team_seed: u64,

    /// Half-width of the random placement square in km
    #[arg(long, default_value = "20.0")]
    spread_km: f64,
}

impl TeamSource {
    fn load(&self) -> Result<Vec<Team>> {
        match &self.teams {
            Some(path) => {
                println!("Loading teams from {:?}...", path);
                load_teams(path)
            }
            None => {
                let config = TeamGenerationConfig { spread_km: self.spread_km, ..Default::default() };
                generate_teams(self.generate, &config, self.team_seed)
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum StrategyArg {
    /// Hill climbing
    Hc,
    /// Simulated annealing
    Sa,
    /// Deterministic first-improvement match swaps
    Greedy,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Baseline {
    /// Plain circle method
    Raw,
    /// Circle method with home/away balancing
    Balanced,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum MoveArg {
    SwapRounds,
    SwapMatches,
    FlipVenue,
    SwapPairingSet,
}

impl From<MoveArg> for MoveKind {
    fn from(arg: MoveArg) -> Self {
        match arg {
            MoveArg::SwapRounds => MoveKind::SwapRounds,
            MoveArg::SwapMatches => MoveKind::SwapMatches,
            MoveArg::FlipVenue => MoveKind::FlipVenue,
            MoveArg::SwapPairingSet => MoveKind::SwapPairingSet,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ObjectiveArg {
    Chained,
    Direct,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            teams,
            strategy,
            baseline,
            iterations,
            max_no_improve,
            temperature,
            cooling_rate,
            moves,
            no_validate,
            max_consecutive_away,
            seed,
            verbose,
        } => {
            let moves: Vec<MoveKind> = if moves.is_empty() {
                MoveKind::ALL.to_vec()
            } else {
                moves.into_iter().map(MoveKind::from).collect()
            };
            let strategy = match strategy {
                StrategyArg::Hc => Strategy::HillClimbing(HillClimbingConfig {
                    max_iterations: iterations.unwrap_or(1000),
                    max_no_improve,
                    validate: !no_validate,
                    max_consecutive_away,
                    moves,
                }),
                StrategyArg::Sa => Strategy::SimulatedAnnealing(AnnealingConfig {
                    initial_temperature: temperature,
                    cooling_rate,
                    max_iterations: iterations.unwrap_or(10000),
                    validate: !no_validate,
                    max_consecutive_away,
                    moves,
                }),
                StrategyArg::Greedy => Strategy::GreedySwap(GreedySwapConfig {
                    validate: !no_validate,
                    max_consecutive_away,
                }),
            };
            solve(&teams, baseline, &strategy, seed, verbose)
        }

        Commands::Analyze { teams, baseline, max_consecutive_away } => {
            analyze(&teams, baseline, max_consecutive_away)
        }

        Commands::Exact { teams, baseline, objective, max_teams, max_consecutive_away } => {
            let objective = match objective {
                ObjectiveArg::Chained => Objective::Chained,
                ObjectiveArg::Direct => Objective::Direct,
            };
            let config = ExhaustiveConfig { max_teams, max_consecutive_away, objective };
            solve_exact(&teams, baseline, config)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_baseline(n: usize, baseline: Baseline) -> Result<Schedule> {
    match baseline {
        Baseline::Raw => build_schedule(n),
        Baseline::Balanced => build_balanced_schedule(n),
    }
}

fn print_violations(schedule: &Schedule, n: usize, max_consecutive_away: usize) {
    let report = validate(schedule, n, max_consecutive_away);
    if report.is_ok() {
        println!("Constraints: all satisfied");
    } else {
        println!("Constraints: {} violation(s)", report.violations.len());
        for reason in report.reasons() {
            println!("  - {}", reason);
        }
    }
}

fn print_team_travel(teams: &[Team], schedule: &Schedule, matrix: &DistanceMatrix) {
    let report = evaluate_travel(schedule, matrix);
    println!("\nPer-team travel:");
    for (team, km) in teams.iter().zip(&report.per_team) {
        println!("  {:<12} {:>10.2} km", team.name, km);
    }
    if let Some((idx, km)) = report
        .per_team
        .iter()
        .enumerate()
        .max_by_key(|(_, km)| OrderedFloat(**km))
    {
        println!("Longest travel: {} ({:.2} km)", teams[idx].name, km);
    }
}

fn solve(source: &TeamSource, baseline: Baseline, strategy: &Strategy, seed: u64, verbose: bool) -> Result<()> {
    let teams = source.load()?;
    let matrix = DistanceMatrix::from_teams(&teams);
    let schedule = build_baseline(teams.len(), baseline)?;
    let max_consecutive_away = match strategy {
        Strategy::HillClimbing(c) => c.max_consecutive_away,
        Strategy::SimulatedAnnealing(c) => c.max_consecutive_away,
        Strategy::GreedySwap(c) => c.max_consecutive_away,
    };

    println!("Optimizing {} teams with {}...", teams.len(), strategy.name());
    let start = Instant::now();
    let result = optimize(&schedule, &matrix, strategy, seed)?;
    let elapsed = start.elapsed();

    let telemetry = &result.telemetry;
    println!("\n========== Results ==========");
    println!("Strategy: {}", telemetry.strategy);
    println!("Baseline travel: {:.2} km", result.baseline_score);
    println!("Best travel: {:.2} km", result.score);
    if result.baseline_score > 0.0 {
        println!(
            "Reduction: {:.2}%",
            (result.baseline_score - result.score) / result.baseline_score * 100.0
        );
    }
    println!("Iterations: {}", telemetry.iterations);
    println!(
        "Accepted: {}, infeasible: {}, rejected by validation: {}",
        telemetry.accepted, telemetry.infeasible, telemetry.rejected_by_validation
    );
    println!("Improvements: {}", telemetry.improvements.len());
    if let Some(t) = telemetry.final_temperature {
        println!("Final temperature: {:.6}", t);
    }
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    print_violations(&result.schedule, teams.len(), max_consecutive_away);

    if verbose {
        print_team_travel(&teams, &result.schedule, &matrix);
        println!("\n{}", result.schedule);
    }
    Ok(())
}

fn analyze(source: &TeamSource, baseline: Baseline, max_consecutive_away: usize) -> Result<()> {
    let teams = source.load()?;
    let matrix = DistanceMatrix::from_teams(&teams);
    let schedule = build_baseline(teams.len(), baseline)?;

    println!("========== Tournament Analysis ==========\n");
    println!("{}", matrix.statistics());

    println!("Baseline ({:?}): {} rounds, {} matches", baseline, schedule.len(), schedule.num_matches());
    let report = evaluate_travel(&schedule, &matrix);
    println!("Baseline travel: {:.2} km", report.total);
    print_violations(&schedule, teams.len(), max_consecutive_away);

    println!("\nHome/away counts:");
    for (team, (home, away)) in teams.iter().zip(schedule.home_away_counts(teams.len())) {
        println!("  {:<12} {:>3} home {:>3} away", team.name, home, away);
    }

    print_team_travel(&teams, &schedule, &matrix);
    Ok(())
}

fn solve_exact(source: &TeamSource, baseline: Baseline, config: ExhaustiveConfig) -> Result<()> {
    let teams = source.load()?;
    let matrix = DistanceMatrix::from_teams(&teams);
    let schedule = build_baseline(teams.len(), baseline)?;
    let max_consecutive_away = config.max_consecutive_away;
    let solver = ExhaustiveVenueSolver::new(config);

    if !solver.is_available() {
        println!("{} is not available in this build", solver.name());
        return Ok(());
    }

    println!("Solving {} teams with {}...", teams.len(), solver.name());
    let outcome = solver.solve(&schedule, &matrix)?;

    println!("\n========== Exact Results ==========");
    println!("Assignments explored: {}", outcome.explored);
    println!("Proven optimal: {}", outcome.proven_optimal);
    println!("Time: {:.4}s", outcome.elapsed.as_secs_f64());

    match &outcome.schedule {
        Some(best) => {
            println!("Objective ({}): {:.2} km", outcome.objective, outcome.objective_value);
            // the two objectives measure different things
            println!("Chained travel: {:.2} km", Objective::Chained.evaluate(best, &matrix));
            println!("Direct travel: {:.2} km", Objective::Direct.evaluate(best, &matrix));
            print_violations(best, teams.len(), max_consecutive_away);
            println!("\n{}", best);
        }
        None => println!("No venue assignment satisfies the constraints"),
    }
    Ok(())
}
