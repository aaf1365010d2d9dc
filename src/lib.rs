//! Tournament Scheduler Library
//!
//! Single round-robin scheduling for geographically spread teams, with
//! local search that minimizes the distance teams travel.
//!
//! # Features
//!
//! - Haversine distance matrix from team coordinates
//! - Circle-method schedule generation, with optional home/away balancing
//! - Chained-tour travel evaluation
//! - Validators for structure, away streaks, repeaters and home/away balance
//! - Reversible move primitives (round swap, match swap, venue flip, pairing-set swap)
//! - Hill climbing, simulated annealing and greedy swap optimizers
//! - Exhaustive venue assignment for small tournaments behind a solver trait
//!
//! # Example
//!
//! ```no_run
//! use tourney_scheduler::distance::DistanceMatrix;
//! use tourney_scheduler::optimizers::{optimize, AnnealingConfig, Strategy};
//! use tourney_scheduler::schedule::build_balanced_schedule;
//! use tourney_scheduler::team::{generate_teams, TeamGenerationConfig};
//!
//! let teams = generate_teams(10, &TeamGenerationConfig::default(), 42).unwrap();
//! let matrix = DistanceMatrix::from_teams(&teams);
//! let baseline = build_balanced_schedule(teams.len()).unwrap();
//!
//! let strategy = Strategy::SimulatedAnnealing(AnnealingConfig::default());
//! let result = optimize(&baseline, &matrix, &strategy, 42).unwrap();
//!
//! println!("Travel: {:.2} km -> {:.2} km", result.baseline_score, result.score);
//! ```

pub mod error;
pub mod team;
pub mod distance;
pub mod schedule;
pub mod travel;
pub mod validators;
pub mod moves;
pub mod optimizers;
pub mod exact;

pub use distance::DistanceMatrix;
pub use error::{Error, Result};
pub use schedule::{build_balanced_schedule, build_schedule, MatchSlot, Round, Schedule};
pub use team::Team;
pub use travel::{evaluate_travel, TravelReport};
pub use validators::{validate, ValidationReport};
pub use optimizers::{optimize, OptimizationResult, Strategy};
