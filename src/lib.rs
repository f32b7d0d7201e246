//! Unitcommit
//!
//! Genetic-algorithm solver for the thermal unit commitment problem: decide
//! which generating units run in each period of a planning horizon so that
//! demand and spinning reserve are covered at minimum fuel plus start-up
//! cost, while respecting minimum up and down times.
//!
//! # Architecture
//!
//! - [`model`]: unit and scenario data, validated once up front
//! - [`chromosome`]: `units x periods` commitment matrices, individuals, populations
//! - [`repair`]: forces schedules back into min up/down-time feasibility
//! - [`dispatch`]: per-period economic dispatch via `unitcommit-dispatch`
//! - [`fitness`]: dispatch cost + start-up cost + infeasibility penalties, memoized
//! - [`operators`], [`selection`], [`warm_start`], [`hill_climb`]: GA building blocks
//! - [`engine`]: the generational loop and its state machine
//! - [`expected_cost`]: scoring a fixed schedule under uncertain demand
//!
//! # Example
//!
//! ```rust
//! use unitcommit::{GAConfig, InitialStatus, ScenarioSpec, UnitSpec};
//!
//! let units = vec![
//!     UnitSpec::new("U1", 50.0, 200.0)
//!         .with_cost(100.0, 20.0, 0.01)
//!         .with_startup_cost(200.0)
//!         .with_min_up_down(2, 2)
//!         .with_initial(InitialStatus::online(2)),
//!     UnitSpec::new("U2", 20.0, 100.0).with_cost(50.0, 25.0, 0.02),
//! ];
//! let scenario = ScenarioSpec::new(vec![120.0, 180.0, 100.0], vec![10.0; 3]).unwrap();
//! let config = GAConfig::default().with_population_size(10).with_generations(10);
//!
//! let result = unitcommit::run(scenario, units, config).unwrap();
//! assert_eq!(result.best.periods(), 3);
//! ```

pub mod chromosome;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod expected_cost;
pub mod fitness;
pub mod hill_climb;
pub mod model;
pub mod operators;
pub mod repair;
pub mod selection;
pub mod warm_start;

pub use chromosome::{Chromosome, Individual, Population};
pub use config::{GAConfig, HillClimbConfig, InitStrategy};
pub use dispatch::{DispatchResult, EconomicDispatchEvaluator};
pub use engine::{EngineState, FinalResult, GAEngine, Outcome, TerminationReason};
pub use error::{UcError, UcResult};
pub use expected_cost::{expected_cost, ExpectedCost};
pub use fitness::{Evaluation, FitnessEvaluator};
pub use model::{ColdStart, InitialStatus, QuadraticCost, ScenarioSpec, UnitId, UnitSpec};
pub use operators::GeneticOperators;
pub use repair::{count_violations, FeasibilityRepairer};
pub use selection::TournamentSelection;
pub use unitcommit_dispatch::{DispatchMethod, LambdaConfig};

/// Solves a unit commitment instance with the GA and returns the best
/// schedule found.
pub fn run(scenario: ScenarioSpec, units: Vec<UnitSpec>, config: GAConfig) -> UcResult<FinalResult> {
    GAEngine::new(scenario, units, config)?.run()
}
