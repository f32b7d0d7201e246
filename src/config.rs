//! Genetic algorithm configuration

use crate::error::{UcError, UcResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use unitcommit_dispatch::LambdaConfig;

/// How the initial population is generated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum InitStrategy {
    /// Every gene is an independent fair coin flip.
    #[default]
    Random,
    /// Merit-order schedule (cheapest units first until demand plus reserve
    /// is covered). The first individual is the schedule itself, the others
    /// are copies with each bit flipped with probability `perturbation`.
    PriorityList { perturbation: f64 },
}

/// Local search applied to the best individual after every generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillClimbConfig {
    pub enabled: bool,
    /// Probability of also running the sliding swap-window climb.
    pub swap_window_probability: f64,
}

impl Default for HillClimbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            swap_window_probability: 0.3,
        }
    }
}

/// Configuration for the GA engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GAConfig {
    /// Population size P
    pub population_size: usize,
    /// Generations G
    pub generations: usize,
    pub crossover_probability: f64,
    /// Per-gene flip probability
    pub mutation_probability: f64,
    /// Elitism count E: best individuals copied unmodified each generation
    pub elitism: usize,
    pub seed: u64,
    pub tournament_size: usize,
    /// Cost per MW of reserve/demand shortfall
    pub penalty_weight: f64,
    /// Cost per min up/down-time violation in an unrepaired schedule
    pub violation_penalty: f64,
    /// Stop after this many generations without improvement
    pub stall_generations: Option<usize>,
    /// Wall-clock budget checked at generation boundaries
    pub time_limit: Option<Duration>,
    /// Produce and evaluate offspring on the rayon pool
    pub parallel: bool,
    pub init: InitStrategy,
    pub dispatch: LambdaConfig,
    /// Per-child probability of swapping two unit rows inside a random window
    pub swap_window_probability: f64,
    /// Per-child probability of overwriting a random window of one unit
    pub window_mutation_probability: f64,
    pub hill_climb: HillClimbConfig,
}

impl Default for GAConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            crossover_probability: 0.8,
            mutation_probability: 0.01,
            elitism: 2,
            seed: 42,
            tournament_size: 3,
            penalty_weight: 1e4,
            violation_penalty: 1e4,
            stall_generations: None,
            time_limit: None,
            parallel: true,
            init: InitStrategy::Random,
            dispatch: LambdaConfig::default(),
            swap_window_probability: 0.0,
            window_mutation_probability: 0.0,
            hill_climb: HillClimbConfig::default(),
        }
    }
}

impl GAConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p;
        self
    }

    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p;
        self
    }

    pub fn with_elitism(mut self, count: usize) -> Self {
        self.elitism = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    pub fn with_stall_generations(mut self, generations: usize) -> Self {
        self.stall_generations = Some(generations);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    pub fn with_window_operators(mut self, swap_window: f64, window_mutation: f64) -> Self {
        self.swap_window_probability = swap_window;
        self.window_mutation_probability = window_mutation;
        self
    }

    pub fn with_hill_climb(mut self, hill_climb: HillClimbConfig) -> Self {
        self.hill_climb = hill_climb;
        self
    }

    pub fn validate(&self) -> UcResult<()> {
        if self.population_size < 2 {
            return Err(UcError::InvalidConfig("population size must be at least 2".to_string()));
        }
        if self.elitism >= self.population_size {
            return Err(UcError::InvalidConfig(format!(
                "elitism {} leaves no room for offspring in a population of {}",
                self.elitism, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(UcError::InvalidConfig("tournament size must be at least 1".to_string()));
        }

        let probabilities = [
            ("crossover probability", self.crossover_probability),
            ("mutation probability", self.mutation_probability),
            ("swap window probability", self.swap_window_probability),
            ("window mutation probability", self.window_mutation_probability),
            ("hill climb swap window probability", self.hill_climb.swap_window_probability),
        ];
        for (name, p) in probabilities {
            check_probability(name, p)?;
        }
        if let InitStrategy::PriorityList { perturbation } = &self.init {
            check_probability("warm start perturbation", *perturbation)?;
        }

        for (name, weight) in [
            ("penalty weight", self.penalty_weight),
            ("violation penalty", self.violation_penalty),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(UcError::InvalidConfig(format!("{} must be a non-negative number", name)));
            }
        }

        let tolerance = self.dispatch.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 || self.dispatch.max_iterations == 0 {
            return Err(UcError::InvalidConfig(
                "dispatch tolerance and iteration cap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_probability(name: &str, p: f64) -> UcResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(UcError::InvalidConfig(format!("{} {} is outside [0, 1]", name, p)));
    }
    Ok(())
}
