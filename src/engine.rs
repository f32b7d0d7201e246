//! Generational GA loop
//!
//! The engine moves through three states:
//!
//! ```text
//! Initializing --initialize()--> Running --step()...--> Terminated
//! ```
//!
//! All randomness flows from one master ChaCha stream seeded from
//! [`GAConfig::seed`]. The master draws one sub-seed per initial individual
//! and per offspring pair slot, in slot order, before any slot runs. Each
//! slot then owns its own stream, so slots can run on the rayon pool or in a
//! plain loop and still produce bit-identical populations.

use crate::chromosome::{Chromosome, Individual, Population};
use crate::config::{GAConfig, InitStrategy};
use crate::dispatch::DispatchResult;
use crate::error::{UcError, UcResult};
use crate::fitness::{Evaluation, FitnessEvaluator};
use crate::hill_climb::EliteHillClimber;
use crate::model::{ScenarioSpec, UnitId, UnitSpec};
use crate::operators::GeneticOperators;
use crate::repair::FeasibilityRepairer;
use crate::selection::{elites, TournamentSelection};
use crate::warm_start::{perturbed, priority_list_schedule};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Initializing,
    Running,
    Terminated,
}

/// Why the generational loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// All configured generations ran
    MaxGenerations,
    /// The global best did not improve for `stall_generations` generations
    Stalled,
    /// The wall-clock budget was spent
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// At least one feasible schedule was evaluated during the run
    Feasible,
    /// No feasible schedule was found; the lowest-fitness one is returned
    BestEffortInfeasible,
}

/// Answer of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub best: Chromosome,
    pub fitness: f64,
    pub feasible: bool,
    pub outcome: Outcome,
    pub evaluation: Evaluation,
    /// Dispatch of the best schedule, one entry per period
    pub dispatch: Vec<DispatchResult>,
    /// Lowest-fitness feasible schedule seen, which differs from `best` when
    /// penalties are too weak to rank every infeasible schedule last
    pub best_feasible: Option<Chromosome>,
    pub best_feasible_fitness: Option<f64>,
    /// Global best fitness after initialization, then after every generation
    pub history: Vec<f64>,
    pub generations: usize,
    pub termination: TerminationReason,
    /// Unit identifiers in chromosome row order
    pub unit_ids: Vec<UnitId>,
}

impl FinalResult {
    /// Commitment row of `unit`, if it is in the fleet.
    pub fn commitment(&self, unit: &str) -> Option<Vec<bool>> {
        let row = self.unit_ids.iter().position(|id| id.as_str() == unit)?;
        Some(self.best.row(row).to_vec())
    }

    pub fn total_cost(&self) -> f64 {
        self.evaluation.operating_cost + self.evaluation.startup_cost
    }
}

pub struct GAEngine {
    config: GAConfig,
    evaluator: FitnessEvaluator,
    operators: GeneticOperators,
    selection: TournamentSelection,
    rng: ChaCha8Rng,
    state: EngineState,
    population: Population,
    best: Option<Individual>,
    best_feasible: Option<Individual>,
    history: Vec<f64>,
    generation: usize,
    stalled_for: usize,
    started: Option<Instant>,
    termination: Option<TerminationReason>,
}

impl GAEngine {
    /// Validates the inputs; the GA does not start on invalid data.
    pub fn new(scenario: ScenarioSpec, units: Vec<UnitSpec>, config: GAConfig) -> UcResult<Self> {
        let evaluator = FitnessEvaluator::new(units, scenario, &config)?;
        Ok(Self {
            operators: GeneticOperators::new(&config),
            selection: TournamentSelection::new(config.tournament_size),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            state: EngineState::Initializing,
            population: Population::default(),
            best: None,
            best_feasible: None,
            history: Vec::new(),
            generation: 0,
            stalled_for: 0,
            started: None,
            termination: None,
            evaluator,
            config,
        })
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Best individual seen so far.
    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Best feasible individual seen so far.
    pub fn best_feasible(&self) -> Option<&Individual> {
        self.best_feasible.as_ref()
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Generations completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Builds, repairs and evaluates the initial population. Calling it on a
    /// running engine does nothing.
    pub fn initialize(&mut self) -> UcResult<()> {
        match self.state {
            EngineState::Terminated => return Err(UcError::EngineTerminated),
            EngineState::Running => return Ok(()),
            EngineState::Initializing => {}
        }

        let units = self.evaluator.units().len();
        let periods = self.evaluator.scenario().horizon();
        info!(
            "Starting GA: {} units, {} periods, population {}, {} generations, seed {}",
            units, periods, self.config.population_size, self.config.generations, self.config.seed
        );
        self.started = Some(Instant::now());

        let seeds: Vec<u64> = (0..self.config.population_size).map(|_| self.rng.gen()).collect();
        let base = match self.config.init {
            InitStrategy::Random => None,
            InitStrategy::PriorityList { perturbation } => Some((
                priority_list_schedule(self.evaluator.units(), self.evaluator.scenario()),
                perturbation,
            )),
        };

        let repairer = FeasibilityRepairer::new(self.evaluator.units());
        let individuals = self.run_slots(&seeds, |slot, seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let chromosome = match &base {
                None => Chromosome::random(units, periods, &mut rng),
                Some((schedule, _)) if slot == 0 => schedule.clone(),
                Some((schedule, perturbation)) => perturbed(schedule, *perturbation, &mut rng),
            };
            self.scored(&repairer, chromosome)
        });

        self.population = Population::from_individuals(individuals);
        self.best = self.population.best().cloned();
        self.track_feasible();
        if let Some(best) = &self.best {
            self.history.push(best.rank_fitness());
        }
        self.state = EngineState::Running;
        Ok(())
    }

    /// Runs one generation. Returns `Ok(false)` once the engine has
    /// terminated and `Err(EngineTerminated)` if stepped again after that.
    /// An engine still initializing is initialized first.
    pub fn step(&mut self) -> UcResult<bool> {
        match self.state {
            EngineState::Terminated => return Err(UcError::EngineTerminated),
            EngineState::Initializing => self.initialize()?,
            EngineState::Running => {}
        }

        if let Some(reason) = self.stop_reason() {
            self.terminate(reason);
            return Ok(false);
        }

        self.evolve();

        if let Some(reason) = self.stop_reason() {
            self.terminate(reason);
            return Ok(false);
        }
        Ok(true)
    }

    /// Runs to termination and returns the final answer.
    pub fn run(mut self) -> UcResult<FinalResult> {
        self.initialize()?;
        while self.step()? {}
        self.result().ok_or(UcError::EngineTerminated)
    }

    /// Final answer, available once the engine has terminated.
    pub fn result(&self) -> Option<FinalResult> {
        if self.state != EngineState::Terminated {
            return None;
        }
        let best = self.best.as_ref()?;
        let termination = self.termination?;
        let evaluation = self.evaluator.evaluation(&best.chromosome);

        Some(FinalResult {
            best: best.chromosome.clone(),
            fitness: evaluation.fitness,
            feasible: evaluation.feasible,
            outcome: if self.best_feasible.is_some() {
                Outcome::Feasible
            } else {
                Outcome::BestEffortInfeasible
            },
            best_feasible: self.best_feasible.as_ref().map(|b| b.chromosome.clone()),
            best_feasible_fitness: self.best_feasible.as_ref().map(|b| b.rank_fitness()),
            evaluation,
            dispatch: self.evaluator.dispatch_schedule(&best.chromosome),
            history: self.history.clone(),
            generations: self.generation,
            termination,
            unit_ids: self.evaluator.units().iter().map(|u| u.id.clone()).collect(),
        })
    }

    fn evolve(&mut self) {
        // Bounds the cache to one generation of offspring.
        self.evaluator.clear_cache();

        let elite_count = self.config.elitism;
        let offspring_needed = self.config.population_size - elite_count;
        let pairs = offspring_needed.div_ceil(2);
        let seeds: Vec<u64> = (0..pairs).map(|_| self.rng.gen()).collect();

        let repairer = FeasibilityRepairer::new(self.evaluator.units());
        let population = &self.population;
        let children = self.run_slots(&seeds, |_, seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let first = self.selection.select(population, &mut rng);
            let second = self.selection.select(population, &mut rng);
            let (a, b) = self.operators.crossover(&first.chromosome, &second.chromosome, &mut rng);

            [a, b].map(|child| {
                let child = self.operators.mutate(child, &mut rng);
                let child = self.operators.window_operators(child, &mut rng);
                self.scored(&repairer, child)
            })
        });

        let mut next = elites(&self.population, elite_count);
        next.extend(children.into_iter().flatten().take(offspring_needed));
        self.population = Population::from_individuals(next);

        if self.config.hill_climb.enabled {
            if let Some(index) = self.population.best_index() {
                let climber = EliteHillClimber::new(&self.evaluator, self.config.hill_climb.clone());
                let climbed = climber.climb(&self.population.individuals()[index], &mut self.rng);
                self.population.replace(index, climbed);
            }
        }

        self.generation += 1;
        self.track_feasible();
        let generation_best = self.population.best().cloned();
        let improved = match (&generation_best, &self.best) {
            (Some(candidate), Some(best)) => candidate.rank_fitness() < best.rank_fitness(),
            (Some(_), None) => true,
            (None, _) => false,
        };
        if improved {
            self.best = generation_best;
            self.stalled_for = 0;
        } else {
            self.stalled_for += 1;
        }

        let best_fitness = self.best.as_ref().map_or(f64::INFINITY, |b| b.rank_fitness());
        self.history.push(best_fitness);
        debug!(
            "Generation {}: best fitness {:.4}, {} of {} feasible",
            self.generation,
            best_fitness,
            self.population.feasible_count(),
            self.population.len()
        );
    }

    fn track_feasible(&mut self) {
        let candidate = self
            .population
            .iter()
            .filter(|ind| ind.feasible)
            .min_by(|a, b| a.compare(b));
        if let Some(candidate) = candidate {
            let improved = self
                .best_feasible
                .as_ref()
                .map_or(true, |known| candidate.rank_fitness() < known.rank_fitness());
            if improved {
                self.best_feasible = Some(candidate.clone());
            }
        }
    }

    fn stop_reason(&self) -> Option<TerminationReason> {
        if self.generation >= self.config.generations {
            return Some(TerminationReason::MaxGenerations);
        }
        if let Some(limit) = self.config.stall_generations {
            if self.stalled_for >= limit {
                return Some(TerminationReason::Stalled);
            }
        }
        match (self.config.time_limit, self.started) {
            (Some(limit), Some(started)) if started.elapsed() >= limit => Some(TerminationReason::TimeLimit),
            _ => None,
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        self.state = EngineState::Terminated;
        self.termination = Some(reason);

        match (&self.best, &self.best_feasible) {
            (Some(best), Some(_)) => info!(
                "GA finished after {} generations ({:?}): best fitness {:.4}",
                self.generation,
                reason,
                best.rank_fitness()
            ),
            (Some(best), None) => warn!(
                "GA finished after {} generations ({:?}) without a feasible schedule; best effort fitness {:.4}",
                self.generation,
                reason,
                best.rank_fitness()
            ),
            (None, _) => warn!("GA finished without evaluating any schedule"),
        }
    }

    fn scored(&self, repairer: &FeasibilityRepairer<'_>, chromosome: Chromosome) -> Individual {
        let chromosome = repairer.repaired(chromosome);
        let (fitness, feasible) = self.evaluator.evaluate(&chromosome);
        Individual::evaluated(chromosome, fitness, feasible)
    }

    /// Runs one closure per slot seed, on the rayon pool when parallel
    /// evaluation is enabled. Output order always follows slot order.
    fn run_slots<T, F>(&self, seeds: &[u64], slot: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, u64) -> T + Sync + Send,
    {
        if self.config.parallel {
            seeds.par_iter().enumerate().map(|(i, &seed)| slot(i, seed)).collect()
        } else {
            seeds.iter().enumerate().map(|(i, &seed)| slot(i, seed)).collect()
        }
    }
}
