//! Schedule fitness
//!
//! Fitness = fuel cost + start-up cost + penalty_weight x shortfall
//!         + violation_penalty x min up/down violations.
//!
//! Lower is better. Evaluations are cached on chromosome content so that
//! elites and duplicate offspring are never dispatched twice.

use crate::chromosome::Chromosome;
use crate::config::GAConfig;
use crate::dispatch::{DispatchResult, EconomicDispatchEvaluator};
use crate::error::UcResult;
use crate::model::{validate_fleet, ScenarioSpec, UnitSpec};
use crate::repair::count_violations;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Cost breakdown of one schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fitness: f64,
    pub feasible: bool,
    pub operating_cost: f64,
    pub startup_cost: f64,
    pub penalty: f64,
    /// Summed reserve/demand shortfall and min-load excess (MW)
    pub shortfall_mw: f64,
    pub violations: usize,
    pub infeasible_periods: usize,
}

impl Evaluation {
    fn rejected() -> Self {
        Self {
            fitness: f64::INFINITY,
            feasible: false,
            operating_cost: 0.0,
            startup_cost: 0.0,
            penalty: f64::INFINITY,
            shortfall_mw: 0.0,
            violations: 0,
            infeasible_periods: 0,
        }
    }
}

/// Fitness cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Scores commitment schedules against a fleet and scenario
pub struct FitnessEvaluator {
    units: Vec<UnitSpec>,
    scenario: ScenarioSpec,
    dispatcher: EconomicDispatchEvaluator,
    penalty_weight: f64,
    violation_penalty: f64,
    cache: RwLock<FxHashMap<Chromosome, Evaluation>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl FitnessEvaluator {
    pub fn new(units: Vec<UnitSpec>, scenario: ScenarioSpec, config: &GAConfig) -> UcResult<Self> {
        validate_fleet(&units)?;
        scenario.validate()?;
        config.validate()?;

        let dispatcher = EconomicDispatchEvaluator::new(config.dispatch.clone(), scenario.period_hours);
        Ok(Self {
            units,
            scenario,
            dispatcher,
            penalty_weight: config.penalty_weight,
            violation_penalty: config.violation_penalty,
            cache: RwLock::new(FxHashMap::default()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    pub fn units(&self) -> &[UnitSpec] {
        &self.units
    }

    pub fn scenario(&self) -> &ScenarioSpec {
        &self.scenario
    }

    pub fn dispatcher(&self) -> &EconomicDispatchEvaluator {
        &self.dispatcher
    }

    /// `(fitness, feasible)` of a schedule.
    pub fn evaluate(&self, chromosome: &Chromosome) -> (f64, bool) {
        let evaluation = self.evaluation(chromosome);
        (evaluation.fitness, evaluation.feasible)
    }

    /// Like [`evaluation`](Self::evaluation) but rejects chromosomes that do
    /// not match the fleet and horizon.
    pub fn checked_evaluation(&self, chromosome: &Chromosome) -> UcResult<Evaluation> {
        chromosome.check_shape(self.units.len(), self.scenario.horizon())?;
        Ok(self.evaluation(chromosome))
    }

    /// Full cost breakdown, served from the cache when available. A
    /// chromosome of the wrong shape scores infinitely bad.
    pub fn evaluation(&self, chromosome: &Chromosome) -> Evaluation {
        if chromosome.check_shape(self.units.len(), self.scenario.horizon()).is_err() {
            return Evaluation::rejected();
        }
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(chromosome) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return *hit;
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let evaluation = self.score(chromosome);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(chromosome.clone(), evaluation);
        }
        evaluation
    }

    /// Dispatch of every period, for reporting.
    pub fn dispatch_schedule(&self, chromosome: &Chromosome) -> Vec<DispatchResult> {
        (0..self.scenario.horizon())
            .map(|t| self.dispatch_period(chromosome, t))
            .collect()
    }

    pub fn dispatch_period(&self, chromosome: &Chromosome, period: usize) -> DispatchResult {
        let committed: Vec<&UnitSpec> = chromosome
            .committed_in(period)
            .filter_map(|u| self.units.get(u))
            .collect();
        self.dispatcher.dispatch(
            &committed,
            self.scenario.demand[period],
            self.scenario.reserve[period],
        )
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.read().map(|c| c.len()).unwrap_or(0),
        }
    }

    fn score(&self, chromosome: &Chromosome) -> Evaluation {
        let mut operating_cost = 0.0;
        let mut shortfall_mw = 0.0;
        let mut infeasible_periods = 0;

        for t in 0..self.scenario.horizon() {
            let result = self.dispatch_period(chromosome, t);
            operating_cost += result.cost;
            shortfall_mw += result.shortfall_mw();
            if !result.feasible {
                infeasible_periods += 1;
            }
        }

        let startup_cost = startup_costs(chromosome, &self.units);
        let violations = count_violations(chromosome, &self.units);
        let penalty = self.penalty_weight * shortfall_mw + self.violation_penalty * violations as f64;

        Evaluation {
            fitness: operating_cost + startup_cost + penalty,
            feasible: infeasible_periods == 0 && violations == 0,
            operating_cost,
            startup_cost,
            penalty,
            shortfall_mw,
            violations,
            infeasible_periods,
        }
    }
}

/// Start-up cost of every offline-to-online transition, the first period
/// compared against the initial status. Starts after a long enough outage
/// are charged the cold start cost.
pub fn startup_costs(chromosome: &Chromosome, units: &[UnitSpec]) -> f64 {
    let mut total = 0.0;
    for (u, unit) in units.iter().enumerate().take(chromosome.units()) {
        let runs = chromosome.run_lengths(u, unit.initial);
        let mut previous = unit.initial.signed();
        let mut previous_online = unit.initial.online;
        for &run in &runs {
            if run == 1 && !previous_online {
                total += unit.startup_cost_after(previous.unsigned_abs() as usize);
            }
            previous = run;
            previous_online = run > 0;
        }
    }
    total
}
