//! Elite hill climbing
//!
//! Local moves applied to the best individual of a generation. Every move is
//! repaired and evaluated, and kept only when it strictly lowers fitness, so
//! the refined individual is never worse than the one passed in.

use crate::chromosome::{Chromosome, Individual};
use crate::config::HillClimbConfig;
use crate::fitness::FitnessEvaluator;
use crate::repair::FeasibilityRepairer;
use rand::seq::index::sample;
use rand::Rng;
use tracing::debug;

pub struct EliteHillClimber<'a> {
    evaluator: &'a FitnessEvaluator,
    repairer: FeasibilityRepairer<'a>,
    config: HillClimbConfig,
}

impl<'a> EliteHillClimber<'a> {
    pub fn new(evaluator: &'a FitnessEvaluator, config: HillClimbConfig) -> Self {
        Self {
            evaluator,
            repairer: FeasibilityRepairer::new(evaluator.units()),
            config,
        }
    }

    /// Runs the swap-mutation climb, then the swap-window climb with the
    /// configured probability.
    pub fn climb<R: Rng>(&self, individual: &Individual, rng: &mut R) -> Individual {
        let mut best = self.rescored(individual.chromosome.clone());
        let start = best.rank_fitness();

        best = self.swap_mutation_climb(best, rng);
        if rng.gen::<f64>() < self.config.swap_window_probability {
            best = self.swap_window_climb(best, rng);
        }

        if best.rank_fitness() < start {
            debug!("Hill climb improved elite from {:.4} to {:.4}", start, best.rank_fitness());
        }
        best
    }

    /// For every period either swaps the states of two random units or flips
    /// one random unit, keeping the move if it improves fitness.
    pub fn swap_mutation_climb<R: Rng>(&self, mut best: Individual, rng: &mut R) -> Individual {
        let units = best.chromosome.units();
        for t in 0..best.chromosome.periods() {
            let mut candidate = best.chromosome.clone();
            if units >= 2 && rng.gen::<f64>() < 0.5 {
                let pair = sample(rng, units, 2);
                let (u1, u2) = (pair.index(0), pair.index(1));
                let on = candidate.get(u1, t);
                candidate.set(u1, t, candidate.get(u2, t));
                candidate.set(u2, t, on);
            } else {
                candidate.flip(rng.gen_range(0..units), t);
            }
            best = self.keep_better(best, candidate);
        }
        best
    }

    /// Fixes two random units and a window width `W` in `[1, H-2]`, then
    /// slides the window from the first period, swapping the two rows inside
    /// it and keeping improvements. Needs two units and three periods.
    pub fn swap_window_climb<R: Rng>(&self, mut best: Individual, rng: &mut R) -> Individual {
        let units = best.chromosome.units();
        let periods = best.chromosome.periods();
        if units < 2 || periods < 3 {
            return best;
        }

        let width = rng.gen_range(1..periods - 1);
        let pair = sample(rng, units, 2);
        let (u1, u2) = (pair.index(0), pair.index(1));

        for start in 0..periods - width {
            let mut candidate = best.chromosome.clone();
            for t in start..start + width {
                let on = candidate.get(u1, t);
                candidate.set(u1, t, candidate.get(u2, t));
                candidate.set(u2, t, on);
            }
            best = self.keep_better(best, candidate);
        }
        best
    }

    fn keep_better(&self, best: Individual, candidate: Chromosome) -> Individual {
        let candidate = self.rescored(candidate);
        if candidate.rank_fitness() < best.rank_fitness() {
            candidate
        } else {
            best
        }
    }

    fn rescored(&self, chromosome: Chromosome) -> Individual {
        let chromosome = self.repairer.repaired(chromosome);
        let (fitness, feasible) = self.evaluator.evaluate(&chromosome);
        Individual::evaluated(chromosome, fitness, feasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GAConfig;
    use crate::model::{ScenarioSpec, UnitSpec};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn evaluator() -> FitnessEvaluator {
        let units = vec![
            UnitSpec::new("CHEAP", 0.0, 100.0).with_cost(0.0, 10.0, 0.0),
            UnitSpec::new("DEAR", 0.0, 100.0).with_cost(0.0, 50.0, 0.0),
        ];
        let scenario = ScenarioSpec::new(vec![80.0; 4], vec![0.0; 4]).unwrap();
        FitnessEvaluator::new(units, scenario, &GAConfig::default()).unwrap()
    }

    #[test]
    fn test_climb_never_worsens() {
        let eval = evaluator();
        let climber = EliteHillClimber::new(
            &eval,
            HillClimbConfig {
                enabled: true,
                swap_window_probability: 1.0,
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..10 {
            let start = Chromosome::random(2, 4, &mut rng);
            let (fitness, feasible) = eval.evaluate(&start);
            let climbed = climber.climb(&Individual::evaluated(start, fitness, feasible), &mut rng);
            assert!(climbed.rank_fitness() <= fitness);
        }
    }

    #[test]
    fn test_swap_window_climb_moves_load_to_cheap_unit() {
        let eval = evaluator();
        let climber = EliteHillClimber::new(&eval, HillClimbConfig::default());
        let dear_only = Chromosome::from_rows(&[vec![false; 4], vec![true; 4]]).unwrap();
        let (fitness, feasible) = eval.evaluate(&dear_only);
        let start = Individual::evaluated(dear_only, fitness, feasible);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let climbed = climber.swap_window_climb(start, &mut rng);
        assert!(climbed.rank_fitness() < fitness);
        assert!(climbed.chromosome.get(0, 0));
    }
}
