//! Crossover and mutation
//!
//! Operators take their parents by reference (or by value for mutation) and
//! always hand back fresh chromosomes; a parent in the population is never
//! modified.

use crate::chromosome::Chromosome;
use crate::config::GAConfig;
use ndarray::{s, Zip};
use rand::seq::index::sample;
use rand::Rng;

/// Probability-gated operators for one GA run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticOperators {
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub swap_window_probability: f64,
    pub window_mutation_probability: f64,
}

impl GeneticOperators {
    pub fn new(config: &GAConfig) -> Self {
        Self {
            crossover_probability: config.crossover_probability,
            mutation_probability: config.mutation_probability,
            swap_window_probability: config.swap_window_probability,
            window_mutation_probability: config.window_mutation_probability,
        }
    }

    /// Single-point crossover applied to every unit row at the same cut.
    ///
    /// The gate is always drawn, so a slot consumes the same random numbers
    /// whatever the horizon length.
    pub fn crossover<R: Rng>(&self, a: &Chromosome, b: &Chromosome, rng: &mut R) -> (Chromosome, Chromosome) {
        let mut first = a.clone();
        let mut second = b.clone();
        let periods = first.periods().min(second.periods());
        let roll = rng.gen::<f64>();

        if periods > 1 && roll < self.crossover_probability {
            let point = rng.gen_range(1..periods);
            single_point(&mut first, &mut second, point);
        }
        (first, second)
    }

    /// Flips each gene independently.
    pub fn mutate<R: Rng>(&self, mut chromosome: Chromosome, rng: &mut R) -> Chromosome {
        let p = self.mutation_probability;
        chromosome.genes_mut().map_inplace(|gene| {
            if rng.gen::<f64>() < p {
                *gene = !*gene;
            }
        });
        chromosome
    }

    /// Applies the window operators, each gated by its own probability.
    /// Nothing is drawn for an operator whose probability is zero.
    pub fn window_operators<R: Rng>(&self, mut chromosome: Chromosome, rng: &mut R) -> Chromosome {
        if self.swap_window_probability > 0.0 && rng.gen::<f64>() < self.swap_window_probability {
            swap_window(&mut chromosome, rng);
        }
        if self.window_mutation_probability > 0.0 && rng.gen::<f64>() < self.window_mutation_probability {
            window_mutation(&mut chromosome, rng);
        }
        chromosome
    }
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self::new(&GAConfig::default())
    }
}

/// Exchanges the tails starting at `point` of every row.
pub fn single_point(a: &mut Chromosome, b: &mut Chromosome, point: usize) {
    Zip::from(a.genes_mut().slice_mut(s![.., point..]))
        .and(b.genes_mut().slice_mut(s![.., point..]))
        .for_each(|x, y| std::mem::swap(x, y));
}

/// Random non-empty window `[start, end)` of a horizon with `periods` periods.
pub fn random_window<R: Rng>(periods: usize, rng: &mut R) -> (usize, usize) {
    let cuts = sample(rng, periods + 1, 2);
    let (x, y) = (cuts.index(0), cuts.index(1));
    (x.min(y), x.max(y))
}

/// Swaps the rows of two distinct random units inside a random window.
/// Returns false when the fleet has a single unit.
pub fn swap_window<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) -> bool {
    if chromosome.units() < 2 || chromosome.periods() == 0 {
        return false;
    }
    let units = sample(rng, chromosome.units(), 2);
    let (u1, u2) = (units.index(0), units.index(1));
    let (start, end) = random_window(chromosome.periods(), rng);
    for t in start..end {
        let on = chromosome.get(u1, t);
        chromosome.set(u1, t, chromosome.get(u2, t));
        chromosome.set(u2, t, on);
    }
    true
}

/// Sets a random window of one random unit to a single random state.
pub fn window_mutation<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) -> bool {
    if chromosome.units() == 0 || chromosome.periods() == 0 {
        return false;
    }
    let unit = rng.gen_range(0..chromosome.units());
    let (start, end) = random_window(chromosome.periods(), rng);
    let online = rng.gen::<bool>();
    chromosome
        .genes_mut()
        .slice_mut(s![unit, start..end])
        .fill(online);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rows(c: &Chromosome) -> Vec<String> {
        c.to_string().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_single_point_swaps_all_rows() {
        let mut a = Chromosome::from_rows(&[vec![true; 4], vec![true; 4]]).unwrap();
        let mut b = Chromosome::offline(2, 4);
        single_point(&mut a, &mut b, 1);
        assert_eq!(rows(&a), vec!["1000", "1000"]);
        assert_eq!(rows(&b), vec!["0111", "0111"]);
    }

    #[test]
    fn test_crossover_preserves_gene_counts() {
        let ops = GeneticOperators {
            crossover_probability: 1.0,
            ..GeneticOperators::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = Chromosome::random(3, 8, &mut rng);
        let b = Chromosome::random(3, 8, &mut rng);
        let (c, d) = ops.crossover(&a, &b, &mut rng);

        // Every column of the children comes from one of the parents.
        for t in 0..8 {
            let from_a = (0..3).all(|u| c.get(u, t) == a.get(u, t) && d.get(u, t) == b.get(u, t));
            let from_b = (0..3).all(|u| c.get(u, t) == b.get(u, t) && d.get(u, t) == a.get(u, t));
            assert!(from_a || from_b);
        }
        assert_eq!(c.committed_count() + d.committed_count(), a.committed_count() + b.committed_count());
    }

    #[test]
    fn test_crossover_single_period_returns_clones() {
        let ops = GeneticOperators {
            crossover_probability: 1.0,
            ..GeneticOperators::default()
        };
        let a = Chromosome::from_rows(&[vec![true]]).unwrap();
        let b = Chromosome::offline(1, 1);
        let (c, d) = ops.crossover(&a, &b, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(c, a);
        assert_eq!(d, b);
    }

    #[test]
    fn test_mutation_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let c = Chromosome::random(4, 6, &mut rng);

        let never = GeneticOperators {
            mutation_probability: 0.0,
            ..GeneticOperators::default()
        };
        assert_eq!(never.mutate(c.clone(), &mut rng), c);

        let always = GeneticOperators {
            mutation_probability: 1.0,
            ..GeneticOperators::default()
        };
        let flipped = always.mutate(c.clone(), &mut rng);
        assert_eq!(flipped.committed_count(), 24 - c.committed_count());
    }

    #[test]
    fn test_swap_window_exchanges_rows() {
        let mut c = Chromosome::from_rows(&[vec![true; 5], vec![false; 5]]).unwrap();
        assert!(swap_window(&mut c, &mut ChaCha8Rng::seed_from_u64(11)));
        // Column sums are preserved and something moved.
        for t in 0..5 {
            assert_eq!(c.committed_in(t).count(), 1);
        }
        assert!((0..5).any(|t| c.get(1, t)));
    }

    #[test]
    fn test_swap_window_needs_two_units() {
        let mut c = Chromosome::from_rows(&[vec![true, false]]).unwrap();
        assert!(!swap_window(&mut c, &mut ChaCha8Rng::seed_from_u64(1)));
    }

    #[test]
    fn test_window_mutation_fills_contiguous_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..20 {
            let (start, end) = random_window(6, &mut rng);
            assert!(start < end && end <= 6);
        }

        let alternating: Vec<bool> = (0..6).map(|t| t % 2 == 0).collect();
        let original = Chromosome::from_rows(&[alternating.clone(), alternating]).unwrap();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            // Replay the draws on a copy to learn the unit, window and state.
            let mut replay = rng.clone();
            let unit = replay.gen_range(0..2);
            let (start, end) = random_window(6, &mut replay);
            let online = replay.gen::<bool>();

            let mut c = original.clone();
            assert!(window_mutation(&mut c, &mut rng));
            for u in 0..2 {
                for t in 0..6 {
                    if u == unit && (start..end).contains(&t) {
                        assert_eq!(c.get(u, t), online);
                    } else {
                        assert_eq!(c.get(u, t), original.get(u, t));
                    }
                }
            }
        }
    }
}
