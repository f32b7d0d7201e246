//! Parent selection and elitism

use crate::chromosome::{Individual, Population};
use rand::Rng;
use std::cmp::Ordering;

/// Tournament selection with replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSelection {
    pub size: usize,
}

impl TournamentSelection {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    /// Draws `size` indices uniformly with replacement and returns the one
    /// with the lowest fitness. Equal fitness goes to the lower index.
    ///
    /// `population` must not be empty.
    pub fn select_index<R: Rng>(&self, population: &Population, rng: &mut R) -> usize {
        let individuals = population.individuals();
        let mut winner = rng.gen_range(0..individuals.len());
        for _ in 1..self.size {
            let challenger = rng.gen_range(0..individuals.len());
            match individuals[challenger].compare(&individuals[winner]) {
                Ordering::Less => winner = challenger,
                Ordering::Equal if challenger < winner => winner = challenger,
                _ => {}
            }
        }
        winner
    }

    pub fn select<'a, R: Rng>(&self, population: &'a Population, rng: &mut R) -> &'a Individual {
        &population.individuals()[self.select_index(population, rng)]
    }
}

/// Copies of the `count` best individuals, best first.
pub fn elites(population: &Population, count: usize) -> Vec<Individual> {
    population
        .ranked_indices(count)
        .into_iter()
        .map(|i| population.individuals()[i].clone())
        .collect()
}
