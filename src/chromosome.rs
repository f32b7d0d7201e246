//! Commitment schedule encoding
//!
//! A [`Chromosome`] is a `units x periods` bit matrix. Two chromosomes with
//! the same bits are equal and hash identically, which is what the fitness
//! cache keys on.

use crate::error::{UcError, UcResult};
use crate::model::InitialStatus;
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Binary commitment matrix; cell `(u, t)` is true when unit `u` is online in period `t`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Array2<bool>,
}

impl Chromosome {
    /// All units offline in every period.
    pub fn offline(units: usize, periods: usize) -> Self {
        Self {
            genes: Array2::from_elem((units, periods), false),
        }
    }

    /// Every gene an independent fair coin flip.
    pub fn random<R: Rng>(units: usize, periods: usize, rng: &mut R) -> Self {
        Self {
            genes: Array2::from_shape_simple_fn((units, periods), || rng.gen::<bool>()),
        }
    }

    /// Builds a chromosome from one row of bits per unit.
    pub fn from_rows(rows: &[Vec<bool>]) -> UcResult<Self> {
        let units = rows.len();
        let periods = rows.first().map(|r| r.len()).unwrap_or(0);
        if units == 0 || periods == 0 {
            return Err(UcError::InvalidConfig("chromosome must have at least one unit and one period".to_string()));
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != periods) {
            return Err(UcError::ShapeMismatch {
                units,
                periods: bad.len(),
                expected_units: units,
                expected_periods: periods,
            });
        }
        let genes = Array2::from_shape_fn((units, periods), |(u, t)| rows[u][t]);
        Ok(Self { genes })
    }

    pub fn units(&self) -> usize {
        self.genes.nrows()
    }

    pub fn periods(&self) -> usize {
        self.genes.ncols()
    }

    pub fn get(&self, unit: usize, period: usize) -> bool {
        self.genes[[unit, period]]
    }

    pub fn set(&mut self, unit: usize, period: usize, online: bool) {
        self.genes[[unit, period]] = online;
    }

    pub fn flip(&mut self, unit: usize, period: usize) {
        let gene = &mut self.genes[[unit, period]];
        *gene = !*gene;
    }

    pub fn row(&self, unit: usize) -> ArrayView1<'_, bool> {
        self.genes.row(unit)
    }

    pub fn genes(&self) -> &Array2<bool> {
        &self.genes
    }

    pub(crate) fn genes_mut(&mut self) -> &mut Array2<bool> {
        &mut self.genes
    }

    /// Indices of units online in `period`.
    pub fn committed_in(&self, period: usize) -> impl Iterator<Item = usize> + '_ {
        self.genes
            .column(period)
            .into_iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(u, _)| u)
    }

    /// Total committed unit-periods.
    pub fn committed_count(&self) -> usize {
        self.genes.iter().filter(|&&on| on).count()
    }

    /// Fails unless the chromosome is `units x periods`.
    pub fn check_shape(&self, units: usize, periods: usize) -> UcResult<()> {
        if self.units() != units || self.periods() != periods {
            return Err(UcError::ShapeMismatch {
                units: self.units(),
                periods: self.periods(),
                expected_units: units,
                expected_periods: periods,
            });
        }
        Ok(())
    }

    /// Signed run length of `unit` at every period, carrying `initial` over:
    /// `+k` means online for the k-th consecutive period, `-k` offline.
    pub fn run_lengths(&self, unit: usize, initial: InitialStatus) -> Vec<i64> {
        let mut runs = Vec::with_capacity(self.periods());
        let mut online = initial.online;
        let mut run = initial.periods as i64;
        for &on in self.genes.row(unit).iter() {
            if on == online {
                run += 1;
            } else {
                online = on;
                run = 1;
            }
            runs.push(if online { run } else { -run });
        }
        runs
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.genes.rows() {
            let line: String = row.iter().map(|&on| if on { '1' } else { '0' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A chromosome with its cached evaluation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Individual {
    pub chromosome: Chromosome,
    /// `None` until evaluated
    pub fitness: Option<f64>,
    pub feasible: bool,
}

impl Individual {
    pub fn new(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            fitness: None,
            feasible: false,
        }
    }

    pub fn evaluated(chromosome: Chromosome, fitness: f64, feasible: bool) -> Self {
        Self {
            chromosome,
            fitness: Some(fitness),
            feasible,
        }
    }

    /// Fitness for ranking; unevaluated individuals rank last.
    pub fn rank_fitness(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    /// Lower fitness first.
    pub fn compare(&self, other: &Individual) -> Ordering {
        self.rank_fitness().total_cmp(&other.rank_fitness())
    }
}

/// Ordered, fixed-size collection of individuals
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub(crate) fn replace(&mut self, index: usize, individual: Individual) {
        self.individuals[index] = individual;
    }

    /// Index of the lowest fitness; earlier entries win ties.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, ind) in self.individuals.iter().enumerate() {
            match best {
                Some(b) if ind.compare(&self.individuals[b]) != Ordering::Less => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best_index().map(|i| &self.individuals[i])
    }

    /// Indices of the `count` best individuals, best first, ties by position.
    pub fn ranked_indices(&self, count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.individuals.len()).collect();
        order.sort_by(|&a, &b| {
            self.individuals[a]
                .compare(&self.individuals[b])
                .then(a.cmp(&b))
        });
        order.truncate(count);
        order
    }

    pub fn feasible_count(&self) -> usize {
        self.individuals.iter().filter(|i| i.feasible).count()
    }
}
