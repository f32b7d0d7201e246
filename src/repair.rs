//! Minimum up/down-time repair
//!
//! Genetic operators freely break run-length constraints. Repair walks each
//! unit's row from the first period, carrying the unit's initial status, and
//! whenever the unit would switch before its current run is long enough it
//! forces the bit back, extending the run one period at a time.
//!
//! Runs still open at the end of the horizon are never checked; they continue
//! past the planning window.

use crate::chromosome::Chromosome;
use crate::model::UnitSpec;
use ndarray::{ArrayViewMut1, Axis};

/// Restores min up/down-time feasibility in place
pub struct FeasibilityRepairer<'a> {
    units: &'a [UnitSpec],
}

impl<'a> FeasibilityRepairer<'a> {
    pub fn new(units: &'a [UnitSpec]) -> Self {
        Self { units }
    }

    /// Repairs every unit row and returns the number of forced bits.
    /// A feasible chromosome is left untouched.
    pub fn repair(&self, chromosome: &mut Chromosome) -> usize {
        chromosome
            .genes_mut()
            .axis_iter_mut(Axis(0))
            .zip(self.units.iter())
            .map(|(row, unit)| repair_row(row, unit))
            .sum()
    }

    /// Owned variant of [`repair`](Self::repair).
    pub fn repaired(&self, mut chromosome: Chromosome) -> Chromosome {
        self.repair(&mut chromosome);
        chromosome
    }
}

fn repair_row(mut row: ArrayViewMut1<'_, bool>, unit: &UnitSpec) -> usize {
    let mut online = unit.initial.online;
    let mut run = unit.initial.periods;
    let mut forced = 0;

    for gene in row.iter_mut() {
        if *gene == online {
            run += 1;
        } else if run < unit.min_run(online) {
            *gene = online;
            run += 1;
            forced += 1;
        } else {
            online = *gene;
            run = 1;
        }
    }
    forced
}

/// Counts switches that happen before the current run reached its minimum
/// length, across all units.
pub fn count_violations(chromosome: &Chromosome, units: &[UnitSpec]) -> usize {
    units
        .iter()
        .enumerate()
        .take(chromosome.units())
        .map(|(u, unit)| {
            let mut online = unit.initial.online;
            let mut run = unit.initial.periods;
            let mut violations = 0;
            for &gene in chromosome.row(u).iter() {
                if gene == online {
                    run += 1;
                    continue;
                }
                if run < unit.min_run(online) {
                    violations += 1;
                }
                online = gene;
                run = 1;
            }
            violations
        })
        .sum()
}
