//! Priority-list warm start

use crate::chromosome::Chromosome;
use crate::model::{ScenarioSpec, UnitSpec};
use rand::Rng;

/// Unit indices ordered by full-load average cost, cheapest first.
/// Equal costs keep fleet order.
pub fn priority_order(units: &[UnitSpec]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..units.len()).collect();
    order.sort_by(|&a, &b| {
        units[a]
            .full_load_average_cost()
            .total_cmp(&units[b].full_load_average_cost())
            .then(a.cmp(&b))
    });
    order
}

/// Commits units in merit order each period until their capacity covers
/// demand plus reserve. Periods the whole fleet cannot cover commit every unit.
pub fn priority_list_schedule(units: &[UnitSpec], scenario: &ScenarioSpec) -> Chromosome {
    let order = priority_order(units);
    let mut chromosome = Chromosome::offline(units.len(), scenario.horizon());

    for t in 0..scenario.horizon() {
        let requirement = scenario.requirement(t);
        let mut capacity = 0.0;
        for &u in &order {
            if capacity >= requirement {
                break;
            }
            chromosome.set(u, t, true);
            capacity += units[u].max_output;
        }
    }
    chromosome
}

/// Copy of `base` with each gene flipped with probability `perturbation`.
pub fn perturbed<R: Rng>(base: &Chromosome, perturbation: f64, rng: &mut R) -> Chromosome {
    let mut chromosome = base.clone();
    chromosome.genes_mut().map_inplace(|gene| {
        if rng.gen::<f64>() < perturbation {
            *gene = !*gene;
        }
    });
    chromosome
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fleet() -> Vec<UnitSpec> {
        vec![
            UnitSpec::new("PEAKER", 10.0, 50.0).with_cost(30.0, 30.0, 0.05),
            UnitSpec::new("BASE", 50.0, 200.0).with_cost(100.0, 20.0, 0.01),
            UnitSpec::new("MID", 20.0, 100.0).with_cost(50.0, 25.0, 0.02),
        ]
    }

    #[test]
    fn test_priority_order_by_average_cost() {
        assert_eq!(priority_order(&fleet()), vec![1, 2, 0]);
    }

    #[test]
    fn test_schedule_covers_requirement() {
        let units = fleet();
        let scenario = ScenarioSpec::new(vec![120.0, 250.0, 400.0], vec![10.0, 10.0, 10.0]).unwrap();
        let c = priority_list_schedule(&units, &scenario);

        assert_eq!(c.committed_in(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(c.committed_in(1).collect::<Vec<_>>(), vec![1, 2]);
        // 410 MW exceeds the 350 MW fleet; everything runs.
        assert_eq!(c.committed_in(2).count(), 3);
    }

    #[test]
    fn test_zero_perturbation_is_identity() {
        let units = fleet();
        let scenario = ScenarioSpec::new(vec![120.0, 250.0], vec![0.0, 0.0]).unwrap();
        let base = priority_list_schedule(&units, &scenario);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(perturbed(&base, 0.0, &mut rng), base);
        assert_ne!(perturbed(&base, 1.0, &mut rng), base);
    }
}
