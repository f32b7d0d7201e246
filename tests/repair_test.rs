use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use unitcommit::{count_violations, Chromosome, FeasibilityRepairer, InitialStatus, UnitSpec};

fn random_fleet(rng: &mut ChaCha8Rng, units: usize) -> Vec<UnitSpec> {
    (0..units)
        .map(|u| {
            let initial = if rng.gen::<bool>() {
                InitialStatus::online(rng.gen_range(1..5))
            } else {
                InitialStatus::offline(rng.gen_range(1..5))
            };
            UnitSpec::new(format!("U{}", u), 10.0, 100.0)
                .with_min_up_down(rng.gen_range(1..5), rng.gen_range(1..5))
                .with_initial(initial)
        })
        .collect()
}

/// Every run that ends inside the horizon met its minimum length.
fn assert_runs_respect_minimums(chromosome: &Chromosome, units: &[UnitSpec]) {
    for (u, unit) in units.iter().enumerate() {
        let runs = chromosome.run_lengths(u, unit.initial);
        for t in 1..runs.len() {
            let (prev, curr) = (runs[t - 1], runs[t]);
            if prev.signum() != curr.signum() {
                let required = unit.min_run(prev > 0) as i64;
                assert!(
                    prev.abs() >= required,
                    "unit {} switched at period {} after {} periods, needs {}",
                    unit.id,
                    t,
                    prev.abs(),
                    required
                );
            }
        }
        if let Some(&first) = runs.first() {
            if first.signum() != unit.initial.signed().signum() {
                assert!(unit.initial.periods >= unit.min_run(unit.initial.online));
            }
        }
    }
}

#[test]
fn test_repair_is_idempotent_and_feasible() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for _ in 0..200 {
        let units = random_fleet(&mut rng, 4);
        let periods = rng.gen_range(1..24);
        let repairer = FeasibilityRepairer::new(&units);

        let mut chromosome = Chromosome::random(units.len(), periods, &mut rng);
        repairer.repair(&mut chromosome);

        assert_eq!(chromosome.units(), units.len());
        assert_eq!(chromosome.periods(), periods);
        assert_eq!(count_violations(&chromosome, &units), 0);
        assert_runs_respect_minimums(&chromosome, &units);

        let again = repairer.repaired(chromosome.clone());
        assert_eq!(again, chromosome);
    }
}

#[test]
fn test_forced_bits_match_changed_genes() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let units = random_fleet(&mut rng, 3);
    let repairer = FeasibilityRepairer::new(&units);

    for _ in 0..50 {
        let original = Chromosome::random(3, 12, &mut rng);
        let mut repaired = original.clone();
        let forced = repairer.repair(&mut repaired);

        let changed = original
            .genes()
            .iter()
            .zip(repaired.genes().iter())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(forced, changed);
    }
}

#[test]
fn test_initial_online_one_of_two_periods() {
    let unit = UnitSpec::new("U1", 50.0, 200.0)
        .with_min_up_down(2, 2)
        .with_initial(InitialStatus::online(1));
    let units = vec![unit];

    let mut chromosome = Chromosome::from_rows(&[vec![false, true, false, true]]).unwrap();
    FeasibilityRepairer::new(&units).repair(&mut chromosome);

    // Period 0 must stay online to complete the two-period minimum.
    assert!(chromosome.get(0, 0));
    assert_eq!(count_violations(&chromosome, &units), 0);
}
