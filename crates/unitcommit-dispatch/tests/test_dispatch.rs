use unitcommit_dispatch::*;

fn fleet() -> Vec<Generator> {
    vec![
        Generator::new(50.0, 200.0, QuadraticCost::new(100.0, 20.0, 0.01)),
        Generator::new(20.0, 100.0, QuadraticCost::new(50.0, 25.0, 0.02)),
        Generator::new(10.0, 50.0, QuadraticCost::new(30.0, 30.0, 0.05)),
    ]
}

#[test]
fn test_dispatch_meets_demand_across_range() {
    let gens = fleet();
    let dispatcher = LambdaDispatcher::default();
    let lower = total_min_output(&gens);
    let upper = total_max_output(&gens);

    let mut demand = lower;
    while demand <= upper {
        let alloc = dispatcher.try_solve(&gens, demand).unwrap();
        assert!(
            (alloc.total_output() - demand).abs() < 1e-4,
            "demand {} dispatched as {}",
            demand,
            alloc.total_output()
        );
        for (g, &p) in gens.iter().zip(alloc.outputs.iter()) {
            assert!(p >= g.min_output && p <= g.max_output, "{} outside [{}, {}]", p, g.min_output, g.max_output);
        }
        demand += 7.5;
    }
}

#[test]
fn test_dispatch_is_no_worse_than_proportional_split() {
    let gens = fleet();
    let demand = 240.0;
    let alloc = LambdaDispatcher::default().solve(&gens, demand);

    // Share the load above minimum in proportion to headroom.
    let lower = total_min_output(&gens);
    let headroom = total_max_output(&gens) - lower;
    let share = (demand - lower) / headroom;
    let proportional: f64 = gens
        .iter()
        .map(|g| g.cost.evaluate(g.min_output + share * (g.max_output - g.min_output)))
        .sum();

    assert!(alloc.total_cost(&gens) <= proportional + 1e-6);
}

#[test]
fn test_empty_commitment_reports_unserved_demand() {
    let alloc = LambdaDispatcher::default().solve(&[], 80.0);
    assert_eq!(alloc.method, DispatchMethod::Empty);
    assert!(alloc.outputs.is_empty());
    assert_eq!(alloc.residual_mw, -80.0);
}
