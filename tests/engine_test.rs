use unitcommit::{
    GAConfig, GAEngine, HillClimbConfig, InitStrategy, InitialStatus, Outcome, ScenarioSpec, TerminationReason, UcError,
    UnitSpec,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn three_unit_fleet() -> Vec<UnitSpec> {
    vec![
        UnitSpec::new("U1", 50.0, 200.0)
            .with_cost(100.0, 20.0, 0.01)
            .with_startup_cost(200.0)
            .with_min_up_down(2, 2)
            .with_initial(InitialStatus::offline(2)),
        UnitSpec::new("U2", 20.0, 100.0)
            .with_cost(50.0, 25.0, 0.02)
            .with_startup_cost(100.0),
        UnitSpec::new("U3", 10.0, 50.0)
            .with_cost(30.0, 30.0, 0.05)
            .with_startup_cost(50.0),
    ]
}

fn four_period_scenario() -> ScenarioSpec {
    ScenarioSpec::new(vec![120.0, 180.0, 100.0, 60.0], vec![10.0; 4]).unwrap()
}

fn reference_config() -> GAConfig {
    GAConfig::default()
        .with_population_size(20)
        .with_generations(50)
        .with_seed(42)
}

#[test]
fn test_three_unit_scenario_is_feasible_and_reproducible() -> anyhow::Result<()> {
    init_tracing();

    let first = unitcommit::run(four_period_scenario(), three_unit_fleet(), reference_config())?;
    let second = unitcommit::run(four_period_scenario(), three_unit_fleet(), reference_config())?;

    assert!(first.feasible);
    assert_eq!(first.outcome, Outcome::Feasible);
    assert_eq!(first.best, second.best);
    assert_eq!(first.fitness, second.fitness);
    assert_eq!(first.history, second.history);
    assert_eq!(first.generations, 50);
    assert_eq!(first.termination, TerminationReason::MaxGenerations);

    // Feasible means every period was dispatched to demand inside unit bounds.
    let scenario = four_period_scenario();
    for (t, period) in first.dispatch.iter().enumerate() {
        assert!(period.feasible);
        assert!((period.total_output() - scenario.demand[t]).abs() < 1e-3);
    }
    assert_eq!(first.evaluation.penalty, 0.0);
    assert!((first.fitness - first.total_cost()).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_sequential_and_parallel_runs_match() -> anyhow::Result<()> {
    init_tracing();

    let config = reference_config().with_window_operators(0.1, 0.1);
    let parallel = unitcommit::run(four_period_scenario(), three_unit_fleet(), config.clone().with_parallel(true))?;
    let sequential = unitcommit::run(four_period_scenario(), three_unit_fleet(), config.with_parallel(false))?;

    assert_eq!(parallel.best, sequential.best);
    assert_eq!(parallel.history, sequential.history);
    Ok(())
}

#[test]
fn test_best_fitness_never_increases() -> anyhow::Result<()> {
    init_tracing();

    let config = reference_config().with_seed(7).with_mutation_probability(0.1);
    let result = unitcommit::run(four_period_scenario(), three_unit_fleet(), config)?;

    assert_eq!(result.history.len(), result.generations + 1);
    for pair in result.history.windows(2) {
        assert!(pair[1] <= pair[0], "best fitness went from {} to {}", pair[0], pair[1]);
    }
    assert_eq!(result.history.last().copied(), Some(result.fitness));
    Ok(())
}

#[test]
fn test_elites_survive_generations() -> anyhow::Result<()> {
    let mut engine = GAEngine::new(four_period_scenario(), three_unit_fleet(), reference_config())?;
    engine.initialize()?;

    for _ in 0..5 {
        let best = engine.best().map(|b| b.chromosome.clone());
        engine.step()?;
        let still_present = engine
            .population()
            .iter()
            .any(|ind| Some(&ind.chromosome) == best.as_ref());
        assert!(still_present);
    }
    Ok(())
}

#[test]
fn test_population_satisfies_min_up_down() -> anyhow::Result<()> {
    let mut engine = GAEngine::new(four_period_scenario(), three_unit_fleet(), reference_config())?;
    engine.initialize()?;
    engine.step()?;

    for individual in engine.population().iter() {
        assert_eq!(unitcommit::count_violations(&individual.chromosome, engine.evaluator().units()), 0);
    }
    Ok(())
}

#[test]
fn test_invalid_inputs_never_start() {
    let bad_config = reference_config().with_elitism(20);
    assert!(matches!(
        GAEngine::new(four_period_scenario(), three_unit_fleet(), bad_config),
        Err(UcError::InvalidConfig(_))
    ));

    let mut bad_units = three_unit_fleet();
    bad_units[1].min_output = 150.0;
    assert!(matches!(
        GAEngine::new(four_period_scenario(), bad_units, reference_config()),
        Err(UcError::InvalidUnit { .. })
    ));

    let mut concave = three_unit_fleet();
    concave[2].cost.quadratic = -0.05;
    assert!(matches!(
        GAEngine::new(four_period_scenario(), concave, reference_config()),
        Err(UcError::Dispatch(_))
    ));

    let bad_scenario = ScenarioSpec {
        demand: vec![100.0, 100.0],
        reserve: vec![10.0],
        period_hours: 1.0,
    };
    assert!(matches!(
        GAEngine::new(bad_scenario, three_unit_fleet(), reference_config()),
        Err(UcError::InvalidScenario(_))
    ));
}

#[test]
fn test_stepping_after_termination_fails() -> anyhow::Result<()> {
    let mut engine = GAEngine::new(
        four_period_scenario(),
        three_unit_fleet(),
        reference_config().with_generations(3),
    )?;
    while engine.step()? {}

    assert!(engine.result().is_some());
    assert!(matches!(engine.step(), Err(UcError::EngineTerminated)));
    Ok(())
}

#[test]
fn test_unservable_demand_is_best_effort() -> anyhow::Result<()> {
    init_tracing();

    // 400 MW in period 1 exceeds the 350 MW fleet.
    let scenario = ScenarioSpec::new(vec![120.0, 400.0, 100.0, 60.0], vec![10.0; 4])?;
    let result = unitcommit::run(scenario, three_unit_fleet(), reference_config())?;

    assert!(!result.feasible);
    assert_eq!(result.outcome, Outcome::BestEffortInfeasible);
    assert!(!result.dispatch[1].feasible);
    assert!(result.evaluation.penalty > 0.0);
    assert!(result.best_feasible.is_none());
    Ok(())
}

#[test]
fn test_warm_start_and_hill_climb() -> anyhow::Result<()> {
    init_tracing();

    let config = reference_config()
        .with_generations(10)
        .with_init(InitStrategy::PriorityList { perturbation: 0.1 })
        .with_hill_climb(HillClimbConfig {
            enabled: true,
            swap_window_probability: 0.5,
        });
    let warm = unitcommit::run(four_period_scenario(), three_unit_fleet(), config.clone())?;
    let again = unitcommit::run(four_period_scenario(), three_unit_fleet(), config)?;

    // The merit-order schedule already covers every period.
    assert!(warm.feasible);
    assert!(warm.history[0].is_finite());
    assert_eq!(warm.best, again.best);
    Ok(())
}

#[test]
fn test_feasible_schedule_reported_when_penalty_is_too_weak() -> anyhow::Result<()> {
    init_tracing();

    // Only both units together cover 160 MW; with no shortfall penalty any
    // schedule running fewer units is cheaper.
    let units = vec![
        UnitSpec::new("A", 10.0, 100.0).with_cost(100.0, 10.0, 0.0),
        UnitSpec::new("B", 10.0, 100.0).with_cost(100.0, 10.0, 0.0),
    ];
    let scenario = ScenarioSpec::new(vec![150.0, 150.0], vec![10.0, 10.0])?;
    let config = GAConfig::default()
        .with_population_size(10)
        .with_generations(5)
        .with_penalty_weight(0.0)
        .with_init(InitStrategy::PriorityList { perturbation: 0.5 });
    let result = unitcommit::run(scenario, units, config)?;

    assert!(!result.feasible);
    assert_eq!(result.outcome, Outcome::Feasible);

    let feasible = result.best_feasible.as_ref().expect("merit-order schedule is feasible");
    assert_eq!(feasible.committed_count(), 4);
    assert!(result.best_feasible_fitness.unwrap_or(f64::INFINITY) > result.fitness);
    Ok(())
}
