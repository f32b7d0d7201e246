//! Expected operating cost under demand uncertainty
//!
//! Demand is taken as normally distributed around the forecast with standard
//! deviation `uncertainty x demand`. The distribution is approximated by five
//! realizations at -2..=2 standard deviations, weighted by the probability
//! mass around each.

use crate::chromosome::Chromosome;
use crate::dispatch::EconomicDispatchEvaluator;
use crate::error::{UcError, UcResult};
use crate::fitness::startup_costs;
use crate::model::{validate_fleet, ScenarioSpec, UnitSpec};
use serde::{Deserialize, Serialize};
use unitcommit_dispatch::LambdaConfig;

/// Probability weight of the realizations at -2, -1, 0, +1 and +2 sigma
pub const REALIZATION_WEIGHTS: [f64; 5] = [0.023, 0.136, 0.682, 0.136, 0.023];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCost {
    /// Start-up cost plus weighted fuel and lost-load costs
    pub total: f64,
    pub startup_cost: f64,
    /// Weighted fuel cost
    pub fuel_cost: f64,
    /// Weighted value of energy not served
    pub lost_load_cost: f64,
    /// Weighted energy not served (MWh)
    pub energy_not_served: f64,
}

/// Evaluates a fixed schedule against demand realizations around the
/// scenario forecast. `voll` is the value of lost load in $/MWh.
pub fn expected_cost(
    chromosome: &Chromosome,
    units: &[UnitSpec],
    scenario: &ScenarioSpec,
    uncertainty: f64,
    voll: f64,
) -> UcResult<ExpectedCost> {
    validate_fleet(units)?;
    scenario.validate()?;
    chromosome.check_shape(units.len(), scenario.horizon())?;
    if !uncertainty.is_finite() || uncertainty < 0.0 {
        return Err(UcError::InvalidConfig(format!("demand uncertainty {} must be non-negative", uncertainty)));
    }
    if !voll.is_finite() || voll < 0.0 {
        return Err(UcError::InvalidConfig(format!("value of lost load {} must be non-negative", voll)));
    }

    let dispatcher = EconomicDispatchEvaluator::new(LambdaConfig::default(), scenario.period_hours);
    let startup_cost = startup_costs(chromosome, units);
    let mut fuel_cost = 0.0;
    let mut energy_not_served = 0.0;

    for (k, weight) in (-2i32..=2).zip(REALIZATION_WEIGHTS) {
        let scale = 1.0 + f64::from(k) * uncertainty;
        for t in 0..scenario.horizon() {
            let committed: Vec<&UnitSpec> = chromosome.committed_in(t).map(|u| &units[u]).collect();
            let demand = (scenario.demand[t] * scale).max(0.0);
            let result = dispatcher.dispatch(&committed, demand, 0.0);
            fuel_cost += weight * result.cost;
            energy_not_served += weight * result.unserved_mw * scenario.period_hours;
        }
    }

    let lost_load_cost = voll * energy_not_served;
    Ok(ExpectedCost {
        total: startup_cost + fuel_cost + lost_load_cost,
        startup_cost,
        fuel_cost,
        lost_load_cost,
        energy_not_served,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_unit() -> Vec<UnitSpec> {
        vec![UnitSpec::new("U1", 0.0, 100.0)
            .with_cost(0.0, 10.0, 0.0)
            .with_startup_cost(5.0)]
    }

    #[test]
    fn test_no_uncertainty_matches_point_forecast() {
        let units = single_unit();
        let scenario = ScenarioSpec::new(vec![50.0, 60.0], vec![0.0, 0.0]).unwrap();
        let c = Chromosome::from_rows(&[vec![true, true]]).unwrap();
        let cost = expected_cost(&c, &units, &scenario, 0.0, 1000.0).unwrap();

        // Weights sum to 1.0: 10 $/MWh x 110 MWh
        assert!((cost.fuel_cost - 1100.0).abs() < 1e-6);
        assert_eq!(cost.startup_cost, 5.0);
        assert_eq!(cost.energy_not_served, 0.0);
        assert!((cost.total - 1105.0).abs() < 1e-6);
    }

    #[test]
    fn test_high_realizations_shed_load() {
        let units = single_unit();
        let scenario = ScenarioSpec::new(vec![90.0], vec![0.0]).unwrap();
        let c = Chromosome::from_rows(&[vec![true]]).unwrap();
        let cost = expected_cost(&c, &units, &scenario, 0.1, 1000.0).unwrap();

        // +1 sigma: 99 MW served, +2 sigma: 108 MW against 100 MW capacity.
        assert!((cost.energy_not_served - 0.023 * 8.0).abs() < 1e-9);
        assert!((cost.lost_load_cost - 184.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let units = single_unit();
        let scenario = ScenarioSpec::new(vec![50.0, 60.0], vec![0.0, 0.0]).unwrap();
        let c = Chromosome::from_rows(&[vec![true]]).unwrap();
        assert!(matches!(
            expected_cost(&c, &units, &scenario, 0.1, 1000.0),
            Err(UcError::ShapeMismatch { .. })
        ));
        let ok = Chromosome::from_rows(&[vec![true, true]]).unwrap();
        assert!(expected_cost(&ok, &units, &scenario, -0.1, 1000.0).is_err());
    }
}
