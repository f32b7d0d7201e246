//! Economic dispatch adapter
//!
//! Bridges unit specifications to the `unitcommit-dispatch` solver and turns
//! its allocation into a per-period [`DispatchResult`]. Dispatch is a pure
//! function of the committed set, so periods can be solved in any order or
//! on any thread.

use crate::model::{UnitId, UnitSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unitcommit_dispatch::{
    total_max_output, total_min_output, DispatchMethod, Generator, LambdaConfig, LambdaDispatcher,
};

/// Dispatch outcome for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Output (MW) of each committed unit, in fleet order
    pub outputs: IndexMap<UnitId, f64>,
    /// Fuel cost of the period, scaled by the period length
    pub cost: f64,
    /// False when committed capacity misses demand or demand plus reserve, or
    /// minimum output exceeds demand
    pub feasible: bool,
    /// Committed capacity missing to cover demand plus reserve (MW)
    pub reserve_shortfall_mw: f64,
    /// Demand left unserved (MW), part of the reserve shortfall
    pub unserved_mw: f64,
    /// Minimum output in excess of demand (MW)
    pub excess_mw: f64,
    pub method: DispatchMethod,
    /// System incremental cost
    pub lambda: f64,
    /// False when the lambda iteration hit its cap
    pub converged: bool,
    /// Output bracket left when the lambda iteration stopped (MW)
    pub gap_mw: f64,
}

impl DispatchResult {
    /// Shortfall charged by the fitness penalty. Unserved demand counts
    /// even when a negative reserve hides it from the reserve check. A lambda
    /// iteration that failed to converge contributes its remaining bracket.
    pub fn shortfall_mw(&self) -> f64 {
        let tolerance_exceeded = if self.converged { 0.0 } else { self.gap_mw };
        self.reserve_shortfall_mw.max(self.unserved_mw) + self.excess_mw + tolerance_exceeded
    }

    pub fn total_output(&self) -> f64 {
        self.outputs.values().sum()
    }
}

/// Per-period minimum-cost allocation among committed units
#[derive(Clone)]
pub struct EconomicDispatchEvaluator {
    solver: LambdaDispatcher,
    period_hours: f64,
}

impl EconomicDispatchEvaluator {
    pub fn new(config: LambdaConfig, period_hours: f64) -> Self {
        Self {
            solver: LambdaDispatcher::new(config),
            period_hours,
        }
    }

    pub fn config(&self) -> &LambdaConfig {
        &self.solver.config
    }

    /// Dispatches `committed` units against `demand`, checking that their
    /// capacity also covers `reserve`.
    pub fn dispatch(&self, committed: &[&UnitSpec], demand: f64, reserve: f64) -> DispatchResult {
        let generators: Vec<Generator> = committed.iter().map(|u| u.as_generator()).collect();
        let min_total = total_min_output(&generators);
        let max_total = total_max_output(&generators);

        let reserve_shortfall_mw = (demand + reserve - max_total).max(0.0);
        let unserved_mw = (demand - max_total).max(0.0);
        let excess_mw = (min_total - demand).max(0.0);

        let allocation = self.solver.solve(&generators, demand.max(0.0));
        let cost = self.period_hours * allocation.total_cost(&generators);

        let outputs = committed
            .iter()
            .zip(allocation.outputs.iter())
            .map(|(u, &p)| (u.id.clone(), p))
            .collect();

        DispatchResult {
            outputs,
            cost,
            feasible: reserve_shortfall_mw <= 0.0 && unserved_mw <= 0.0 && excess_mw <= 0.0,
            reserve_shortfall_mw,
            unserved_mw,
            excess_mw,
            method: allocation.method,
            lambda: allocation.lambda,
            converged: allocation.converged,
            gap_mw: allocation.gap_mw,
        }
    }
}

impl Default for EconomicDispatchEvaluator {
    fn default() -> Self {
        Self::new(LambdaConfig::default(), 1.0)
    }
}
