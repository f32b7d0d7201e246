//! Demand and spinning-reserve series

use crate::error::{UcError, UcResult};
use serde::{Deserialize, Serialize};

fn default_period_hours() -> f64 {
    1.0
}

/// Demand and reserve requirement for each period of the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Forecast demand (MW) per period
    pub demand: Vec<f64>,
    /// Spinning reserve (MW) per period
    pub reserve: Vec<f64>,
    /// Settlement period length in hours; scales fuel costs
    #[serde(default = "default_period_hours")]
    pub period_hours: f64,
}

impl ScenarioSpec {
    pub fn new(demand: Vec<f64>, reserve: Vec<f64>) -> UcResult<Self> {
        let scenario = Self {
            demand,
            reserve,
            period_hours: default_period_hours(),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reserve expressed as a fraction of demand in every period.
    pub fn with_reserve_fraction(demand: Vec<f64>, fraction: f64) -> UcResult<Self> {
        let reserve = demand.iter().map(|d| d * fraction).collect();
        Self::new(demand, reserve)
    }

    pub fn with_period_hours(mut self, hours: f64) -> UcResult<Self> {
        self.period_hours = hours;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> UcResult<()> {
        if self.demand.is_empty() {
            return Err(UcError::InvalidScenario("horizon has no periods".to_string()));
        }
        if self.demand.len() != self.reserve.len() {
            return Err(UcError::InvalidScenario(format!(
                "demand has {} periods but reserve has {}",
                self.demand.len(),
                self.reserve.len()
            )));
        }
        for (t, (&d, &r)) in self.demand.iter().zip(self.reserve.iter()).enumerate() {
            if !d.is_finite() || !r.is_finite() {
                return Err(UcError::InvalidScenario(format!("period {} is not a finite number", t)));
            }
            if d < 0.0 {
                return Err(UcError::InvalidScenario(format!("period {} has negative demand", t)));
            }
            if d + r < 0.0 {
                return Err(UcError::InvalidScenario(format!(
                    "period {} has negative demand plus reserve",
                    t
                )));
            }
        }
        if !self.period_hours.is_finite() || self.period_hours <= 0.0 {
            return Err(UcError::InvalidScenario("period length must be positive".to_string()));
        }
        Ok(())
    }

    /// Number of periods H.
    pub fn horizon(&self) -> usize {
        self.demand.len()
    }

    /// Committed capacity needed in period `t`.
    pub fn requirement(&self, t: usize) -> f64 {
        self.demand[t] + self.reserve[t]
    }
}
