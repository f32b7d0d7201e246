//! Generating unit specification

use crate::error::{UcError, UcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unitcommit_dispatch::{Generator, QuadraticCost};

/// Unique identifier for a generating unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        UnitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        UnitId(id.to_string())
    }
}

/// State of a unit just before the first period of the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialStatus {
    pub online: bool,
    /// Periods the unit has already held `online`.
    pub periods: usize,
}

impl InitialStatus {
    pub fn online(periods: usize) -> Self {
        Self { online: true, periods }
    }

    pub fn offline(periods: usize) -> Self {
        Self { online: false, periods }
    }

    /// Signed run length: positive while online, negative while offline.
    pub fn signed(&self) -> i64 {
        if self.online {
            self.periods as i64
        } else {
            -(self.periods as i64)
        }
    }
}

/// Start-up cost applied once a unit has cooled down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColdStart {
    pub cost: f64,
    /// Offline periods after which a start is charged `cost` instead of the hot start cost.
    pub after_periods: usize,
}

/// Thermal generating unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: UnitId,
    /// Minimum stable output (MW) while online
    pub min_output: f64,
    /// Maximum output (MW)
    pub max_output: f64,
    /// Hourly fuel cost curve
    pub cost: QuadraticCost,
    /// Hot start-up cost
    pub startup_cost: f64,
    #[serde(default)]
    pub cold_start: Option<ColdStart>,
    pub min_up: usize,
    pub min_down: usize,
    pub initial: InitialStatus,
}

impl UnitSpec {
    /// Creates a unit with zero costs, one-period min up/down and an
    /// initial offline status held long enough to start immediately.
    pub fn new(id: impl Into<String>, min_output: f64, max_output: f64) -> Self {
        Self {
            id: UnitId::new(id),
            min_output,
            max_output,
            cost: QuadraticCost::default(),
            startup_cost: 0.0,
            cold_start: None,
            min_up: 1,
            min_down: 1,
            initial: InitialStatus::offline(1),
        }
    }

    pub fn with_cost(mut self, fixed: f64, linear: f64, quadratic: f64) -> Self {
        self.cost = QuadraticCost::new(fixed, linear, quadratic);
        self
    }

    pub fn with_startup_cost(mut self, cost: f64) -> Self {
        self.startup_cost = cost;
        self
    }

    pub fn with_cold_start(mut self, cost: f64, after_periods: usize) -> Self {
        self.cold_start = Some(ColdStart { cost, after_periods });
        self
    }

    pub fn with_min_up_down(mut self, min_up: usize, min_down: usize) -> Self {
        self.min_up = min_up;
        self.min_down = min_down;
        self
    }

    pub fn with_initial(mut self, initial: InitialStatus) -> Self {
        self.initial = initial;
        self
    }

    /// Checks the unit's own limits and costs. The fuel cost curve is
    /// checked by the dispatch solver in [`validate_fleet`].
    pub fn validate(&self) -> UcResult<()> {
        let invalid = |reason: &str| UcError::InvalidUnit {
            unit: self.id.to_string(),
            reason: reason.to_string(),
        };

        if self.id.as_str().is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if !self.min_output.is_finite() || !self.max_output.is_finite() {
            return Err(invalid("output limits must be finite"));
        }
        if self.min_output < 0.0 || self.max_output < 0.0 {
            return Err(invalid("negative capacity"));
        }
        if self.min_output > self.max_output {
            return Err(invalid("minimum output exceeds maximum output"));
        }
        if self.min_up == 0 || self.min_down == 0 {
            return Err(invalid("minimum up/down times must be at least one period"));
        }
        if !self.startup_cost.is_finite() || self.startup_cost < 0.0 {
            return Err(invalid("start-up cost must be a non-negative number"));
        }
        if let Some(cold) = &self.cold_start {
            if !cold.cost.is_finite() || cold.cost < 0.0 {
                return Err(invalid("cold start cost must be a non-negative number"));
            }
        }
        Ok(())
    }

    pub fn as_generator(&self) -> Generator {
        Generator::new(self.min_output, self.max_output, self.cost)
    }

    /// Minimum run length before the unit may leave `online`.
    pub fn min_run(&self, online: bool) -> usize {
        if online {
            self.min_up
        } else {
            self.min_down
        }
    }

    /// Cost of starting the unit after `offline_periods` periods offline.
    pub fn startup_cost_after(&self, offline_periods: usize) -> f64 {
        match &self.cold_start {
            Some(cold) if offline_periods > cold.after_periods => cold.cost,
            _ => self.startup_cost,
        }
    }

    /// Average cost per MWh at full load, used to rank units for warm starts.
    pub fn full_load_average_cost(&self) -> f64 {
        if self.max_output <= 0.0 {
            return f64::INFINITY;
        }
        self.cost.evaluate(self.max_output) / self.max_output
    }
}

/// Validates every unit and its cost curve, and rejects empty fleets and
/// duplicate identifiers. Cost curve errors carry the unit's fleet index.
pub fn validate_fleet(units: &[UnitSpec]) -> UcResult<()> {
    if units.is_empty() {
        return Err(UcError::InvalidConfig("fleet has no units".to_string()));
    }
    let mut seen = HashSet::with_capacity(units.len());
    for (index, unit) in units.iter().enumerate() {
        unit.validate()?;
        unit.as_generator().validate(index)?;
        if !seen.insert(&unit.id) {
            return Err(UcError::InvalidUnit {
                unit: unit.id.to_string(),
                reason: "duplicate identifier".to_string(),
            });
        }
    }
    Ok(())
}
