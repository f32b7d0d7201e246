use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quadratics with a coefficient below this are dispatched as linear units.
pub const LINEAR_EPSILON: f64 = 1e-12;

/// Errors raised when generator data cannot be dispatched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// A generator record breaks its own invariants
    #[error("Invalid generator {index}: {reason}")]
    InvalidGenerator { index: usize, reason: String },

    /// Demand is negative or not a finite number
    #[error("Invalid demand: {0}")]
    InvalidDemand(f64),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Fuel cost curve `fixed + linear * p + quadratic * p^2` per hour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadraticCost {
    pub fixed: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl QuadraticCost {
    pub fn new(fixed: f64, linear: f64, quadratic: f64) -> Self {
        Self { fixed, linear, quadratic }
    }

    /// Hourly cost of running at `output` MW.
    pub fn evaluate(&self, output: f64) -> f64 {
        self.fixed + self.linear * output + self.quadratic * output * output
    }

    /// Incremental cost dC/dp at `output` MW.
    pub fn marginal(&self, output: f64) -> f64 {
        self.linear + 2.0 * self.quadratic * output
    }

    pub fn is_linear(&self) -> bool {
        self.quadratic <= LINEAR_EPSILON
    }
}

impl Default for QuadraticCost {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// A committed generator as seen by the dispatch solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub min_output: f64,
    pub max_output: f64,
    pub cost: QuadraticCost,
}

impl Generator {
    pub fn new(min_output: f64, max_output: f64, cost: QuadraticCost) -> Self {
        Self { min_output, max_output, cost }
    }

    pub fn validate(&self, index: usize) -> DispatchResult<()> {
        let invalid = |reason: &str| DispatchError::InvalidGenerator {
            index,
            reason: reason.to_string(),
        };
        if !self.min_output.is_finite() || !self.max_output.is_finite() {
            return Err(invalid("output limits must be finite"));
        }
        if self.min_output < 0.0 {
            return Err(invalid("minimum output is negative"));
        }
        if self.min_output > self.max_output {
            return Err(invalid("minimum output exceeds maximum output"));
        }
        let c = &self.cost;
        if !c.fixed.is_finite() || !c.linear.is_finite() || !c.quadratic.is_finite() {
            return Err(invalid("cost coefficients must be finite"));
        }
        if c.quadratic < 0.0 {
            return Err(invalid("quadratic coefficient must be non-negative"));
        }
        Ok(())
    }

    /// Output at incremental cost `lambda`, clamped to the unit's limits.
    ///
    /// Linear units are bang-bang in lambda; `ties_high` decides which
    /// limit they take when lambda equals their marginal cost exactly.
    pub fn output_at(&self, lambda: f64, ties_high: bool) -> f64 {
        if self.cost.is_linear() {
            let b = self.cost.linear;
            if lambda > b || (ties_high && lambda == b) {
                self.max_output
            } else {
                self.min_output
            }
        } else {
            let p = (lambda - self.cost.linear) / (2.0 * self.cost.quadratic);
            p.clamp(self.min_output, self.max_output)
        }
    }
}

/// Numerical settings for the lambda iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LambdaConfig {
    /// Accepted gap (MW) between the outputs at the two ends of the lambda bracket.
    pub tolerance: f64,
    /// Bisection cap; the best bracket found so far is used once reached.
    pub max_iterations: usize,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 100,
        }
    }
}

/// How an allocation was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMethod {
    /// No generators were committed.
    Empty,
    /// Summed minimum output already exceeds demand.
    PinnedAtMinimum,
    /// Summed maximum output cannot reach demand.
    PinnedAtMaximum,
    /// Unconstrained equal-incremental-cost optimum was inside every limit.
    ClosedForm,
    /// Bisection on lambda.
    LambdaIteration,
}

/// Result of dispatching one period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Output per generator, in input order.
    pub outputs: Vec<f64>,
    /// Final system incremental cost.
    pub lambda: f64,
    pub method: DispatchMethod,
    pub iterations: usize,
    /// False when the iteration cap was hit before the bracket closed.
    pub converged: bool,
    /// Width in MW of the last lambda bracket.
    pub gap_mw: f64,
    /// `sum(outputs) - demand`; negative means unserved demand.
    pub residual_mw: f64,
}

impl Allocation {
    pub fn total_output(&self) -> f64 {
        self.outputs.iter().sum()
    }

    /// Hourly cost of this allocation.
    pub fn total_cost(&self, generators: &[Generator]) -> f64 {
        generators
            .iter()
            .zip(self.outputs.iter())
            .map(|(g, &p)| g.cost.evaluate(p))
            .sum()
    }
}

pub fn total_min_output(generators: &[Generator]) -> f64 {
    generators.iter().map(|g| g.min_output).sum()
}

pub fn total_max_output(generators: &[Generator]) -> f64 {
    generators.iter().map(|g| g.max_output).sum()
}
