use crate::common::{
    total_max_output, total_min_output, Allocation, DispatchError, DispatchMethod, DispatchResult,
    Generator, LambdaConfig,
};
use tracing::debug;

/// Box tolerance when accepting the closed-form optimum.
const BOUND_SLACK: f64 = 1e-9;

/// Equal-incremental-cost economic dispatch for one period.
#[derive(Clone, Debug)]
pub struct LambdaDispatcher {
    pub config: LambdaConfig,
}

impl LambdaDispatcher {
    pub fn new(config: LambdaConfig) -> Self {
        Self { config }
    }

    /// Validates the generators and demand before solving.
    pub fn try_solve(&self, generators: &[Generator], demand: f64) -> DispatchResult<Allocation> {
        if !demand.is_finite() || demand < 0.0 {
            return Err(DispatchError::InvalidDemand(demand));
        }
        for (i, g) in generators.iter().enumerate() {
            g.validate(i)?;
        }
        Ok(self.solve(generators, demand))
    }

    /// Solves the dispatch for already validated generators.
    ///
    /// Demand outside `[sum(min), sum(max)]` pins every unit at the nearer
    /// limit; the residual reports by how much demand was missed.
    pub fn solve(&self, generators: &[Generator], demand: f64) -> Allocation {
        if generators.is_empty() {
            return Allocation {
                outputs: Vec::new(),
                lambda: 0.0,
                method: DispatchMethod::Empty,
                iterations: 0,
                converged: true,
                gap_mw: 0.0,
                residual_mw: -demand,
            };
        }

        let min_total = total_min_output(generators);
        let max_total = total_max_output(generators);

        if min_total > demand {
            let outputs: Vec<f64> = generators.iter().map(|g| g.min_output).collect();
            return pinned(generators, outputs, DispatchMethod::PinnedAtMinimum, min_total - demand);
        }
        if max_total < demand {
            let outputs: Vec<f64> = generators.iter().map(|g| g.max_output).collect();
            return pinned(generators, outputs, DispatchMethod::PinnedAtMaximum, max_total - demand);
        }

        if let Some(allocation) = closed_form(generators, demand) {
            return allocation;
        }

        self.bisect(generators, demand)
    }

    fn bisect(&self, generators: &[Generator], demand: f64) -> Allocation {
        let mut lo = generators
            .iter()
            .map(|g| g.cost.marginal(g.min_output))
            .fold(f64::INFINITY, f64::min);
        let mut hi = generators
            .iter()
            .map(|g| g.cost.marginal(g.max_output))
            .fold(f64::NEG_INFINITY, f64::max);

        // At `lo` every unit sits at its minimum, at `hi` at its maximum.
        let mut low = outputs_at(generators, lo, false);
        let mut high = outputs_at(generators, hi, true);
        let mut low_sum: f64 = low.iter().sum();
        let mut high_sum: f64 = high.iter().sum();

        let mut iterations = 0;
        let mut bracketed_exactly = false;

        // A partially loaded linear unit pins lambda to its own marginal cost.
        for g in generators.iter().filter(|g| g.cost.is_linear()) {
            let b = g.cost.linear;
            if b < lo || b > hi {
                continue;
            }
            let below = outputs_at(generators, b, false);
            let above = outputs_at(generators, b, true);
            let below_sum: f64 = below.iter().sum();
            let above_sum: f64 = above.iter().sum();
            if below_sum <= demand && demand <= above_sum {
                lo = b;
                hi = b;
                low = below;
                high = above;
                low_sum = below_sum;
                high_sum = above_sum;
                bracketed_exactly = true;
                break;
            }
        }

        while !bracketed_exactly
            && high_sum - low_sum > self.config.tolerance
            && iterations < self.config.max_iterations
        {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            iterations += 1;

            let below = outputs_at(generators, mid, false);
            let below_sum: f64 = below.iter().sum();
            if below_sum > demand {
                hi = mid;
                high = below;
                high_sum = below_sum;
                continue;
            }

            let above = outputs_at(generators, mid, true);
            let above_sum: f64 = above.iter().sum();
            if above_sum < demand {
                lo = mid;
                low = above;
                low_sum = above_sum;
                continue;
            }

            // Demand falls inside the step of one or more linear units at `mid`.
            lo = mid;
            hi = mid;
            low = below;
            high = above;
            low_sum = below_sum;
            high_sum = above_sum;
            bracketed_exactly = true;
            break;
        }

        let gap = high_sum - low_sum;
        let converged = bracketed_exactly || gap <= self.config.tolerance;
        if !converged {
            debug!(
                "Lambda iteration stopped after {} iterations with a {:.6} MW bracket",
                iterations, gap
            );
        }

        let theta = if gap > 0.0 {
            ((demand - low_sum) / gap).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let outputs: Vec<f64> = generators
            .iter()
            .zip(low.iter().zip(high.iter()))
            .map(|(g, (&l, &h))| (l + theta * (h - l)).clamp(g.min_output, g.max_output))
            .collect();
        let total: f64 = outputs.iter().sum();

        Allocation {
            outputs,
            lambda: lo + theta * (hi - lo),
            method: DispatchMethod::LambdaIteration,
            iterations,
            converged,
            gap_mw: gap,
            residual_mw: total - demand,
        }
    }
}

impl Default for LambdaDispatcher {
    fn default() -> Self {
        Self::new(LambdaConfig::default())
    }
}

fn outputs_at(generators: &[Generator], lambda: f64, ties_high: bool) -> Vec<f64> {
    generators.iter().map(|g| g.output_at(lambda, ties_high)).collect()
}

fn pinned(
    generators: &[Generator],
    outputs: Vec<f64>,
    method: DispatchMethod,
    residual_mw: f64,
) -> Allocation {
    let lambda = generators
        .iter()
        .zip(outputs.iter())
        .map(|(g, &p)| g.cost.marginal(p))
        .fold(f64::NEG_INFINITY, f64::max);
    Allocation {
        outputs,
        lambda,
        method,
        iterations: 0,
        converged: true,
        gap_mw: 0.0,
        residual_mw,
    }
}

/// Unconstrained optimum `lambda = (D + sum(b/2c)) / sum(1/2c)`, accepted only
/// when every unit lands inside its limits.
fn closed_form(generators: &[Generator], demand: f64) -> Option<Allocation> {
    if generators.iter().any(|g| g.cost.is_linear()) {
        return None;
    }

    let mut weight_sum = 0.0;
    let mut offset_sum = 0.0;
    for g in generators {
        let inv = 1.0 / (2.0 * g.cost.quadratic);
        weight_sum += inv;
        offset_sum += g.cost.linear * inv;
    }
    let lambda = (demand + offset_sum) / weight_sum;

    let mut outputs = Vec::with_capacity(generators.len());
    for g in generators {
        let p = (lambda - g.cost.linear) / (2.0 * g.cost.quadratic);
        if p < g.min_output - BOUND_SLACK || p > g.max_output + BOUND_SLACK {
            return None;
        }
        outputs.push(p.clamp(g.min_output, g.max_output));
    }
    let total: f64 = outputs.iter().sum();

    Some(Allocation {
        outputs,
        lambda,
        method: DispatchMethod::ClosedForm,
        iterations: 0,
        converged: true,
        gap_mw: 0.0,
        residual_mw: total - demand,
    })
}
