//! Fleet and demand data model
//!
//! Immutable descriptions of the generating units and of the demand/reserve
//! series they must cover. Produced by an external loader, validated once
//! before the solver starts and read-only afterwards.

pub mod scenario;
pub mod unit;

// Re-export main types
pub use scenario::ScenarioSpec;
pub use unit::{validate_fleet, ColdStart, InitialStatus, UnitId, UnitSpec};
pub use unitcommit_dispatch::QuadraticCost;
