pub mod common;
pub mod lambda;

/// Re-export common types
pub use common::*;
pub use lambda::LambdaDispatcher;
