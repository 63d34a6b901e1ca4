//! Household financial planning engine: net-worth scenarios, FIRE age,
//! resilience scoring and retirement drawdown under several withdrawal
//! policies. Exposed as a library, a CLI and an HTTP API.

pub mod api;
pub mod core;
pub mod logging;
