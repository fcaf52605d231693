//! Core stack evaluation for cirrus
//!
//! This library provides:
//! - Stack validation (CIDR math, reference resolution, the public-subnet
//!   contract) run before any provider work
//! - The resource dependency graph and its topological order
//! - Plan computation: desired declarations diffed against an observed
//!   state snapshot
//! - Output projection from resolved state

pub mod error;
pub mod graph;
pub mod outputs;
pub mod plan;
pub mod state;
pub mod validate;

pub use error::{CoreError, Result};
pub use graph::DependencyGraph;
pub use outputs::project_outputs;
pub use plan::{plan_stack, Action, Plan, PlannedStep};
pub use state::{ResourceRecord, StateSnapshot};
pub use validate::{validate_stack, ValidationError, ValidationFailure};
