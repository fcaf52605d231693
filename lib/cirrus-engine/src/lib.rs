//! Realization engine for cirrus stacks
//!
//! This library provides:
//! - The CloudProvider trait: the seam between planned steps and whatever
//!   actually creates resources
//! - MemoryProvider: an in-memory provider for tests and dry runs
//! - The applier: walks a plan in dependency order, propagates resolved
//!   identifiers, and reports partial realization
//! - State file load/save

pub mod apply;
pub mod error;
pub mod provider;
pub mod store;

pub use apply::{Applier, ApplyReport};
pub use error::{EngineError, Result};
pub use provider::{CloudProvider, MemoryProvider};
pub use store::{load_state, save_state};
