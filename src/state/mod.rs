//! Reactive state
//!
//! Observable cells and the per-client Load State triple built from them.

pub mod cell;
pub mod load_state;

pub use cell::Cell;
pub use load_state::{LoadPhase, LoadSnapshot, LoadState, Payload};
