//! Simplified Atomic Reactor Simulation
//!
//! This library models a simplified nuclear reactor advanced over discrete
//! time steps by a cooperatively cancellable cycle loop.
//!
//! The host owns a [`ReactorState`], constructs a [`ReactorCycle`] with
//! tunable [`ReactorConfig`] constants, and starts a run with a
//! [`CancelToken`]. The run terminates with a [`TerminalCause`] when the
//! temperature limit is reached, fuel is exhausted, or the host cancels.

pub mod cycle;
pub mod reactor;

pub use cycle::{CancelToken, ReactorCycle, TerminalCause};
pub use reactor::{ReactorConfig, ReactorError, ReactorState, WorkMode};
