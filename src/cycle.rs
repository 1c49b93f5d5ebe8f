//! The reactor cycle: repeated ticks with pacing and cooperative cancellation.
//!
//! A [`ReactorCycle`] drives a [`ReactorState`] through ticks until the
//! temperature limit is hit, the fuel cannot cover the next tick, or the
//! host cancels. Two runners share the same per-iteration logic and differ
//! only in how they pace: [`ReactorCycle::run`] yields to the tokio
//! scheduler between ticks, while [`ReactorCycle::run_blocking`] sleeps the
//! calling thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::reactor::{ReactorConfig, ReactorState};

/// Cooperative cancellation flag, polled at iteration boundaries.
///
/// Clones share the underlying flag: the host keeps one clone and hands
/// another to the cycle run. Cancellation requested mid-tick takes effect at
/// the next boundary; it never interrupts a tick in flight, so the state is
/// never left partially updated.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a cycle run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalCause {
    /// The host set the cancel token.
    Cancelled,
    /// Temperature reached the configured upper limit.
    TemperatureLimitReached,
    /// Remaining fuel cannot cover the next tick's consumption.
    FuelExhausted,
}

type Observer = Box<dyn Fn(f64) + Send>;

/// Drives repeated ticks against a borrowed [`ReactorState`].
///
/// A cycle runs once. After a run terminates, the cycle remembers its
/// terminal cause; re-invoking a runner returns that cause without applying
/// further ticks. Construct a fresh cycle for a fresh run.
pub struct ReactorCycle {
    config: ReactorConfig,
    observers: Vec<Observer>,
    finished: Option<TerminalCause>,
}

impl Default for ReactorCycle {
    fn default() -> Self {
        Self::new(ReactorConfig::default())
    }
}

impl ReactorCycle {
    pub fn new(config: ReactorConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            finished: None,
        }
    }

    /// Tunables this cycle runs with.
    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Register a high-temperature observer on this cycle.
    ///
    /// Observers fire synchronously at the start of every iteration whose
    /// temperature is above the safety threshold, before that iteration's
    /// tick, and receive the current temperature. They re-fire on each
    /// qualifying iteration for as long as the temperature stays high. A
    /// slow observer delays the next tick.
    pub fn on_high_temperature(&mut self, observer: impl Fn(f64) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Terminal cause of a finished run, if any.
    pub fn terminal_cause(&self) -> Option<TerminalCause> {
        self.finished
    }

    /// Apply one tick to `state` using this cycle's tunables.
    pub fn tick(&self, state: &mut ReactorState) {
        state.tick(&self.config);
    }

    /// One iteration boundary: check the stop conditions, poll the cancel
    /// token, notify observers, tick. Returns the terminal cause once the
    /// run is over, before any state mutation for that iteration.
    fn advance(&self, state: &mut ReactorState, cancel: &CancelToken) -> Option<TerminalCause> {
        if state.temperature >= self.config.upper_temperature_limit {
            debug!(
                "temperature {} reached the upper limit {}",
                state.temperature, self.config.upper_temperature_limit
            );
            return Some(TerminalCause::TemperatureLimitReached);
        }
        if state.fuel < self.config.fuel_efficiency * state.speed_of_splitting {
            debug!("fuel {} cannot cover the next tick", state.fuel);
            return Some(TerminalCause::FuelExhausted);
        }
        if cancel.is_cancelled() {
            debug!("reactor cycle interrupted by cancel token");
            return Some(TerminalCause::Cancelled);
        }

        if state.temperature > self.config.safety_threshold && !self.observers.is_empty() {
            warn!(
                "temperature {} is above the safety threshold {}",
                state.temperature, self.config.safety_threshold
            );
            for observer in &self.observers {
                observer(state.temperature);
            }
        }

        self.tick(state);
        None
    }

    /// Run the cycle to termination, yielding to the scheduler between
    /// ticks.
    pub async fn run(&mut self, state: &mut ReactorState, cancel: &CancelToken) -> TerminalCause {
        if let Some(cause) = self.finished {
            return cause;
        }

        let cause = loop {
            if let Some(cause) = self.advance(state, cancel) {
                break cause;
            }
            // pause between cycles
            tokio::time::sleep(self.config.pacing_interval()).await;
        };

        self.complete(cause, state)
    }

    /// Run the cycle to termination on the calling thread, sleeping between
    /// ticks. Intended for hosts that dedicate a worker thread to the cycle.
    pub fn run_blocking(&mut self, state: &mut ReactorState, cancel: &CancelToken) -> TerminalCause {
        if let Some(cause) = self.finished {
            return cause;
        }

        let cause = loop {
            if let Some(cause) = self.advance(state, cancel) {
                break cause;
            }
            // pause between cycles
            std::thread::sleep(self.config.pacing_interval());
        };

        self.complete(cause, state)
    }

    fn complete(&mut self, cause: TerminalCause, state: &ReactorState) -> TerminalCause {
        self.finished = Some(cause);
        info!(
            "reactor cycle stopped: {:?} (temperature {}, fuel {})",
            cause, state.temperature, state.fuel
        );
        cause
    }
}
