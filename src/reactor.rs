//! Reactor state and tick physics
//!
//! This module contains the reactor state record, the tunable physics
//! constants, and the single-tick update algorithm. The cycle loop that
//! drives repeated ticks lives in [`crate::cycle`].

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to the host. Graceful terminations are not errors; they
/// are reported as [`TerminalCause`](crate::cycle::TerminalCause) values.
#[derive(Debug, Error)]
pub enum ReactorError {
    /// A work mode selector outside the two recognized variants. Never
    /// silently defaulted.
    #[error("unknown work mode: {0}")]
    UnknownWorkMode(String),

    /// A config or scenario file could not be read.
    #[error("failed to read {}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A config or scenario file did not parse.
    #[error("invalid JSON in {}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Selects which temperature-update rule a tick applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkMode {
    /// Heating accumulates: each tick adds the splitting speed to the
    /// current temperature.
    HeatWithinWork,
    /// Heating overwrites: each tick sets the temperature to the splitting
    /// speed before cooling is applied. A distinct physical regime, not a
    /// variation of [`WorkMode::HeatWithinWork`].
    HeatByFormulae,
}

impl FromStr for WorkMode {
    type Err = ReactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HeatWithinWork" => Ok(WorkMode::HeatWithinWork),
            "HeatByFormulae" => Ok(WorkMode::HeatByFormulae),
            other => Err(ReactorError::UnknownWorkMode(other.to_string())),
        }
    }
}

/// Tunable physics constants for the cycle.
///
/// Defaults match the reference reactor; any subset may be overridden from
/// a JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Gross energy produced per unit of splitting speed.
    pub output_coefficient: f64,
    /// Fuel consumed per unit of splitting speed per tick.
    pub fuel_efficiency: f64,
    /// Passive temperature drop applied every tick.
    pub coolant_rate: f64,
    /// Temperature above which high-temperature observers fire.
    pub safety_threshold: f64,
    /// Temperature at which the cycle stops.
    pub upper_temperature_limit: f64,
    /// Pause between ticks [ms].
    pub pacing_interval_ms: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            output_coefficient: 5.0,
            fuel_efficiency: 0.05,
            coolant_rate: 10.0,
            safety_threshold: 300.0,
            upper_temperature_limit: 380.0,
            pacing_interval_ms: 100,
        }
    }
}

impl ReactorConfig {
    /// Pause between ticks.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReactorError> {
        read_json(path.as_ref())
    }

    /// Try the conventional config locations, falling back to defaults when
    /// none exists. A present-but-malformed file is an error, not a silent
    /// fallback.
    pub fn load_or_default() -> Result<Self, ReactorError> {
        let config_paths = ["config/reactor.json", "../config/reactor.json"];

        for path in &config_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        warn!("no reactor config found, using defaults");
        Ok(Self::default())
    }
}

/// Complete reactor state advanced by the cycle.
///
/// The host owns the record; a [`ReactorCycle`](crate::cycle::ReactorCycle)
/// borrows it exclusively for the duration of a run and never takes
/// ownership. `power_consumption`, `speed_of_splitting`, and `work_mode`
/// are host inputs the cycle reads but never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorState {
    /// Core temperature. No lower bound; the cycle stops at the upper limit.
    pub temperature: f64,
    /// Remaining fuel quantity.
    pub fuel: f64,
    /// Accumulated net energy. Unbounded.
    pub stored_energy: f64,
    /// Gross output of the last tick. Informational only.
    pub energy_output: f64,
    /// External load drawn from stored energy each tick.
    pub power_consumption: f64,
    /// Reaction rate control input.
    pub speed_of_splitting: f64,
    /// Selects the temperature-update rule.
    pub work_mode: WorkMode,
}

impl Default for ReactorState {
    fn default() -> Self {
        // Cold, idle core
        Self {
            temperature: 20.0,
            fuel: 100.0,
            stored_energy: 0.0,
            energy_output: 0.0,
            power_consumption: 0.0,
            speed_of_splitting: 0.0,
            work_mode: WorkMode::HeatWithinWork,
        }
    }
}

impl ReactorState {
    /// Load initial conditions from a JSON scenario file. Missing fields
    /// keep their [`Default`] values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReactorError> {
        read_json(path.as_ref())
    }

    /// Advance the state by one tick.
    ///
    /// The five updates run in fixed order; later steps read values written
    /// by earlier ones within the same tick. No other fields are touched.
    pub fn tick(&mut self, config: &ReactorConfig) {
        // 1. Gross output for this tick
        self.energy_output = config.output_coefficient * self.speed_of_splitting;

        // 2. Energy balance: production minus external load
        self.stored_energy += config.output_coefficient * self.speed_of_splitting;
        self.stored_energy -= self.power_consumption;

        // 3. Mode-specific heating
        match self.work_mode {
            WorkMode::HeatWithinWork => self.temperature += self.speed_of_splitting,
            WorkMode::HeatByFormulae => self.temperature = self.speed_of_splitting,
        }

        // 4. Fuel burn
        self.fuel -= config.fuel_efficiency * self.speed_of_splitting;

        // 5. Passive cooling, every tick
        self.temperature -= config.coolant_rate;
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReactorError> {
    let content = fs::read_to_string(path).map_err(|source| ReactorError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ReactorError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn scenario_state(work_mode: WorkMode) -> ReactorState {
        ReactorState {
            temperature: 250.0,
            fuel: 10.0,
            stored_energy: 0.0,
            energy_output: 0.0,
            power_consumption: 1.0,
            speed_of_splitting: 2.0,
            work_mode,
        }
    }

    #[test]
    fn tick_heats_cumulatively_within_work() {
        let config = ReactorConfig::default();
        let mut state = scenario_state(WorkMode::HeatWithinWork);

        state.tick(&config);

        assert_relative_eq!(state.energy_output, 10.0);
        assert_relative_eq!(state.stored_energy, 9.0);
        assert_relative_eq!(state.temperature, 242.0);
        assert_relative_eq!(state.fuel, 9.9);
    }

    #[test]
    fn tick_overwrites_temperature_by_formulae() {
        let config = ReactorConfig::default();
        let mut state = scenario_state(WorkMode::HeatByFormulae);

        state.tick(&config);

        // Overwrite with the splitting speed, then cool
        assert_relative_eq!(state.temperature, -8.0);
        assert_relative_eq!(state.stored_energy, 9.0);
        assert_relative_eq!(state.fuel, 9.9);
    }

    #[test]
    fn fuel_burn_is_mode_independent() {
        let config = ReactorConfig::default();

        for work_mode in [WorkMode::HeatWithinWork, WorkMode::HeatByFormulae] {
            let mut state = scenario_state(work_mode);
            state.tick(&config);
            assert_relative_eq!(state.fuel, 10.0 - 0.05 * 2.0);
        }
    }

    #[test]
    fn stored_energy_balances_output_against_load() {
        let config = ReactorConfig::default();
        let mut state = scenario_state(WorkMode::HeatWithinWork);
        state.stored_energy = 40.0;
        state.power_consumption = 3.0;

        state.tick(&config);

        assert_relative_eq!(state.stored_energy, 40.0 + 5.0 * 2.0 - 3.0);
    }

    #[test]
    fn tick_leaves_host_inputs_untouched() {
        let config = ReactorConfig::default();
        let mut state = scenario_state(WorkMode::HeatWithinWork);

        state.tick(&config);

        assert_relative_eq!(state.power_consumption, 1.0);
        assert_relative_eq!(state.speed_of_splitting, 2.0);
        assert_eq!(state.work_mode, WorkMode::HeatWithinWork);
    }

    #[test]
    fn unknown_work_mode_is_rejected() {
        let err = "HeatUntilMeltdown".parse::<WorkMode>().unwrap_err();
        assert!(matches!(err, ReactorError::UnknownWorkMode(mode) if mode == "HeatUntilMeltdown"));
    }

    #[test]
    fn scenario_with_unknown_work_mode_fails_to_parse() {
        let result = serde_json::from_str::<ReactorState>(
            r#"{"temperature": 250.0, "work_mode": "HeatUntilMeltdown"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn partial_scenario_fills_in_defaults() {
        let state: ReactorState =
            serde_json::from_str(r#"{"temperature": 305.0, "fuel": 2.5}"#).unwrap();

        assert_relative_eq!(state.temperature, 305.0);
        assert_relative_eq!(state.fuel, 2.5);
        assert_eq!(state.work_mode, WorkMode::HeatWithinWork);
    }

    #[test]
    fn config_overrides_merge_with_defaults() {
        let config: ReactorConfig =
            serde_json::from_str(r#"{"coolant_rate": 2.5, "pacing_interval_ms": 10}"#).unwrap();

        assert_relative_eq!(config.coolant_rate, 2.5);
        assert_relative_eq!(config.output_coefficient, 5.0);
        assert_eq!(config.pacing_interval(), Duration::from_millis(10));
    }
}
