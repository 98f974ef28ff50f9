//! Tunable constants for the status core.
//!
//! [`StatusConfig::default`] reproduces the shipped balance values. The bleed
//! low-HP scaling and the aura outer bound are design constants without a
//! derivation; they live here so designers can tune them without code changes.
//!
//! # Example
//!
//! ```
//! use status_core::config::StatusConfig;
//!
//! let config = StatusConfig::from_json_str(r#"{ "dt": 0.05, "aggregation_interval": 0.25 }"#)
//!     .expect("valid config");
//! assert!((config.dt - 0.05).abs() < f32::EPSILON);
//! // Unspecified fields keep their defaults.
//! assert!((config.aura_outer_bound - 10.0).abs() < f32::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

use crate::effect::DebuffKind;
use crate::error::ConfigError;

/// Tunable constants for mitigation, debuff timing and aura aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Fixed simulation timestep (seconds).
    pub dt: f32,
    /// Seconds between poison damage ticks.
    pub poison_tick_interval: f32,
    /// Seconds between burn damage ticks.
    pub burn_tick_interval: f32,
    /// Seconds between bleed damage ticks.
    pub bleed_tick_interval: f32,
    /// Delay between a fresh DoT application and its first tick.
    pub first_tick_delay: f32,
    /// Movement speed multiplier while frozen.
    pub freeze_speed_multiplier: f32,
    /// Floor for a mitigated duration (seconds).
    pub min_duration: f32,
    /// Floor for integer tick damage after mitigation.
    pub min_tick_damage: f32,
    /// Resist chance in percent per point of resistance.
    pub resist_chance_factor: f32,
    /// Fraction of resistance applied as magnitude reduction.
    pub magnitude_reduction_factor: f32,
    /// Bleed damage multiplier at 0% HP.
    pub bleed_empty_hp_multiplier: f32,
    /// Bleed damage multiplier at 100% HP.
    pub bleed_full_hp_multiplier: f32,
    /// Search radius for aura providers; must cover the largest aura radius.
    pub aura_outer_bound: f32,
    /// Seconds between aura aggregation passes.
    pub aggregation_interval: f32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            poison_tick_interval: 1.0,
            burn_tick_interval: 0.5,
            bleed_tick_interval: 0.7,
            first_tick_delay: 0.01,
            freeze_speed_multiplier: 0.3,
            min_duration: 0.5,
            min_tick_damage: 1.0,
            resist_chance_factor: 0.6,
            magnitude_reduction_factor: 0.5,
            bleed_empty_hp_multiplier: 2.0,
            bleed_full_hp_multiplier: 1.0,
            aura_outer_bound: 10.0,
            aggregation_interval: 0.5,
        }
    }
}

impl StatusConfig {
    /// Parses a JSON document and validates it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and a validation
    /// error if any field is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("dt", self.dt)?;
        positive("poison_tick_interval", self.poison_tick_interval)?;
        positive("burn_tick_interval", self.burn_tick_interval)?;
        positive("bleed_tick_interval", self.bleed_tick_interval)?;
        positive("min_duration", self.min_duration)?;
        positive("aura_outer_bound", self.aura_outer_bound)?;
        positive("aggregation_interval", self.aggregation_interval)?;
        non_negative("first_tick_delay", self.first_tick_delay)?;
        non_negative("freeze_speed_multiplier", self.freeze_speed_multiplier)?;
        non_negative("min_tick_damage", self.min_tick_damage)?;
        non_negative("resist_chance_factor", self.resist_chance_factor)?;
        non_negative("magnitude_reduction_factor", self.magnitude_reduction_factor)?;
        non_negative("bleed_empty_hp_multiplier", self.bleed_empty_hp_multiplier)?;
        non_negative("bleed_full_hp_multiplier", self.bleed_full_hp_multiplier)?;
        Ok(())
    }

    /// Returns the damage tick interval for a DoT kind, `None` otherwise.
    #[must_use]
    pub fn tick_interval(&self, kind: DebuffKind) -> Option<f32> {
        match kind {
            DebuffKind::Poison => Some(self.poison_tick_interval),
            DebuffKind::Burn => Some(self.burn_tick_interval),
            DebuffKind::Bleed => Some(self.bleed_tick_interval),
            _ => None,
        }
    }

    /// Bleed damage multiplier for the given HP fraction.
    ///
    /// Linear from `bleed_empty_hp_multiplier` at 0 HP to
    /// `bleed_full_hp_multiplier` at full HP; the fraction is clamped to `[0, 1]`.
    #[must_use]
    pub fn bleed_multiplier(&self, hp_fraction: f32) -> f32 {
        let t = if hp_fraction.is_nan() {
            1.0
        } else {
            hp_fraction.clamp(0.0, 1.0)
        };
        self.bleed_empty_hp_multiplier
            + (self.bleed_full_hp_multiplier - self.bleed_empty_hp_multiplier) * t
    }

    /// Returns this config with a different timestep.
    #[must_use]
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Returns this config with a different aggregation cadence.
    #[must_use]
    pub fn with_aggregation_interval(mut self, interval: f32) -> Self {
        self.aggregation_interval = interval;
        self
    }

    /// Returns this config with a different aura search radius.
    #[must_use]
    pub fn with_aura_outer_bound(mut self, bound: f32) -> Self {
        self.aura_outer_bound = bound;
        self
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
