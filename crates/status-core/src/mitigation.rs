//! Resistance-driven mitigation of incoming debuffs.
//!
//! Mitigation is a pure function of (resistance, requested duration,
//! requested magnitude, random draw):
//!
//! 1. Resist chance is `resistance * 0.6` percent. A draw from `[0, 100)`
//!    below that chance negates the application entirely.
//! 2. Otherwise duration is scaled by `1 - resistance / 100` and floored at
//!    0.5 s, and magnitude is scaled by `1 - resistance * 0.5 / 100`.
//! 3. Whole-damage magnitudes are rounded and floored at 1; fractional
//!    magnitudes are clamped to `[0, 1]`.
//!
//! The draw is injected, either directly through [`Mitigator::mitigate_with_draw`]
//! or from a caller-owned RNG through [`Mitigator::mitigate`], so the
//! calculator holds no state and is reproducible under a seeded RNG.
//!
//! # Example
//!
//! ```
//! use status_core::mitigation::{MagnitudeScale, Mitigation, Mitigator};
//!
//! let mitigator = Mitigator::default();
//!
//! // 50 resistance: 30% resist chance. A draw of 75 is not resisted.
//! let outcome = mitigator.mitigate_with_draw(75.0, 50.0, 10.0, 8.0, MagnitudeScale::WholeDamage);
//! assert_eq!(outcome, Mitigation::Applied { duration: 5.0, magnitude: 6.0 });
//!
//! // A draw of 10 is.
//! let outcome = mitigator.mitigate_with_draw(10.0, 50.0, 10.0, 8.0, MagnitudeScale::WholeDamage);
//! assert_eq!(outcome, Mitigation::Resisted);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::StatusConfig;
use crate::effect::DebuffKind;

/// How a mitigated magnitude is normalised.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagnitudeScale {
    /// Integer damage per tick: rounded, floored at the minimum tick damage.
    WholeDamage,
    /// A fraction: clamped to `[0, 1]`.
    Fraction,
}

impl MagnitudeScale {
    /// The scale used for a debuff kind's magnitude.
    #[must_use]
    pub const fn for_debuff(kind: DebuffKind) -> Self {
        if kind.is_damage_over_time() {
            Self::WholeDamage
        } else {
            Self::Fraction
        }
    }
}

/// Result of mitigating one application.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mitigation {
    /// Fully negated; nothing is applied.
    Resisted,
    /// Applied with the scaled values.
    Applied {
        /// Effective duration in seconds.
        duration: f32,
        /// Effective magnitude.
        magnitude: f32,
    },
}

impl Mitigation {
    /// Returns `true` if the application was negated.
    #[must_use]
    pub const fn is_resisted(&self) -> bool {
        matches!(self, Self::Resisted)
    }
}

/// Mitigation constants, usually taken from [`StatusConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mitigator {
    resist_chance_factor: f32,
    magnitude_reduction_factor: f32,
    min_duration: f32,
    min_tick_damage: f32,
}

impl Default for Mitigator {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl Mitigator {
    /// Builds a mitigator from the configured constants.
    #[must_use]
    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            resist_chance_factor: config.resist_chance_factor,
            magnitude_reduction_factor: config.magnitude_reduction_factor,
            min_duration: config.min_duration,
            min_tick_damage: config.min_tick_damage,
        }
    }

    /// Resist chance in percent for a resistance value.
    ///
    /// Chances of 100 or more always resist. Negative or NaN resistance
    /// counts as zero.
    #[must_use]
    pub fn resist_chance(&self, resistance: f32) -> f32 {
        sanitize(resistance) * self.resist_chance_factor
    }

    /// Mitigates using a draw taken from `rng`, uniform in `[0, 100)`.
    pub fn mitigate<R>(
        &self,
        rng: &mut R,
        resistance: f32,
        duration: f32,
        magnitude: f32,
        scale: MagnitudeScale,
    ) -> Mitigation
    where
        R: Rng + ?Sized,
    {
        let draw: f32 = rng.gen_range(0.0..100.0);
        self.mitigate_with_draw(draw, resistance, duration, magnitude, scale)
    }

    /// Mitigates using an explicit draw in `[0, 100)`.
    #[must_use]
    pub fn mitigate_with_draw(
        &self,
        draw: f32,
        resistance: f32,
        duration: f32,
        magnitude: f32,
        scale: MagnitudeScale,
    ) -> Mitigation {
        let resistance = sanitize(resistance);
        if draw < self.resist_chance(resistance) {
            return Mitigation::Resisted;
        }

        Mitigation::Applied {
            duration: self.scale_duration(resistance, duration),
            magnitude: self.scale_magnitude(resistance, magnitude, scale),
        }
    }

    /// Duration after resistance, floored at the minimum duration.
    #[must_use]
    pub fn scale_duration(&self, resistance: f32, duration: f32) -> f32 {
        let reduction = sanitize(resistance) / 100.0;
        (sanitize(duration) * (1.0 - reduction)).max(self.min_duration)
    }

    /// Magnitude after resistance, normalised for `scale`.
    #[must_use]
    pub fn scale_magnitude(&self, resistance: f32, magnitude: f32, scale: MagnitudeScale) -> f32 {
        let reduction = sanitize(resistance) * self.magnitude_reduction_factor / 100.0;
        let scaled = (sanitize(magnitude) * (1.0 - reduction)).max(0.0);
        match scale {
            MagnitudeScale::WholeDamage => scaled.round().max(self.min_tick_damage),
            MagnitudeScale::Fraction => scaled.clamp(0.0, 1.0),
        }
    }
}

/// Maps negative and NaN inputs to zero.
fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}
