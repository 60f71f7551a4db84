mod seed;

pub use seed::Seed;

use crate::{
    error::{SimError, SimResult},
    util::curve::{ColorKey, Curve, Gradient, WrapMode},
    weather::Effect,
    Degrees, Hours, NumRange, Rgb,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use validator::{Validate, ValidationError};

/// Configuration for an entire simulation: terrain, clock, weather and
/// lighting. Two simulations built from the same config and driven with the
/// same frame deltas behave identically.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for everything random in the simulation. See [Seed] for the
    /// accepted formats.
    pub seed: Seed,

    /// Terrain size and heightmap generation
    #[validate]
    pub terrain: TerrainConfig,

    /// Length of a day and where the clock starts
    #[validate]
    pub clock: ClockConfig,

    /// Weather states and how the weather changes
    #[validate]
    pub weather: WeatherConfig,

    /// Sun and ambient light curves
    #[validate]
    pub lighting: LightingConfig,
}

impl SimConfig {
    /// Run every validation rule on this config, including the cross-field
    /// checks that `#[validate]` can't express.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.weather.check_state_names()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Danger! This means the default will vary between calls!
            seed: Seed::random(),
            terrain: TerrainConfig::default(),
            clock: ClockConfig::default(),
            weather: WeatherConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

/// Everything that defines the shape of the terrain. Owned by the heightmap
/// generator; the weather system is the only thing that changes it at
/// runtime, and only between generation passes.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TerrainConfig {
    /// Size of the terrain along the world X axis, in meters.
    #[validate(custom = "validate_positive")]
    pub width: f64,

    /// Size of the terrain along the world Z axis, in meters.
    #[validate(custom = "validate_positive")]
    pub length: f64,

    /// World height of a heightmap value of 1.0, in meters.
    #[validate(custom = "validate_positive")]
    pub height_scale: f64,

    /// Number of heightmap samples along each edge. The grid is always
    /// square. Odd sizes (2^n + 1) put a sample exactly on every edge and
    /// the centre.
    #[validate(range(min = 1, max = 8193))]
    pub resolution: u32,

    /// How many noise "cells" span the terrain. Bigger values give busier,
    /// hillier terrain. Zero or negative values produce flat terrain at half
    /// height.
    #[validate(custom = "validate_finite")]
    pub noise_scale: f64,

    /// Raw noise is multiplied by this before shaping. The weather system
    /// overwrites this with the active weather's multiplier.
    #[validate(custom = "validate_finite")]
    pub height_multiplier: f64,

    /// Flip the noise upside down (`1 - noise`) before any other shaping.
    pub invert: bool,

    /// Maps the multiplied noise value to the final height. The output is
    /// clamped to [0,1] afterwards, so the curve can overshoot freely.
    #[validate(custom = "validate_curve")]
    pub shaping_curve: Curve,

    /// The noise function used to build the height field
    #[validate]
    pub noise: NoiseFnConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 512.0,
            length: 512.0,
            height_scale: 50.0,
            resolution: 513,
            noise_scale: 20.0,
            height_multiplier: 1.0,
            invert: false,
            shaping_curve: Curve::linear(),
            noise: NoiseFnConfig::default(),
        }
    }
}

/// Config for the coherent noise function behind the height field. We use
/// <https://crates.io/crates/noise> for noise generation. The frequency of
/// the function isn't configured here, it comes from
/// [TerrainConfig::noise_scale].
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NoiseFnConfig {
    pub noise_type: NoiseFnType,

    /// Number of different frequencies to add together. Ignored for
    /// [NoiseFnType::Perlin], which is always a single octave.
    #[validate(range(min = 1, max = 32))]
    pub octaves: usize,

    /// Frequency multiplier between successive octaves.
    #[validate(custom = "validate_finite")]
    pub lacunarity: f64,

    /// Amplitude multiplier between successive octaves. E.g. with 3 octaves
    /// and a persistence of 0.5, the amplitudes are `[1.0, 0.5, 0.25]`.
    #[validate(custom = "validate_finite")]
    pub persistence: f64,
}

impl Default for NoiseFnConfig {
    fn default() -> Self {
        Self {
            noise_type: NoiseFnType::Perlin,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

/// The supported noise functions. Everything except [NoiseFnType::Perlin]
/// is a multi-fractal built on top of Perlin noise. See
/// <https://docs.rs/noise/0.9.0/noise/trait.MultiFractal.html>.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoiseFnType {
    /// Plain single-octave gradient noise
    Perlin,
    BasicMulti,
    Billow,
    Fbm,
    HybridMulti,
    RidgedMulti,
}

/// Day length and starting time for the solar clock.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClockConfig {
    /// Real (simulated) seconds it takes for a full 24 hour day to pass.
    #[validate(custom = "validate_positive")]
    pub day_seconds: f64,

    /// Time of day when the simulation starts, in hours. Must be in [0,24).
    /// 0 is midnight, 12 is noon.
    #[validate(custom = "validate_time_of_day")]
    pub initial_time: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            day_seconds: 120.0,
            initial_time: 6.0,
        }
    }
}

/// Weather states and the policy that moves between them.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WeatherConfig {
    /// Name of the state that's active when the simulation starts
    pub initial_state: String,

    /// How the weather decides to change. Exactly one policy runs per
    /// simulation.
    #[validate(custom = "validate_policy")]
    pub policy: WeatherPolicy,

    /// Every weather state the simulation knows about. Names must be unique.
    #[validate(custom = "validate_states")]
    pub states: Vec<WeatherStateConfig>,
}

impl WeatherConfig {
    /// Look up a state by name
    pub fn state(&self, name: &str) -> Option<&WeatherStateConfig> {
        self.states.iter().find(|state| state.name == name)
    }

    /// Make sure every state name referenced outside the table (initial
    /// state, day/night states) exists in the table.
    pub fn check_state_names(&self) -> SimResult<()> {
        if self.state(&self.initial_state).is_none() {
            return Err(SimError::invalid_field(
                "initial_state",
                "unknown_state",
            ));
        }
        if let WeatherPolicy::DayNight { day, night } = &self.policy {
            if self.state(day).is_none() || self.state(night).is_none() {
                return Err(SimError::invalid_field("policy", "unknown_state"));
            }
        }
        Ok(())
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            initial_state: "clear".into(),
            policy: WeatherPolicy::default(),
            states: vec![
                WeatherStateConfig::new("clear", 1.0, &[]),
                WeatherStateConfig::new(
                    "rain",
                    0.8,
                    &[Effect::Rain, Effect::Fog],
                ),
                WeatherStateConfig::new("snow", 1.2, &[Effect::Snow]),
            ],
        }
    }
}

/// How the weather changes over time. These two behaviors produce different
/// results, so a simulation picks exactly one of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WeatherPolicy {
    /// Every `interval_seconds` of simulated time, pick a state uniformly at
    /// random from the whole table (possibly the current one), regardless of
    /// the time of day.
    Interval { interval_seconds: f64 },
    /// Follow the clock: the `night` state between 18:00 and 06:00, the
    /// `day` state otherwise. Only switches when the classification changes.
    DayNight { day: String, night: String },
}

impl Default for WeatherPolicy {
    fn default() -> Self {
        Self::Interval {
            interval_seconds: 10.0,
        }
    }
}

/// One entry in the weather table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherStateConfig {
    /// Unique name, used to select the state
    pub name: String,
    /// Terrain height multiplier applied while this state is active
    pub terrain_multiplier: f64,
    /// Visual effects that should be running while this state is active
    #[serde(default)]
    pub effects: BTreeSet<Effect>,
}

impl WeatherStateConfig {
    pub fn new(
        name: &str,
        terrain_multiplier: f64,
        effects: &[Effect],
    ) -> Self {
        Self {
            name: name.into(),
            terrain_multiplier,
            effects: effects.iter().copied().collect(),
        }
    }
}

/// Sun and ambient light over the course of a day.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LightingConfig {
    /// Sun intensity at the peak of [Self::sun_intensity_curve]
    #[validate(range(min = 0.0), custom = "validate_finite")]
    pub max_sun_intensity: f64,

    /// Fixed compass heading of the sun's arc
    pub sun_yaw: Degrees,

    /// How fast the skybox turns relative to the time of day. At 1.0 the
    /// skybox makes a full turn per day.
    #[validate(custom = "validate_finite")]
    pub skybox_rotation_factor: f64,

    /// Sun intensity factor over the normalized day (0 = midnight, 0.5 =
    /// noon). Should loop, with matching values at 0 and 1.
    #[validate(custom = "validate_curve")]
    pub sun_intensity_curve: Curve,

    /// Ambient light color over the normalized day. Always loops.
    #[validate(custom = "validate_gradient")]
    pub ambient_gradient: Gradient,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            max_sun_intensity: 3.0,
            sun_yaw: Degrees(170.0),
            skybox_rotation_factor: 0.3,
            sun_intensity_curve: Curve::from_points(
                WrapMode::Loop,
                &[
                    (0.0, 0.1),  // midnight
                    (0.25, 0.2), // dawn
                    (0.5, 1.0),  // noon
                    (0.75, 0.2), // dusk
                    (1.0, 0.1),  // midnight
                ],
            ),
            ambient_gradient: Gradient {
                keys: vec![
                    ColorKey {
                        time: 0.0,
                        color: Rgb::new_int(18, 22, 48),
                    },
                    ColorKey {
                        time: 0.25,
                        color: Rgb::new_int(230, 150, 90),
                    },
                    ColorKey {
                        time: 0.5,
                        color: Rgb::new_int(200, 210, 225),
                    },
                    ColorKey {
                        time: 0.75,
                        color: Rgb::new_int(220, 120, 80),
                    },
                ],
            },
        }
    }
}

fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("positive"))
    }
}

fn validate_time_of_day(value: f64) -> Result<(), ValidationError> {
    // Upper bound is exclusive, 24:00 is spelled 0:00
    if value < Hours::DAY.0 {
        NumRange::new(Hours(0.0), Hours::DAY).ensure_contains(Hours(value))
    } else {
        Err(ValidationError::new("range"))
    }
}

fn validate_curve(curve: &Curve) -> Result<(), ValidationError> {
    curve.validate().map_err(|_| ValidationError::new("curve"))
}

fn validate_gradient(gradient: &Gradient) -> Result<(), ValidationError> {
    gradient
        .validate()
        .map_err(|_| ValidationError::new("gradient"))
}

fn validate_policy(policy: &WeatherPolicy) -> Result<(), ValidationError> {
    match policy {
        WeatherPolicy::Interval { interval_seconds } => {
            validate_positive(*interval_seconds)
        }
        WeatherPolicy::DayNight { .. } => Ok(()),
    }
}

fn validate_states(
    states: &Vec<WeatherStateConfig>,
) -> Result<(), ValidationError> {
    if states.is_empty() {
        return Err(ValidationError::new("empty"));
    }
    let mut names = HashSet::new();
    for state in states {
        if state.name.is_empty() || !names.insert(state.name.as_str()) {
            return Err(ValidationError::new("name"));
        }
        validate_finite(state.terrain_multiplier)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().check().is_ok());
    }

    #[test]
    fn test_time_of_day_bounds() {
        assert!(validate_time_of_day(0.0).is_ok());
        assert!(validate_time_of_day(23.99).is_ok());
        assert!(validate_time_of_day(24.0).is_err());
        assert!(validate_time_of_day(-0.5).is_err());
        assert!(validate_time_of_day(f64::NAN).is_err());
    }

    #[test]
    fn test_weather_table_checks() {
        let mut config = WeatherConfig::default();
        config.states.push(WeatherStateConfig::new("rain", 0.5, &[]));
        assert!(config.validate().is_err());

        let config = WeatherConfig {
            states: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WeatherConfig {
            initial_state: "hail".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.check_state_names().unwrap_err().invalid_fields(),
            ["initial_state"]
        );

        let config = WeatherConfig {
            policy: WeatherPolicy::DayNight {
                day: "clear".into(),
                night: "fog".into(),
            },
            ..Default::default()
        };
        assert_eq!(
            config.check_state_names().unwrap_err().invalid_fields(),
            ["policy"]
        );
    }

    #[test]
    fn test_interval_policy_must_be_positive() {
        let config = WeatherConfig {
            policy: WeatherPolicy::Interval {
                interval_seconds: 0.0,
            },
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.errors().contains_key("policy"));
    }
}
