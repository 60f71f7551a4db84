//! Skyvale is a small procedural landscape simulation: a noise-generated
//! terrain heightmap, a day/night clock that drives sun and sky lighting,
//! and a weather system that reshapes the terrain when it changes. This
//! crate contains all of the simulation logic; it doesn't render anything
//! or run its own loop. A host drives it one frame at a time.
//!
//! ```
//! use skyvale::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! sim.init().unwrap();
//! for _ in 0..60 {
//!     let report = sim.tick(1.0 / 60.0).unwrap();
//!     println!("{} {}", report.wrapped_time, report.weather.name);
//! }
//! let height = sim.sample_height(256.0, 256.0);
//! ```
//!
//! See [SimConfig] for details on how the simulation can be customized.

mod clock;
mod config;
mod error;
mod lighting;
pub mod render;
mod sim;
pub mod terrain;
mod util;
mod weather;

pub use crate::{
    clock::{Calendar, SolarClock},
    config::{
        ClockConfig, LightingConfig, NoiseFnConfig, NoiseFnType, Seed,
        SimConfig, TerrainConfig, WeatherConfig, WeatherPolicy,
        WeatherStateConfig,
    },
    error::{SimError, SimResult},
    lighting::{LightingModel, LightingState},
    sim::{Simulation, TickReport},
    terrain::{
        placement::Placement, HeightField, HeightStats, Heightmap,
        HeightmapGenerator,
    },
    util::{
        curve::{ColorKey, Curve, Gradient, Keyframe, WrapMode},
        range::{NumRange, RangeValue},
        timer::IntervalTimer,
        unit::{Degrees, Hours, Meter, Rgb},
    },
    weather::{
        ActiveWeather, Effect, EmitterVolume, WeatherChange, WeatherController,
    },
};
