use crate::{
    clock::SolarClock,
    config::SimConfig,
    error::{SimError, SimResult},
    lighting::{LightingModel, LightingState},
    terrain::{
        placement::{self, Placement},
        HeightmapGenerator,
    },
    weather::{ActiveWeather, WeatherChange, WeatherController},
    Hours, Meter,
};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// The whole simulation: terrain, clock, weather and lighting, advanced
/// together one frame at a time by a host loop.
///
/// Two simulations built from the same config and fed the same sequence of
/// frame deltas end up in exactly the same state.
#[derive(Debug)]
pub struct Simulation {
    /// The config this simulation was built from. Runtime changes (e.g.
    /// weather adjusting the terrain multiplier) are not reflected here.
    config: SimConfig,
    clock: SolarClock,
    lighting: LightingModel,
    weather: WeatherController,
    /// Can be detached, in which case weather runs without terrain feedback
    terrain: Option<HeightmapGenerator>,
    placement_rng: Pcg64,
}

/// What happened during one [Simulation::tick]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub continuous_time: Hours,
    pub wrapped_time: Hours,
    pub is_night: bool,
    /// Weather in effect at the end of the tick
    pub weather: ActiveWeather,
    /// Weather transition made during this tick, if any
    pub change: Option<WeatherChange>,
    pub lighting: LightingState,
}

impl Simulation {
    /// Validate the config and build every subsystem. All randomness is
    /// derived from the config's seed. Terrain isn't generated until
    /// [Simulation::init].
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.check()?;

        // Master RNG only hands out seeds, each subsystem owns its own RNG
        let mut rng = config.seed.rng();
        let noise_seed: u32 = rng.gen();
        let weather_rng = Pcg64::seed_from_u64(rng.gen());
        let placement_rng = Pcg64::seed_from_u64(rng.gen());
        info!("Building simulation with seed {}", config.seed);

        Ok(Self {
            clock: SolarClock::new(config.clock.initial_time)?,
            lighting: LightingModel::new(config.lighting.clone())?,
            weather: WeatherController::new(
                config.weather.clone(),
                weather_rng,
            )?,
            terrain: Some(HeightmapGenerator::new(
                config.terrain.clone(),
                noise_seed,
            )?),
            placement_rng,
            config,
        })
    }

    /// Push the initial weather's multiplier into the terrain and generate
    /// the first heightmap. Call once before the first tick.
    pub fn init(&mut self) -> SimResult<()> {
        let multiplier = self.weather.current().terrain_multiplier;
        match self.terrain.as_mut() {
            Some(terrain) => {
                terrain.set_height_multiplier(multiplier)?;
                terrain.regenerate()?;
            }
            None => warn!(
                "{}, starting without terrain",
                SimError::MissingCollaborator
            ),
        }
        Ok(())
    }

    /// Advance the simulation by one frame: the clock moves first, then the
    /// weather policy runs (regenerating terrain if the weather changes),
    /// then lighting is evaluated for the new time. The tick is all or
    /// nothing: if either the clock or the weather step fails, the clock,
    /// weather and terrain are left exactly as they were.
    pub fn tick(&mut self, delta_seconds: f64) -> SimResult<TickReport> {
        let mut clock = self.clock;
        clock.advance(delta_seconds, self.config.clock.day_seconds)?;
        let change =
            self.weather
                .update(delta_seconds, &clock, self.terrain.as_mut())?;
        self.clock = clock;
        let lighting = self.lighting.evaluate(&self.clock);

        Ok(TickReport {
            continuous_time: self.clock.continuous_time(),
            wrapped_time: self.clock.wrapped_time(),
            is_night: self.clock.is_night(),
            weather: self.weather.current().clone(),
            change,
            lighting,
        })
    }

    /// Manually switch the weather. See [WeatherController::set_weather].
    pub fn set_weather(&mut self, name: &str) -> SimResult<WeatherChange> {
        self.weather.set_weather(name, self.terrain.as_mut())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SolarClock {
        &self.clock
    }

    pub fn weather(&self) -> &WeatherController {
        &self.weather
    }

    pub fn lighting(&self) -> &LightingModel {
        &self.lighting
    }

    /// Lighting for the current time
    pub fn current_lighting(&self) -> LightingState {
        self.lighting.evaluate(&self.clock)
    }

    pub fn terrain(&self) -> Option<&HeightmapGenerator> {
        self.terrain.as_ref()
    }

    /// Terrain height at a world position. `None` if there's no terrain, or
    /// it hasn't been generated yet.
    pub fn sample_height(&self, world_x: f64, world_z: f64) -> Option<Meter> {
        self.terrain.as_ref()?.sample_height(world_x, world_z)
    }

    /// Pick random spots on the terrain surface. See [placement::scatter].
    pub fn scatter(
        &mut self,
        count: usize,
        height_offset: f64,
    ) -> Vec<Placement> {
        match &self.terrain {
            Some(terrain) => placement::scatter(
                terrain,
                &mut self.placement_rng,
                count,
                height_offset,
            ),
            None => Vec::new(),
        }
    }

    /// Take the terrain generator out of the simulation. Weather keeps
    /// running, but state changes no longer regenerate terrain.
    pub fn detach_terrain(&mut self) -> Option<HeightmapGenerator> {
        self.terrain.take()
    }

    /// Plug a terrain generator (back) in, returning the previous one
    pub fn attach_terrain(
        &mut self,
        generator: HeightmapGenerator,
    ) -> Option<HeightmapGenerator> {
        self.terrain.replace(generator)
    }

    /// Serialize the current state of the simulation to JSON: clock,
    /// weather, lighting and the published heightmap, plus any placements
    /// the caller wants included.
    #[cfg(feature = "json")]
    pub fn to_json(&self, placements: &[Placement]) -> String {
        use crate::{clock::Calendar, terrain::Heightmap};

        #[derive(Serialize)]
        struct Snapshot<'a> {
            clock: &'a SolarClock,
            calendar: Calendar,
            weather: &'a ActiveWeather,
            lighting: LightingState,
            heightmap: Option<&'a Heightmap>,
            placements: &'a [Placement],
        }

        let heightmap =
            self.terrain.as_ref().and_then(HeightmapGenerator::heightmap);
        let snapshot = Snapshot {
            clock: &self.clock,
            calendar: self.clock.calendar(),
            weather: self.weather.current(),
            lighting: self.current_lighting(),
            heightmap: heightmap.as_deref(),
            placements,
        };
        // Panic here indicates an internal bug in the data format
        serde_json::to_string(&snapshot).expect("error serializing simulation")
    }
}
