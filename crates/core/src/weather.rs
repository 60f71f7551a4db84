use crate::{
    clock::SolarClock,
    config::{WeatherConfig, WeatherPolicy, WeatherStateConfig},
    error::{SimError, SimResult},
    terrain::HeightmapGenerator,
    util::timer::IntervalTimer,
};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// A visual effect that a weather state can switch on. Hosts map these onto
/// particle systems, fog volumes, etc.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Effect {
    Rain,
    Snow,
    Fog,
}

/// The weather that's in effect right now. The whole value is replaced in
/// one go on every transition, so the multiplier and effects always belong
/// to the same state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveWeather {
    pub name: String,
    pub terrain_multiplier: f64,
    pub effects: BTreeSet<Effect>,
}

impl From<&WeatherStateConfig> for ActiveWeather {
    fn from(state: &WeatherStateConfig) -> Self {
        Self {
            name: state.name.clone(),
            terrain_multiplier: state.terrain_multiplier,
            effects: state.effects.clone(),
        }
    }
}

/// Outcome of a [WeatherController::set_weather] call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherChange {
    pub from: String,
    pub to: String,
    /// Whether the terrain was regenerated with the new multiplier
    pub regenerated: bool,
}

impl WeatherChange {
    /// `false` if the state that was set was already active
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Where a weather particle emitter should sit so that it covers the whole
/// terrain: centred over it, spanning its full width and length.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmitterVolume {
    /// `[x, y, z]`, with y on the terrain surface
    pub center: [f64; 3],
    pub width: f64,
    pub length: f64,
}

/// The weather state machine. Exactly one state is active at a time. The
/// state changes either through [WeatherController::set_weather], or
/// automatically during [WeatherController::update] according to the
/// configured [WeatherPolicy].
///
/// The controller doesn't own the terrain. Callers pass in the generator
/// whenever the weather might change, and a state change pushes the new
/// multiplier into it and regenerates.
#[derive(Clone, Debug)]
pub struct WeatherController {
    config: WeatherConfig,
    current: ActiveWeather,
    /// Only present for [WeatherPolicy::Interval]
    timer: Option<IntervalTimer>,
    rng: Pcg64,
    auto_transitions: u64,
}

impl WeatherController {
    /// Build a controller in the configured initial state. Nothing is pushed
    /// to the terrain yet. `rng` drives random state selection.
    pub fn new(config: WeatherConfig, rng: Pcg64) -> SimResult<Self> {
        config.validate()?;
        config.check_state_names()?;

        let initial = config.state(&config.initial_state).ok_or_else(|| {
            SimError::InvalidState(config.initial_state.clone())
        })?;
        let current = ActiveWeather::from(initial);
        let timer = match config.policy {
            WeatherPolicy::Interval { interval_seconds } => {
                Some(IntervalTimer::new(interval_seconds)?)
            }
            WeatherPolicy::DayNight { .. } => None,
        };

        Ok(Self {
            config,
            current,
            timer,
            rng,
            auto_transitions: 0,
        })
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn current(&self) -> &ActiveWeather {
        &self.current
    }

    pub fn is_active(&self, effect: Effect) -> bool {
        self.current.effects.contains(&effect)
    }

    /// Number of transitions made by the weather policy (as opposed to manual
    /// [WeatherController::set_weather] calls). For the interval policy, this
    /// counts every firing, even ones that picked the current state again.
    pub fn auto_transitions(&self) -> u64 {
        self.auto_transitions
    }

    /// Seconds until the next interval firing, if running the interval policy
    pub fn time_until_next_transition(&self) -> Option<f64> {
        self.timer.map(|timer| timer.remaining())
    }

    /// Switch to the named state. Unknown names are rejected and nothing
    /// changes.
    ///
    /// If the state actually changes and a terrain generator is given, the
    /// generator gets the new state's height multiplier and regenerates. If
    /// that fails, the weather and the generator's multiplier are both left
    /// as they were. Setting the already-active state re-applies it without
    /// regenerating.
    pub fn set_weather(
        &mut self,
        name: &str,
        terrain: Option<&mut HeightmapGenerator>,
    ) -> SimResult<WeatherChange> {
        let next = self
            .config
            .state(name)
            .map(ActiveWeather::from)
            .ok_or_else(|| SimError::InvalidState(name.into()))?;
        let from = self.current.name.clone();

        if from == next.name {
            debug!("Weather `{}` is already active, re-applying", name);
            self.current = next;
            return Ok(WeatherChange {
                to: from.clone(),
                from,
                regenerated: false,
            });
        }

        let regenerated = match terrain {
            Some(generator) => {
                Self::apply_to_terrain(generator, next.terrain_multiplier)?;
                true
            }
            None => {
                warn!(
                    "{}, weather `{}` won't affect the terrain",
                    SimError::MissingCollaborator,
                    name
                );
                false
            }
        };

        info!(
            "Weather changed: {} -> {} (terrain multiplier {})",
            from, next.name, next.terrain_multiplier
        );
        let to = next.name.clone();
        self.current = next;
        Ok(WeatherChange {
            from,
            to,
            regenerated,
        })
    }

    /// Run the weather policy for one frame. Returns the transition that
    /// happened during this frame, if any.
    ///
    /// Under the interval policy every completed interval counts as one
    /// automatic transition, but only the last pick of the frame is applied,
    /// so terrain regenerates at most once per frame. Catch-up draws are
    /// capped at the size of the state table. On error the timer, RNG and
    /// weather are all left as they were.
    pub fn update(
        &mut self,
        delta_seconds: f64,
        clock: &SolarClock,
        terrain: Option<&mut HeightmapGenerator>,
    ) -> SimResult<Option<WeatherChange>> {
        let day_night_target = match &self.config.policy {
            WeatherPolicy::Interval { .. } => None,
            WeatherPolicy::DayNight { day, night } => {
                Some(if clock.is_night() { night } else { day }.clone())
            }
        };

        match day_night_target {
            None => {
                let mut timer = match self.timer {
                    Some(timer) => timer,
                    None => return Ok(None),
                };
                let fired = timer.tick(delta_seconds);
                if fired == 0 {
                    self.timer = Some(timer);
                    return Ok(None);
                }

                let mut rng = self.rng.clone();
                let draws = fired.min(self.config.states.len() as u64);
                let mut picked = None;
                for _ in 0..draws {
                    picked = self
                        .config
                        .states
                        .choose(&mut rng)
                        .map(|state| state.name.clone());
                }
                debug!(
                    "{} weather interval(s) elapsed, picked {:?}",
                    fired, picked
                );
                let change = match picked {
                    Some(name) => Some(self.set_weather(&name, terrain)?),
                    None => None,
                };

                self.timer = Some(timer);
                self.rng = rng;
                self.auto_transitions =
                    self.auto_transitions.saturating_add(fired);
                Ok(change)
            }
            Some(target) if target == self.current.name => Ok(None),
            Some(target) => {
                let change = self.set_weather(&target, terrain)?;
                self.auto_transitions += 1;
                Ok(Some(change))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn config_mut(&mut self) -> &mut WeatherConfig {
        &mut self.config
    }

    /// Restart the interval countdown from zero. No-op for the day/night
    /// policy.
    pub fn reset_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.reset();
        }
    }

    /// Where a weather emitter should go to cover the given terrain. `None`
    /// until the terrain has been generated.
    pub fn emitter_volume(
        &self,
        terrain: &HeightmapGenerator,
    ) -> Option<EmitterVolume> {
        let center = terrain.center()?;
        Some(EmitterVolume {
            center,
            width: terrain.config().width,
            length: terrain.config().length,
        })
    }

    fn apply_to_terrain(
        generator: &mut HeightmapGenerator,
        multiplier: f64,
    ) -> SimResult<()> {
        let previous = generator.config().height_multiplier;
        generator.set_height_multiplier(multiplier)?;
        if let Err(err) = generator.regenerate() {
            generator.set_height_multiplier(previous)?;
            return Err(err);
        }
        Ok(())
    }
}
