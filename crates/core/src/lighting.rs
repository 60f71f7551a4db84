use crate::{
    clock::SolarClock, config::LightingConfig, error::SimResult, Degrees,
    Hours, NumRange, Rgb,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use validator::Validate;

/// Turns the time of day into light and sky parameters. This doesn't own
/// any lights itself: hosts evaluate it each frame and push the values onto
/// whatever they render with.
#[derive(Clone, Debug)]
pub struct LightingModel {
    config: LightingConfig,
}

/// Everything lighting-related for one instant of the day
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightingState {
    /// Sun elevation. Follows [SolarClock::sun_angle_degrees], so it keeps
    /// growing past 360° instead of wrapping.
    pub sun_pitch: Degrees,
    /// Compass heading of the sun's arc. Constant.
    pub sun_yaw: Degrees,
    pub sun_intensity: f64,
    pub ambient_color: Rgb,
    /// 0 at midnight, 1 at noon, following a half sine wave
    pub daylight: f64,
    /// Brightness for secondary scene lights
    pub scene_light_intensity: f64,
    /// Emission color for self-lit materials
    pub emission_color: Rgb,
    pub skybox_rotation: Degrees,
    pub skybox_tint: Rgb,
}

impl LightingModel {
    /// 360° per 24 hours
    const DEGREES_PER_HOUR: f64 = 15.0;
    const SCENE_LIGHT_RANGE: NumRange = NumRange::new(0.0, 1.0);
    /// Skybox brightness over the day. Peaks above 1, so the tint saturates
    /// for a while around noon.
    const SKYBOX_BRIGHTNESS_RANGE: NumRange = NumRange::new(0.2, 1.2);
    const EMISSION_STRENGTH: f64 = 0.2;
    const SKYBOX_STRENGTH: f64 = 0.7;

    pub fn new(config: LightingConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Compute the lighting for the clock's current time. Pure; the same
    /// clock state always gives the same result.
    pub fn evaluate(&self, clock: &SolarClock) -> LightingState {
        let wrapped_time = clock.wrapped_time();
        let normalized_time = clock.normalized_time();
        let daylight = Self::daylight(wrapped_time);

        LightingState {
            sun_pitch: clock.sun_angle_degrees(),
            sun_yaw: self.config.sun_yaw,
            sun_intensity: self
                .config
                .sun_intensity_curve
                .evaluate(normalized_time)
                * self.config.max_sun_intensity,
            ambient_color: self
                .config
                .ambient_gradient
                .evaluate(normalized_time),
            daylight,
            scene_light_intensity: Self::SCENE_LIGHT_RANGE.lerp(daylight),
            emission_color: Rgb::BLACK
                .lerp(Rgb::GREY.scale(Self::EMISSION_STRENGTH), daylight),
            skybox_rotation: Degrees(
                wrapped_time.0
                    * Self::DEGREES_PER_HOUR
                    * self.config.skybox_rotation_factor,
            ),
            skybox_tint: Rgb::BLACK.lerp(
                Rgb::GREY.scale(Self::SKYBOX_STRENGTH),
                Self::SKYBOX_BRIGHTNESS_RANGE.lerp(daylight),
            ),
        }
    }

    /// `sin(t / 24 * π)`, clamped to [0,1]
    fn daylight(wrapped_time: Hours) -> f64 {
        let wave = (wrapped_time.0 / Hours::DAY.0 * PI).sin();
        NumRange::normal_range().clamp(wave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::curve::{ColorKey, Gradient};
    use assert_approx_eq::assert_approx_eq;

    fn model() -> LightingModel {
        LightingModel::new(LightingConfig::default()).unwrap()
    }

    fn at(hours: f64) -> LightingState {
        model().evaluate(&SolarClock::new(hours).unwrap())
    }

    #[test]
    fn test_invalid_config() {
        let err = LightingModel::new(LightingConfig {
            max_sun_intensity: -1.0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["max_sun_intensity"]);
    }

    #[test]
    fn test_noon() {
        let state = at(12.0);
        assert_approx_eq!(state.sun_pitch.0, 90.0);
        assert_approx_eq!(state.sun_yaw.0, 170.0);
        assert_approx_eq!(state.sun_intensity, 3.0);
        assert_approx_eq!(state.daylight, 1.0);
        assert_approx_eq!(state.scene_light_intensity, 1.0);
        assert_approx_eq!(state.emission_color.red, 0.1);
        assert_approx_eq!(state.skybox_rotation.0, 54.0);
        // Brightness is past 1 at noon, so the tint is fully saturated
        assert_approx_eq!(state.skybox_tint.red, 0.35);
    }

    #[test]
    fn test_midnight() {
        let state = at(0.0);
        assert_approx_eq!(state.sun_pitch.0, -90.0);
        assert_approx_eq!(state.sun_intensity, 0.3);
        assert_approx_eq!(state.daylight, 0.0);
        assert_approx_eq!(state.scene_light_intensity, 0.0);
        assert_eq!(state.emission_color, Rgb::BLACK);
        assert_approx_eq!(state.skybox_rotation.0, 0.0);
        // Skybox never goes fully black
        assert_approx_eq!(state.skybox_tint.red, 0.35 * 0.2);
    }

    #[test]
    fn test_dawn() {
        let state = at(6.0);
        assert_approx_eq!(state.sun_intensity, 0.6);
        assert_approx_eq!(state.daylight, (PI / 4.0).sin());
    }

    #[test]
    fn test_intensity_loops_across_days() {
        let today = at(9.0);
        let next_week = at(9.0 + 24.0 * 7.0);
        assert_approx_eq!(today.sun_intensity, next_week.sun_intensity);
        assert_eq!(today.ambient_color, next_week.ambient_color);
        assert_approx_eq!(today.skybox_rotation.0, next_week.skybox_rotation.0);
        // Pitch keeps turning
        assert_approx_eq!(next_week.sun_pitch.0 - today.sun_pitch.0, 360.0 * 7.0);
    }

    #[test]
    fn test_ambient_gradient() {
        let model = LightingModel::new(LightingConfig {
            ambient_gradient: Gradient {
                keys: vec![
                    ColorKey {
                        time: 0.0,
                        color: Rgb::BLACK,
                    },
                    ColorKey {
                        time: 0.5,
                        color: Rgb::WHITE,
                    },
                ],
            },
            ..Default::default()
        })
        .unwrap();
        let color = model
            .evaluate(&SolarClock::new(6.0).unwrap())
            .ambient_color;
        assert_approx_eq!(color.green, 0.5);
    }
}
