use assert_approx_eq::assert_approx_eq;
use skyvale::{
    Effect, HeightField, HeightmapGenerator, SimConfig, SimError, Simulation,
    SolarClock, TerrainConfig, WeatherPolicy,
};
use std::sync::Arc;

fn config(seed: u64) -> SimConfig {
    SimConfig {
        seed: seed.into(),
        terrain: TerrainConfig {
            resolution: 65,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// One minute of real time at the default day length takes us from 06:00 to
/// exactly 18:00, which is the first instant of night.
#[test]
fn test_half_day_to_sunset() {
    let mut clock = SolarClock::new(6.0).unwrap();
    clock.advance(60.0, 120.0).unwrap();
    assert_approx_eq!(clock.continuous_time().0, 18.0);
    assert_approx_eq!(clock.wrapped_time().0, 18.0);
    assert!(clock.is_night());
}

#[test]
fn test_wrapped_time_stays_in_range() {
    let mut clock = SolarClock::new(6.0).unwrap();
    // Deliberately awkward deltas
    let deltas = [0.0166667, 0.3, 1.0 / 7.0, 2.5, 0.0];
    for i in 0..20_000 {
        clock.advance(deltas[i % deltas.len()], 120.0).unwrap();
        let wrapped = clock.wrapped_time().0;
        assert!(
            (0.0..24.0).contains(&wrapped),
            "wrapped time {} out of range at step {}",
            wrapped,
            i
        );
    }
    // ~20 days worth of time passed
    assert!(clock.continuous_time().0 > 24.0 * 19.0);
}

#[test]
fn test_sun_angle_is_continuous() {
    let mut clock = SolarClock::new(22.0).unwrap();
    let delta_seconds = 0.1;
    // Most the sun can move in one step: 0.1s * (24h / 120s) * 15°/h
    let max_step = delta_seconds * (24.0 / 120.0) * 15.0 + 1e-9;

    let mut previous = clock.sun_angle_degrees().0;
    // Three days, crossing midnight three times
    for _ in 0..(3 * 1200) {
        clock.advance(delta_seconds, 120.0).unwrap();
        let angle = clock.sun_angle_degrees().0;
        assert!(angle >= previous, "sun moved backwards");
        assert!(
            angle - previous <= max_step,
            "sun jumped from {}° to {}°",
            previous,
            angle
        );
        previous = angle;
    }
}

/// Two generators built separately from identical configs produce identical
/// grids, bit for bit.
#[test]
fn test_heightmap_deterministic_across_instances() {
    let config = TerrainConfig {
        resolution: 513,
        noise_scale: 20.0,
        height_multiplier: 1.0,
        invert: false,
        ..Default::default()
    };
    let mut a = HeightmapGenerator::new(config.clone(), 1234).unwrap();
    let mut b = HeightmapGenerator::new(config, 1234).unwrap();
    let a = a.regenerate().unwrap();
    let b = b.regenerate().unwrap();

    assert_eq!(a.resolution(), 513);
    assert_eq!(a.cells().len(), 513 * 513);
    assert!(a
        .cells()
        .iter()
        .zip(b.cells())
        .all(|(x, y)| x.to_bits() == y.to_bits()));
    assert!(a.cells().iter().all(|h| (0.0..=1.0).contains(h)));
}

#[test]
fn test_simulation_deterministic_across_instances() {
    let run = || {
        let mut sim = Simulation::new(config(77)).unwrap();
        sim.init().unwrap();
        let reports = (0..1200)
            .map(|_| sim.tick(0.25).unwrap())
            .collect::<Vec<_>>();
        (reports, sim.terrain().unwrap().heightmap().unwrap())
    };
    let (reports_a, heightmap_a) = run();
    let (reports_b, heightmap_b) = run();
    assert_eq!(reports_a, reports_b);
    assert_eq!(heightmap_a, heightmap_b);
}

#[test]
fn test_zero_resolution_keeps_previous_heightmap() {
    let mut generator = HeightmapGenerator::new(
        TerrainConfig {
            resolution: 33,
            ..Default::default()
        },
        5,
    )
    .unwrap();
    let published = generator.regenerate().unwrap();

    let bad_config = TerrainConfig {
        resolution: 0,
        ..generator.config().clone()
    };
    let field = HeightField::new(5, &bad_config.noise, bad_config.resolution);
    let err = HeightmapGenerator::generate(&field, &bad_config, 2).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfiguration(_)));
    assert_eq!(err.invalid_fields(), vec!["resolution"]);

    assert!(generator.set_config(bad_config).is_err());
    let current = generator.heightmap().unwrap();
    assert!(Arc::ptr_eq(&published, &current));
    assert!(generator.sample_height(100.0, 100.0).is_some());
}

/// With a 10 second interval, exactly one automatic transition happens once
/// 10 simulated seconds have passed.
#[test]
fn test_one_transition_per_interval() {
    let mut config = config(3);
    config.weather.policy = WeatherPolicy::Interval {
        interval_seconds: 10.0,
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.init().unwrap();

    let frame = 1.0 / 60.0;
    for _ in 0..599 {
        sim.tick(frame).unwrap();
    }
    assert_eq!(sim.weather().auto_transitions(), 0);
    let report = sim.tick(frame).unwrap();
    assert!(report.change.is_some());
    assert_eq!(sim.weather().auto_transitions(), 1);
}

#[test]
fn test_set_weather_is_idempotent() {
    let mut sim = Simulation::new(config(9)).unwrap();
    sim.init().unwrap();

    let first = sim.set_weather("rain").unwrap();
    assert!(first.regenerated);
    let weather = sim.weather().current().clone();
    let generation = sim.terrain().unwrap().generation();

    let second = sim.set_weather("rain").unwrap();
    assert!(!second.regenerated);
    assert_eq!(sim.weather().current(), &weather);
    assert!(sim.weather().is_active(Effect::Rain));
    assert_eq!(sim.terrain().unwrap().generation(), generation);
    assert_approx_eq!(sim.terrain().unwrap().config().height_multiplier, 0.8);
}

#[test]
fn test_unknown_weather_rejected() {
    let mut sim = Simulation::new(config(9)).unwrap();
    sim.init().unwrap();
    let err = sim.set_weather("hail").unwrap_err();
    assert!(matches!(err, SimError::InvalidState(_)));
    assert_eq!(sim.weather().current().name, "clear");
}

/// Day/night policy: rain moves in at dusk and clears at dawn, reshaping the
/// terrain each time.
#[test]
fn test_day_night_weather() {
    let mut config = config(11);
    config.weather.policy = WeatherPolicy::DayNight {
        day: "clear".into(),
        night: "rain".into(),
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.init().unwrap();
    let clear_heightmap = sim.terrain().unwrap().heightmap().unwrap();

    // 06:00 -> 18:00
    let report = sim.tick(60.0).unwrap();
    let change = report.change.unwrap();
    assert_eq!(change.to, "rain");
    assert!(change.regenerated);
    assert!(report.weather.effects.contains(&Effect::Rain));
    let rain_heightmap = sim.terrain().unwrap().heightmap().unwrap();
    assert_eq!(rain_heightmap.generation(), 2);
    // Lower multiplier, lower (or equal) terrain everywhere
    assert!(rain_heightmap
        .cells()
        .iter()
        .zip(clear_heightmap.cells())
        .all(|(rain, clear)| rain <= clear));

    // 18:00 -> 06:00
    let report = sim.tick(60.0).unwrap();
    assert_eq!(report.change.unwrap().to, "clear");
    assert_eq!(sim.weather().auto_transitions(), 2);
}

#[cfg(feature = "json")]
#[test]
fn test_json_snapshot() {
    let mut sim = Simulation::new(config(1)).unwrap();
    sim.init().unwrap();
    sim.tick(1.0).unwrap();
    let placements = sim.scatter(3, 0.5);
    let json: serde_json::Value =
        serde_json::from_str(&sim.to_json(&placements)).unwrap();
    assert_eq!(json["weather"]["name"], "clear");
    assert_eq!(json["placements"].as_array().unwrap().len(), 3);
    assert_eq!(json["heightmap"]["resolution"], 65);
}
