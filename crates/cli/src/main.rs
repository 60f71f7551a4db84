use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use skyvale::{
    render::svg::heightmap_to_svg, timed, Placement, SimConfig, Simulation,
};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for running a skyvale terrain and sky simulation headlessly.
#[derive(Debug, StructOpt)]
#[structopt(name = "skyvale")]
struct Opt {
    /// Path to a config file that defines the simulation. Supported formats:
    /// JSON, TOML. If omitted, the default config (with a random seed) is
    /// used
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// How long to run the simulation for, in simulated seconds. Defaults to
    /// one full in-game day
    #[structopt(short, long)]
    duration: Option<f64>,

    /// Length of a single simulation tick, in seconds
    #[structopt(long, default_value = "0.016666666666666666")]
    frame_delta: f64,

    /// Number of random points to place on the terrain at the end of the
    /// run. Included in JSON output
    #[structopt(long, default_value = "0")]
    scatter: usize,

    /// If given, output files will be written to this directory. The exact
    /// files that appear in the directory are defined by the output formats.
    /// See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to write the final simulation state in. Supported
    /// formats:
    ///
    /// cfg - The full config object used for the simulation, in TOML format
    ///
    /// json - JSON snapshot of the clock, weather, lighting, heightmap and
    ///   scattered points
    ///
    /// svg - 2D grayscale rendering of the heightmap
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use while simulating. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the simulation's full config in a human-readable file
    Cfg,
    /// Export a snapshot of the final simulation state as JSON
    Json,
    /// Render the final heightmap as a 2D SVG
    Svg,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Cfg => "toml",
            Self::Json => "json",
            Self::Svg => "svg",
        }
    }
}

fn load_config(config_path: &Path) -> anyhow::Result<SimConfig> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

/// Tick the simulation until `duration` seconds have passed, logging every
/// weather change along the way.
fn run_simulation(
    sim: &mut Simulation,
    duration: f64,
    frame_delta: f64,
) -> anyhow::Result<u64> {
    if !(frame_delta.is_finite() && frame_delta > 0.0) {
        bail!("frame delta must be positive, got {}", frame_delta);
    }

    let mut elapsed = 0.0;
    let mut ticks = 0;
    while elapsed < duration {
        // Last frame is shortened so we land exactly on the duration
        let delta = frame_delta.min(duration - elapsed);
        let report = sim.tick(delta).context("error during simulation tick")?;
        elapsed += delta;
        ticks += 1;

        if let Some(change) = report.change.filter(|change| change.changed()) {
            info!(
                "[{:.2} h] Weather {} -> {}{}",
                report.wrapped_time.0,
                change.from,
                change.to,
                if change.regenerated {
                    " (terrain regenerated)"
                } else {
                    ""
                }
            );
        }
    }
    Ok(ticks)
}

/// Generate an output form of the simulation in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    sim: &Simulation,
    placements: &[Placement],
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        sim: &Simulation,
        placements: &[Placement],
    ) -> anyhow::Result<Vec<u8>> {
        Ok(match output_format {
            OutputFormat::Cfg => {
                // Serialize just the config via toml
                toml::to_string_pretty(sim.config())
                    // Panics only if config format isn't serializable (a bug)
                    .expect("error serializing config")
                    .into_bytes()
            }
            OutputFormat::Json => sim.to_json(placements).into_bytes(),
            OutputFormat::Svg => {
                let heightmap = sim
                    .terrain()
                    .and_then(|terrain| terrain.heightmap())
                    .ok_or_else(|| anyhow!("no heightmap to render"))?;
                heightmap_to_svg(&heightmap, sim.config())
                    .to_string()
                    .into_bytes()
            }
        })
    }

    let output_file_path = output_dir
        .join("skyvale")
        .with_extension(output_format.file_ext());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, sim, placements)?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let config = match &opt.config {
        Some(config_path) => load_config(config_path)?,
        None => SimConfig::default(),
    };
    let duration = opt.duration.unwrap_or(config.clock.day_seconds);
    if !(duration.is_finite() && duration >= 0.0) {
        bail!("duration must be non-negative, got {}", duration);
    }

    let mut sim = Simulation::new(config).context("invalid config")?;
    sim.init().context("error generating initial terrain")?;
    let ticks = timed!(
        format!("Simulating {} seconds", duration),
        log::Level::Info,
        run_simulation(&mut sim, duration, opt.frame_delta)?
    );

    let clock = sim.clock();
    info!(
        "Finished after {} ticks at {:.2} h ({})",
        ticks,
        clock.wrapped_time().0,
        clock.calendar()
    );
    info!(
        "Weather: {} ({} automatic transitions)",
        sim.weather().current().name,
        sim.weather().auto_transitions()
    );
    let heightmap = sim.terrain().and_then(|terrain| terrain.heightmap());
    if let Some(heightmap) = heightmap {
        let stats = heightmap.stats();
        info!(
            "Terrain generation {}: min {:.3}, max {:.3}, mean {:.3}",
            heightmap.generation(),
            stats.min,
            stats.max,
            stats.mean
        );
    }

    let placements = sim.scatter(opt.scatter, 0.0);

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(&output_dir)?;

        for output_format in opt.output_formats {
            gen_output(&output_dir, output_format, &sim, &placements)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
