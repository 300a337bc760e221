#![warn(clippy::all)]

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg};
use log::info;
use sline_algorithms::{
    change::change_envelope,
    pipeline::{
        detect_by_classification, detect_by_color, detect_by_intensity, ClassDetection,
        ColorDetection, Shoreline,
    },
};
use sline_tools::scene::CoastalScene;

enum Mode {
    Intensity,
    Classification,
    Color,
}

struct Args {
    pub mode: Mode,
    pub cell_size: Option<f64>,
    pub low_threshold: Option<f64>,
    pub high_threshold: Option<f64>,
    pub decimation: usize,
    pub scene: CoastalScene,
}

fn parse_value<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("Invalid value {} for {}", value, name))
        })
        .transpose()
}

fn get_args() -> Result<Args> {
    let matches = App::new("shoreline detect")
        .version("0.1")
        .about("Detects the shoreline in a synthetic coastal scene and prints its vertices")
        .arg(
            Arg::with_name("MODE")
                .short("m")
                .long("mode")
                .takes_value(true)
                .possible_values(&["intensity", "classification", "color"])
                .default_value("intensity")
                .help("Which attributes select the boundary zone"),
        )
        .arg(
            Arg::with_name("CELL_SIZE")
                .short("c")
                .long("cell-size")
                .takes_value(true)
                .help("Raster cell size of the intensity mode, defaults to the point spacing"),
        )
        .arg(
            Arg::with_name("LOW")
                .long("low")
                .takes_value(true)
                .help("Low hysteresis threshold of the edge detector in the intensity mode"),
        )
        .arg(
            Arg::with_name("HIGH")
                .long("high")
                .takes_value(true)
                .help("High hysteresis threshold of the edge detector in the intensity mode"),
        )
        .arg(
            Arg::with_name("DECIMATION")
                .short("d")
                .long("decimation")
                .takes_value(true)
                .help("Keep only every n-th selected point in the classification and color modes"),
        )
        .arg(
            Arg::with_name("SEED")
                .short("s")
                .long("seed")
                .takes_value(true)
                .help("Seed of the scene generator"),
        )
        .arg(
            Arg::with_name("WIDTH")
                .long("width")
                .takes_value(true)
                .help("Extent of the scene along the shore"),
        )
        .get_matches();

    let mode = match matches.value_of("MODE") {
        Some("classification") => Mode::Classification,
        Some("color") => Mode::Color,
        Some("intensity") | None => Mode::Intensity,
        Some(other) => return Err(anyhow!("Unknown mode {}", other)),
    };
    let mut scene = CoastalScene::default();
    if let Some(seed) = parse_value(&matches, "SEED")? {
        scene.seed = seed;
    }
    if let Some(width) = parse_value(&matches, "WIDTH")? {
        scene.width = width;
    }

    Ok(Args {
        mode,
        cell_size: parse_value(&matches, "CELL_SIZE")?,
        low_threshold: parse_value(&matches, "LOW")?,
        high_threshold: parse_value(&matches, "HIGH")?,
        decimation: parse_value(&matches, "DECIMATION")?.unwrap_or(2),
        scene,
    })
}

fn run(args: &Args) -> Result<Shoreline> {
    let cloud = args.scene.generate();
    info!("Generated scene with {} points", cloud.len());
    let shoreline = match args.mode {
        Mode::Intensity => {
            let mut config = args.scene.intensity_detection();
            if let Some(cell_size) = args.cell_size {
                config.density.cell_size = cell_size;
            }
            if let Some(low) = args.low_threshold {
                config.density.edges.low_threshold = low;
            }
            if let Some(high) = args.high_threshold {
                config.density.edges.high_threshold = high;
            }
            detect_by_intensity(&cloud, &config)?
        }
        Mode::Classification => detect_by_classification(
            &cloud,
            &ClassDetection {
                decimation: args.decimation,
                ..Default::default()
            },
        )?,
        Mode::Color => detect_by_color(
            &cloud,
            &ColorDetection {
                decimation: args.decimation,
                ..Default::default()
            },
        )?,
    };
    Ok(shoreline)
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;

    let t_start = Instant::now();
    let shoreline = run(&args)?;
    info!(
        "Detected shoreline with {} vertices in {:.2}s",
        shoreline.len(),
        t_start.elapsed().as_secs_f64()
    );

    println!("x,y,z");
    for (vertex, elevation) in shoreline.vertices.iter().zip(&shoreline.elevations) {
        println!("{:.3},{:.3},{:.3}", vertex.x, vertex.y, elevation);
    }

    // Deviation from the true shoreline of the synthetic scene
    let truth = args.scene.true_shoreline();
    match change_envelope(&shoreline.vertices, &truth, args.scene.spacing) {
        Ok(envelope) => eprintln!(
            "Length {:.2}, deviation from the true shoreline: max {:.2}, mean {:.2}",
            shoreline.length(),
            envelope.summary.max,
            envelope.summary.mean
        ),
        Err(err) => eprintln!("Cannot compare with the true shoreline: {}", err),
    }
    Ok(())
}
