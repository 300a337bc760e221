#![warn(clippy::all)]

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg};
use sline_algorithms::{
    advisor::{intensity_map, suggest_thresholds, AdvisorParams},
    classify::IntensityFilter,
};
use sline_tools::scene::CoastalScene;

struct Args {
    pub params: AdvisorParams,
    pub cell_size: f64,
    pub seed: u64,
}

fn get_args() -> Result<Args> {
    let matches = App::new("shoreline suggest")
        .version("0.1")
        .about("Suggests intensity filter thresholds for a synthetic coastal scene")
        .arg(
            Arg::with_name("Z_CEILING")
                .short("z")
                .long("z-ceiling")
                .takes_value(true)
                .default_value("2.0")
                .help("Only points at or below this elevation are analyzed"),
        )
        .arg(
            Arg::with_name("CELL_SIZE")
                .short("c")
                .long("cell-size")
                .takes_value(true)
                .default_value("1.0")
                .help("Cell size of the intensity map"),
        )
        .arg(
            Arg::with_name("SEED")
                .short("s")
                .long("seed")
                .takes_value(true)
                .default_value("42")
                .help("Seed of the scene generator"),
        )
        .get_matches();

    let value_of = |name: &str| {
        matches
            .value_of(name)
            .ok_or_else(|| anyhow!("Missing value for {}", name))
    };
    let z_ceiling = value_of("Z_CEILING")?
        .parse::<f64>()
        .context("Invalid elevation ceiling")?;
    let cell_size = value_of("CELL_SIZE")?
        .parse::<f64>()
        .context("Invalid cell size")?;
    let seed = value_of("SEED")?.parse::<u64>().context("Invalid seed")?;

    Ok(Args {
        params: AdvisorParams {
            z_ceiling,
            ..Default::default()
        },
        cell_size,
        seed,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;
    let cloud = CoastalScene {
        seed: args.seed,
        ..Default::default()
    }
    .generate();

    let suggestions = suggest_thresholds(&cloud, &args.params)
        .ok_or_else(|| anyhow!("No points at or below z = {}", args.params.z_ceiling))?;
    println!("Threshold report for {} points", cloud.len());
    println!("\tOtsu threshold:         {:.1}", suggestions.otsu);
    println!(
        "\tIntensity valley:       {} {:.1}",
        suggestions.sign.symbol(),
        suggestions.intensity_valley
    );
    match suggestions.scan_angle {
        Some(angle) => println!("\tScan angle threshold:   {:.1}", angle),
        None => println!("\tScan angle threshold:   no valley found"),
    }
    match suggestions.z_dynamic {
        Some(z) => println!("\tElevation ceiling:      {:.2}", z),
        None => println!("\tElevation ceiling:      not derived"),
    }

    let mut filter = IntensityFilter::default();
    suggestions.apply_to(&mut filter);
    let selection = filter.select(&cloud);
    println!(
        "\tSelected with these thresholds: {} of {} points",
        selection.selected(),
        cloud.len()
    );

    let map = intensity_map(&cloud, &args.params, args.cell_size)?;
    println!(
        "Intensity map: {}x{} cells, {} occupied",
        map.nx(),
        map.ny(),
        map.occupied_cells()
    );
    Ok(())
}
