mod render;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{App, Arg};
use rand::{rngs::SmallRng, SeedableRng};
use verdure_algorithms::pipeline::{self, PipelineConfig};
use verdure_algorithms::synthesis::SynthesisConfig;

use crate::render::{DisplayConfig, HeadlessRenderer, PointDrawable, Renderer, Scene};

struct Args {
    pub seed: u64,
    pub n_points: usize,
    pub noise_count: usize,
    pub neighbor_count: usize,
    pub std_ratio: f64,
}

fn get_args() -> Result<Args> {
    let matches = App::new("verdure estimate")
        .version("0.1")
        .about("Synthesizes a bush point cloud, filters it and estimates its hull volume")
        .arg(
            Arg::with_name("SEED")
                .short("s")
                .long("seed")
                .takes_value(true)
                .value_name("SEED")
                .default_value("42")
                .help("Seed for the random number generator"),
        )
        .arg(
            Arg::with_name("POINTS")
                .short("n")
                .long("points")
                .takes_value(true)
                .value_name("POINTS")
                .default_value("2000")
                .help("Number of cluster points to generate"),
        )
        .arg(
            Arg::with_name("NOISE")
                .long("noise")
                .takes_value(true)
                .value_name("NOISE")
                .default_value("50")
                .help("Number of uniform noise points to generate"),
        )
        .arg(
            Arg::with_name("NEIGHBORS")
                .short("k")
                .long("neighbors")
                .takes_value(true)
                .value_name("NEIGHBORS")
                .default_value("20")
                .help("Number of nearest neighbors used by the outlier filter"),
        )
        .arg(
            Arg::with_name("STD_RATIO")
                .short("r")
                .long("std-ratio")
                .takes_value(true)
                .value_name("STD_RATIO")
                .default_value("2.0")
                .help("Threshold width of the outlier filter in standard deviations"),
        )
        .get_matches();

    let seed = matches
        .value_of("SEED")
        .unwrap()
        .parse()
        .context("Failed to parse seed")?;
    let n_points = matches
        .value_of("POINTS")
        .unwrap()
        .parse()
        .context("Failed to parse point count")?;
    let noise_count = matches
        .value_of("NOISE")
        .unwrap()
        .parse()
        .context("Failed to parse noise count")?;
    let neighbor_count = matches
        .value_of("NEIGHBORS")
        .unwrap()
        .parse()
        .context("Failed to parse neighbor count")?;
    let std_ratio = matches
        .value_of("STD_RATIO")
        .unwrap()
        .parse()
        .context("Failed to parse standard deviation ratio")?;

    Ok(Args {
        seed,
        n_points,
        noise_count,
        neighbor_count,
        std_ratio,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;

    let config = PipelineConfig {
        synthesis: SynthesisConfig {
            n_points: args.n_points,
            noise_count: args.noise_count,
            ..Default::default()
        },
        neighbor_count: args.neighbor_count,
        std_ratio: args.std_ratio,
    };

    let t_start = Instant::now();
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let run = pipeline::run(&config, &mut rng)?;

    println!("verdure biomass estimation report");
    println!("\tGenerated points:     {}", run.input_points);
    println!("\tRemoved outliers:     {}", run.removed_outliers);
    println!("\tRemaining points:     {}", run.cloud.len());
    if let Some(bounds) = run.cloud.bounds() {
        println!("\tX:                    {:.4}  {:.4}", bounds.min().x, bounds.max().x);
        println!("\tY:                    {:.4}  {:.4}", bounds.min().y, bounds.max().y);
        println!("\tZ:                    {:.4}  {:.4}", bounds.min().z, bounds.max().z);
    }
    println!("\tHull vertices:        {}", run.estimate.mesh.vertex_count());
    println!("\tHull faces:           {}", run.estimate.mesh.face_count());
    println!("\tHull surface area:    {:.6}", run.estimate.mesh.surface_area());
    if run.estimate.watertight {
        println!("\tEstimated volume:     {:.6}", run.estimate.volume);
    } else {
        println!("\tEstimated volume:     0 (hull is not watertight)");
    }
    println!("Took {:.2}s", t_start.elapsed().as_secs_f64());

    let scene = Scene {
        points: vec![PointDrawable {
            cloud: &run.cloud,
            color: None,
        }],
        mesh: Some(&run.estimate.mesh),
        display: DisplayConfig::default(),
    };
    HeadlessRenderer.render(&scene)?;

    Ok(())
}
