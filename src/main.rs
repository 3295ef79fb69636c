use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process;
use std::time::Instant;

use clap::Parser;

mod raytracing;
use raytracing::parser::ImageData;
use raytracing::render::{render, RenderConfig};
use raytracing::scenes;
use raytracing::math::Vec3;

#[derive(Debug, Parser)]
#[command(version, about = "Whitted-style recursive ray tracer", long_about = None)]
struct Args {
    /// the input path to the scene file, asked on standard input when missing
    scene: Option<String>,
    /// render the built-in scene with two houses and a river
    #[arg(long, conflicts_with = "scene")]
    demo: bool,
    /// the path where the rendered image is saved as png
    #[arg(short, long, default_value = "scene.png")]
    output: String,
    /// the number of reflection bounces, overrides the value of the scene file
    #[arg(long)]
    max_depth: Option<u32>,
    /// color of the rays that hit nothing, as `r,g,b` in [0, 1]
    #[arg(long, value_parser = parse_color, default_value = "0.33,0.6,0.75")]
    background: Vec3,
    /// override the image width of the scene
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,
    /// override the image height of the scene
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,
    /// the number of worker threads, 0 uses one per core
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
}

fn parse_color(value: &str) -> Result<Vec3, String> {
    let channels = value
        .split(',')
        .map(|channel| channel.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid color channel: {}", err))?;
    match channels.as_slice() {
        &[r, g, b] => Ok(Vec3::new(r, g, b)),
        _ => Err(format!("expected 3 channels, found {}", channels.len())),
    }
}

fn prompt_scene_path() -> io::Result<String> {
    print!("Enter filename: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn load(args: &Args) -> Result<ImageData, Box<dyn Error>> {
    if args.demo {
        return Ok(scenes::houses()?);
    }
    let path = match &args.scene {
        Some(path) => path.clone(),
        None => prompt_scene_path()?,
    };
    match scenes::load_scene(&path) {
        Ok(data) => Ok(data),
        Err(err) => {
            log::error!("{}", err);
            err.print_error_location();
            process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let ImageData {
        mut camera,
        scene,
        max_depth,
    } = load(&args)?;

    if args.width.is_some() || args.height.is_some() {
        camera = camera.with_resolution(
            args.width.unwrap_or(camera.image_width),
            args.height.unwrap_or(camera.image_height),
        );
    }
    let config = RenderConfig {
        max_depth: args.max_depth.unwrap_or(max_depth),
        background: args.background,
        threads: args.threads,
        progress: true,
    };

    // measure time
    let start = Instant::now();
    let (image, stats) = render(&scene, &camera, &config)?;
    let total_time = start.elapsed();
    log::info!(
        "traced {} rays, deepest reflection bounce {}",
        stats.rays,
        stats.deepest_bounce
    );

    image.save(&args.output)?;
    println!("Rendered {} in {:?}", args.output, total_time);
    Ok(())
}
