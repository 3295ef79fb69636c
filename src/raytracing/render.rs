use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

use super::camera::Camera;
use super::core::Scene;
use super::framebuffer::Image;
use super::tracer::{trace, TraceStats};
use super::Vec3;

/// Color of the rays that leave the scene without hitting anything.
pub const SKY_BLUE: Vec3 = Vec3 {
    x: 0.33,
    y: 0.6,
    z: 0.75,
};

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub max_depth: u32,
    pub background: Vec3,
    /// worker threads, 0 lets rayon pick one per core
    pub threads: usize,
    /// print the `Row: n / total` line on stdout
    pub progress: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            background: SKY_BLUE,
            threads: 0,
            progress: false,
        }
    }
}

/// Renders the scene as seen by `camera`, one primary ray per pixel.
///
/// Rows are distributed over a dedicated rayon pool; every row owns its own slice
/// of the output buffer so the result does not depend on the number of threads.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
) -> Result<(Image, TraceStats), ThreadPoolBuildError> {
    let pool = ThreadPoolBuilder::new().num_threads(config.threads).build()?;

    let width = camera.image_width as usize;
    let height = camera.image_height;
    let rows_done = AtomicUsize::new(0);

    let mut pixels = vec![Vec3::zero(); width * height as usize];
    let stats = pool.install(|| {
        let rows: Vec<(usize, &mut [Vec3])> = pixels.chunks_mut(width).enumerate().collect();
        rows.into_par_iter()
            .map(|(y, row)| {
                let mut stats = TraceStats::default();
                // the camera counts rows from the bottom of the viewport
                let pixel_y = height - y as u32 - 1;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let ray = camera.ray_through_pixel(x as u32, pixel_y);
                    *pixel = trace(
                        scene,
                        camera,
                        &ray,
                        config.max_depth,
                        config.background,
                        &mut stats,
                    );
                }

                let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                if config.progress {
                    print!("Row: {:4} / {:4}\r", done, height);
                    io::stdout().flush().ok();
                }
                stats
            })
            .reduce(TraceStats::default, |mut total, stats| {
                total.merge(stats);
                total
            })
    });

    // write the raytracing result into the image
    let mut image = Image::new(camera.image_width, camera.image_height);
    for (index, color) in pixels.into_iter().enumerate() {
        let x = (index % width) as u32;
        let y = (index / width) as u32;
        image.set_color(x, y, color);
    }

    if config.progress {
        println!();
    }
    Ok((image, stats))
}
