//! Render the built-in scenes tile by tile

use crate::image_io::write_image;
use crate::options::*;
use cameras::*;
use indicatif::{ProgressBar, ProgressStyle};
use integrators::{GroundPlaneIntegrator, Sky, SkyIntegrator};
use wavefront_core::buffer::RenderBuffers;
use wavefront_core::camera::Camera;
use wavefront_core::config::*;
use wavefront_core::geometry::*;
use wavefront_core::integrator::Integrator;
use wavefront_core::scheduler::*;

/// Returns a progress bar for `total` steps; hidden when `quiet` is set.
///
/// * `total` - Number of steps.
/// * `quiet` - Hide the bar.
fn create_progress_reporter(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(total);
    match ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}") {
        Ok(style) => progress.set_style(style.progress_chars("=>-")),
        Err(err) => warn!("Invalid progress template: {err}"),
    }
    progress
}

/// Returns the scene constants selected by the options.
///
/// * `options` - Command line options.
pub fn kernel_data(options: &Options) -> KernelData {
    let mut pass_flags = PassFlags::SAMPLE_COUNT;
    if options.debug_pass {
        pass_flags |= PassFlags::DEBUG;
    }

    KernelData {
        film: FilmData { pass_flags },
        background: BackgroundData {
            transparent: options.transparent,
        },
        integrator: IntegratorData {
            use_lamp_mis: !options.no_lamp_mis,
            sample_clamp_direct: options.clamp_direct,
            sample_clamp_indirect: options.clamp_indirect,
            max_bounce: options.max_bounce,
        },
    }
}

/// Returns the camera selected by the options.
///
/// * `options` - Command line options.
pub fn create_camera(options: &Options) -> Result<Box<dyn Camera>, String> {
    let frame = Frame::look_at(
        Point3f::new(0.0, 1.0, -4.0),
        Point3f::new(0.0, 0.5, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
    )?;
    let data = CameraData::new((options.width as u32, options.height as u32), 0.0, 1.0, frame);

    let camera: Box<dyn Camera> = match options.camera {
        CameraKind::Perspective => Box::new(PerspectiveCamera::new(data, options.fov)?),
        CameraKind::Fisheye => Box::new(FisheyeCamera::new(data, options.fov)?),
        CameraKind::Environment => Box::new(EnvironmentCamera::new(data)),
    };
    Ok(camera)
}

/// Returns the integrator of the scene selected by the options.
///
/// * `options` - Command line options.
pub fn create_integrator(options: &Options) -> Box<dyn Integrator> {
    match options.scene {
        SceneKind::Sky => Box::new(SkyIntegrator::new(Sky::default())),
        SceneKind::Ground => Box::new(GroundPlaneIntegrator::default()),
    }
}

/// Returns the scheduler settings selected by the options.
///
/// * `options` - Command line options.
pub fn scheduler_options(options: &Options) -> SchedulerOptions {
    SchedulerOptions {
        threads: options.threads(),
        local_size: options.local_size,
        partition_size: (options.partition_size, options.partition_size),
        allocation: options.allocation,
        early_exit: options.early_exit,
        queue_mode: options.queue_mode,
    }
}

/// Render the image and write it to disk.
///
/// * `options` - Command line options.
pub fn render(options: &Options) -> Result<(), String> {
    if options.width == 0 || options.height == 0 {
        return Err(format!("Image {}x{} has no pixels", options.width, options.height));
    }
    if options.tile_size == 0 {
        return Err("Tile size must be positive".to_string());
    }

    let kd = kernel_data(options);
    let camera = create_camera(options)?;
    let integrator = create_integrator(options);

    let buffers = RenderBuffers::new(
        options.width,
        options.height,
        options.parallel_samples,
        kd.film.pass_flags,
        options.seed,
    );
    let mut driver = SplitKernelDriver::new(scheduler_options(options), kd)?;

    let n_tiles_x = (options.width + options.tile_size - 1) / options.tile_size;
    let n_tiles_y = (options.height + options.tile_size - 1) / options.tile_size;
    let tile_count = n_tiles_x * n_tiles_y;

    info!(
        "Rendering {}x{} with {} spp in {} tiles ({:?})",
        options.width,
        options.height,
        options.samples,
        tile_count,
        driver.options()
    );

    let progress = create_progress_reporter(tile_count as u64 + 1_u64, options.quiet); // Render + image write
    progress.set_message("Rendering scene");

    let mut passes = 0;
    for ty in 0..n_tiles_y {
        for tx in 0..n_tiles_x {
            let x = tx * options.tile_size;
            let y = ty * options.tile_size;
            let config = LaunchConfig::for_tile(
                x,
                y,
                options.tile_size.min(options.width - x),
                options.tile_size.min(options.height - y),
                options.width,
                options.parallel_samples,
                0,
                options.samples,
            );

            let summary = driver.path_trace(&config, &buffers, integrator.as_ref(), camera.as_ref())?;
            passes += summary.passes;
            progress.inc(1);
        }
    }
    debug!("{passes} passes over {tile_count} tiles");

    progress.set_message("Writing image");
    write_image(&options.image_file, &buffers.output, options.samples)?;
    progress.inc(1);

    progress.finish_with_message("Render complete");

    if !options.quiet {
        wavefront_core::print_stats!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use image::GenericImageView;

    #[test]
    fn options_map_to_kernel_data() {
        let options = Options::parse_from([
            "wavefront-pt",
            "--no-lamp-mis",
            "--debug-pass",
            "--transparent",
            "--max-bounce",
            "3",
        ]);
        let kd = kernel_data(&options);
        assert!(!kd.integrator.use_lamp_mis);
        assert!(kd.background.transparent);
        assert_eq!(kd.integrator.max_bounce, 3);
        assert_eq!(kd.film.pass_flags, PassFlags::SAMPLE_COUNT | PassFlags::DEBUG);
    }

    #[test]
    fn invalid_fov_is_reported() {
        let options = Options::parse_from(["wavefront-pt", "--fov", "0"]);
        assert!(create_camera(&options).is_err());

        let options = Options::parse_from(["wavefront-pt", "--camera", "environment", "--fov", "0"]);
        assert!(create_camera(&options).is_ok());
    }

    #[test]
    fn renders_a_small_image() {
        let path = std::env::temp_dir().join("wavefront-pt-render-test.png");
        let options = Options::parse_from([
            "wavefront-pt",
            "--quiet",
            "--width",
            "10",
            "--height",
            "7",
            "--tilesize",
            "4",
            "--spp",
            "2",
            "--local-size",
            "8",
            "--partition",
            "2",
            "-o",
            path.to_str().unwrap(),
        ]);
        assert!(render(&options).is_ok());
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (10, 7));
        let _ = std::fs::remove_file(&path);
    }
}
