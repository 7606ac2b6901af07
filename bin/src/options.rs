//! Command line options

use clap::{Parser, ValueEnum};
use wavefront_core::device::EarlyExit;
use wavefront_core::math::Float;
use wavefront_core::scheduler::QueueMode;
use wavefront_core::work::AllocationPolicy;

/// Camera models.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CameraKind {
    Perspective,
    Fisheye,
    Environment,
}

/// Built-in scenes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// Sky only.
    Sky,

    /// Checkered ground plane with a sphere lamp.
    Ground,
}

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Wavefront path tracer", long_about = None)]
pub struct Options {
    /// Number of threads to use for rendering.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 1,
        help = "Use specified number of threads for rendering."
    )]
    n_threads: usize,

    /// Suppress all text output other than error messages.
    #[clap(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "render.png",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Image width.
    #[clap(long, value_name = "NUM", default_value_t = 320)]
    pub width: usize,

    /// Image height.
    #[clap(long, value_name = "NUM", default_value_t = 240)]
    pub height: usize,

    /// Samples per pixel.
    #[clap(long = "spp", short = 's', value_name = "NUM", default_value_t = 16)]
    pub samples: u32,

    /// Tile size.
    #[clap(
        long = "tilesize",
        short = 'p',
        value_name = "NUM",
        default_value_t = 64,
        help = "Size in pixels of square tiles."
    )]
    pub tile_size: usize,

    /// Ray slots per pixel.
    #[clap(long = "parallel-samples", value_name = "NUM", default_value_t = 1)]
    pub parallel_samples: usize,

    /// Lanes per workgroup.
    #[clap(long = "local-size", value_name = "NUM", default_value_t = 64)]
    pub local_size: usize,

    /// Side of a work stealing partition in pixels.
    #[clap(long = "partition", value_name = "NUM", default_value_t = 8)]
    pub partition_size: usize,

    /// Work allocation policy.
    #[clap(long, value_name = "POLICY", default_value = "stealing", help = "stealing or strided.")]
    pub allocation: AllocationPolicy,

    /// Early exit policy.
    #[clap(long = "early-exit", value_name = "POLICY", default_value = "skip", help = "return or skip.")]
    pub early_exit: EarlyExit,

    /// Queue mode.
    #[clap(
        long = "queue-mode",
        value_name = "MODE",
        default_value = "adaptive",
        help = "dense, compacted, adaptive or adaptive:<threshold>."
    )]
    pub queue_mode: QueueMode,

    /// Camera model.
    #[clap(long, value_enum, default_value_t = CameraKind::Perspective)]
    pub camera: CameraKind,

    /// Field of view in degrees.
    #[clap(long, value_name = "DEGREES", default_value_t = 60.0)]
    pub fov: Float,

    /// Scene.
    #[clap(long, value_enum, default_value_t = SceneKind::Ground)]
    pub scene: SceneKind,

    /// Maximum number of bounces.
    #[clap(long = "max-bounce", value_name = "NUM", default_value_t = 8)]
    pub max_bounce: u32,

    /// Disable emission found by continuation rays.
    #[clap(long = "no-lamp-mis")]
    pub no_lamp_mis: bool,

    /// Clamp for direct light. 0 disables.
    #[clap(long = "clamp-direct", value_name = "FLOAT", default_value_t = 0.0)]
    pub clamp_direct: Float,

    /// Clamp for indirect light. 0 disables.
    #[clap(long = "clamp-indirect", value_name = "FLOAT", default_value_t = 0.0)]
    pub clamp_indirect: Float,

    /// Leave the background transparent.
    #[clap(long)]
    pub transparent: bool,

    /// Record the debug pass.
    #[clap(long = "debug-pass")]
    pub debug_pass: bool,

    /// Seed of the per pixel random number seeds.
    #[clap(long, value_name = "NUM", default_value_t = 0)]
    pub seed: u32,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => {
                warn!("Invalid nthreads");
                1
            }
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheduler_flags() {
        let options = Options::parse_from([
            "wavefront-pt",
            "--queue-mode",
            "adaptive:0.25",
            "--early-exit",
            "return",
            "--allocation",
            "strided",
            "--camera",
            "fisheye",
            "-t",
            "0",
        ]);
        assert_eq!(options.queue_mode, QueueMode::Adaptive { threshold: 0.25 });
        assert_eq!(options.early_exit, EarlyExit::Return);
        assert_eq!(options.allocation, AllocationPolicy::Strided);
        assert_eq!(options.camera, CameraKind::Fisheye);
        assert_eq!(options.threads(), 1);
    }

    #[test]
    fn rejects_unknown_queue_mode() {
        assert!(Options::try_parse_from(["wavefront-pt", "--queue-mode", "sparse"]).is_err());
    }
}
