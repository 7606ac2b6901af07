//! Test fixtures shared by the stage and scheduler tests.

use crate::buffer::RenderBuffers;
use crate::camera::Camera;
use crate::config::{KernelData, LaunchConfig, PassFlags};
use crate::device::{Device, EarlyExit};
use crate::geometry::*;
use crate::integrator::{Integrator, Scatter, SurfaceShade};
use crate::math::*;
use crate::queue::QueueManager;
use crate::rng::RngStream;
use crate::spectrum::*;
use crate::split::{KernelContext, SplitKernel};
use crate::state::{PathRayFlags, PathState, RayStateStore};
use crate::work::{create_work_allocator, AllocationPolicy, WorkAllocator};

/// Camera looking down +z with one ray per pixel starting at `(pixel_x, pixel_y, 0)`.
pub struct PixelCamera {
    /// Samples for which this returns a degenerate ray.
    pub degenerate: fn(sample: u32, pixel_x: u32, pixel_y: u32) -> bool,
}

impl Default for PixelCamera {
    fn default() -> Self {
        Self {
            degenerate: |_, _, _| false,
        }
    }
}

impl Camera for PixelCamera {
    fn generate_initial_ray(&self, rng: &mut RngStream, sample: u32, pixel_x: u32, pixel_y: u32) -> Ray {
        let _ = rng.get_2d();
        if (self.degenerate)(sample, pixel_x, pixel_y) {
            return Ray::degenerate();
        }
        Ray::new(
            Point3f::new(pixel_x as Float, pixel_y as Float, 0.0),
            Vector3f::new(0.0, 0.0, 1.0),
            INFINITY,
            0.0,
        )
    }
}

/// A stack of mirrors. A path of pixel `(x, y)` hits `(x + y) % (max_depth + 1)` surfaces one unit apart before it
/// escapes to a constant sky. All values are powers of two so sums are exact in any order.
pub struct StackIntegrator {
    /// Largest number of surfaces along a path.
    pub max_depth: u32,

    /// Radiance of the sky.
    pub sky: Spectrum,

    /// Emission of every surface.
    pub surface: Spectrum,

    /// Weight applied at every bounce.
    pub albedo: Float,

    /// Emission found along every continuation ray, if any.
    pub lamp: Option<Spectrum>,
}

impl Default for StackIntegrator {
    fn default() -> Self {
        Self {
            max_depth: 3,
            sky: Spectrum::new(1.0),
            surface: Spectrum::new(0.25),
            albedo: 0.5,
            lamp: None,
        }
    }
}

impl StackIntegrator {
    /// Returns the number of surfaces in front of a pixel.
    pub fn depth(&self, pixel_x: u32, pixel_y: u32) -> u32 {
        (pixel_x + pixel_y) % (self.max_depth + 1)
    }

    /// Returns the radiance of one sample of a pixel.
    ///
    /// * `pixel_x`    - Pixel x-coordinate.
    /// * `pixel_y`    - Pixel y-coordinate.
    /// * `max_bounce` - Bounce limit.
    /// * `lamp_mis`   - Lamp emission is accumulated.
    pub fn expected(&self, pixel_x: u32, pixel_y: u32, max_bounce: u32, lamp_mis: bool) -> Spectrum {
        let depth = self.depth(pixel_x, pixel_y);
        let mut l = Spectrum::ZERO;
        let mut throughput = Spectrum::ONE;
        for bounce in 0..=depth {
            if bounce > 0 && lamp_mis {
                if let Some(lamp) = self.lamp {
                    l += throughput * lamp;
                }
            }
            if bounce == depth {
                l += throughput * self.sky;
                break;
            }
            l += throughput * self.surface;
            if bounce >= max_bounce {
                break;
            }
            throughput = throughput * Spectrum::new(self.albedo);
        }
        l
    }

    fn pixel(ray: &Ray) -> (u32, u32) {
        (ray.o.x as u32, ray.o.y as u32)
    }
}

impl Integrator for StackIntegrator {
    fn sample_emitter_along_ray(&self, _state: &PathState, _ray: &Ray) -> Option<Spectrum> {
        self.lamp
    }

    fn sample_background(&self, _state: &PathState, _ray: &Ray) -> Spectrum {
        self.sky
    }

    fn intersect(&self, state: &PathState, ray: &Ray) -> Option<Intersection> {
        let (x, y) = Self::pixel(ray);
        if state.bounce < self.depth(x, y) && ray.t_max >= 1.0 {
            Some(Intersection::new(1.0, ray.at(1.0), -ray.d, state.bounce))
        } else {
            None
        }
    }

    fn shade_surface(&self, _state: &PathState, ray: &Ray, isect: &Intersection, rng: &mut RngStream) -> SurfaceShade {
        let _ = rng.get_2d();
        SurfaceShade {
            emission: self.surface,
            scatter: Some(Scatter {
                weight: Spectrum::new(self.albedo),
                ray: Ray::new(isect.p, ray.d, INFINITY, ray.time),
                flags: PathRayFlags::REFLECT | PathRayFlags::SINGULAR,
            }),
        }
    }
}

/// Owns everything a stage needs so stages can be run one at a time.
pub struct Harness {
    pub config: LaunchConfig,
    pub kernel_data: KernelData,
    pub store: RayStateStore,
    pub queues: QueueManager,
    pub allocator: Box<dyn WorkAllocator>,
    pub buffers: RenderBuffers,
    pub integrator: StackIntegrator,
    pub camera: PixelCamera,
    pub device: Device,
}

impl Harness {
    /// Create a harness for a tile at the image origin with buffers the size of the tile.
    ///
    /// * `config`      - Launch configuration.
    /// * `kernel_data` - Scene constants.
    pub fn new(config: LaunchConfig, kernel_data: KernelData) -> Self {
        let buffers = RenderBuffers::new(
            config.stride,
            config.y + config.height,
            config.parallel_samples,
            kernel_data.film.pass_flags,
            1,
        );
        Self {
            config,
            kernel_data,
            store: RayStateStore::new(config.num_slots(), kernel_data.film.pass_flags.contains(PassFlags::DEBUG)),
            queues: QueueManager::new(config.queue_capacity),
            allocator: create_work_allocator(&config, AllocationPolicy::WorkStealing, (2, 2)).unwrap(),
            buffers,
            integrator: StackIntegrator::default(),
            camera: PixelCamera::default(),
            device: Device::new(1, 4, EarlyExit::GuardedSkip).unwrap(),
        }
    }

    /// Returns the kernel context.
    pub fn ctx(&self) -> KernelContext<'_> {
        KernelContext {
            config: &self.config,
            kernel_data: &self.kernel_data,
            store: &self.store,
            queues: &self.queues,
            allocator: self.allocator.as_ref(),
            buffers: &self.buffers,
            integrator: &self.integrator,
            camera: &self.camera,
        }
    }

    /// Dispatch a stage over every slot.
    ///
    /// * `kernel`     - The stage.
    /// * `use_queues` - Lanes dequeue slots.
    pub fn run(&self, kernel: &dyn SplitKernel, use_queues: bool) {
        let config = self.config.with_use_queues(use_queues);
        let ctx = KernelContext {
            config: &config,
            ..self.ctx()
        };
        self.device.enqueue_kernel(kernel, &ctx, self.config.num_slots());
    }
}
