//! Output buffer

use super::*;
use crate::math::*;
use crate::parallel::AtomicFloat;
use crate::spectrum::*;
use crate::state::{DebugData, PathRadiance};
use crate::work::WorkUnit;
use crate::{stat_inc, stat_memory_counter, stat_register_fns};
use std::sync::atomic::Ordering;

stat_memory_counter!("Memory/Output buffer", OUTPUT_BUFFER_MEMORY, output_stats_memory);
stat_register_fns!(output_stats_memory);

/// Multi-pass pixel accumulator. Each pixel has `parallel_samples` sample records of `pass_stride` floats. All writes
/// are additive so lanes finishing samples of the same pixel may write concurrently.
pub struct OutputBuffer {
    /// Pass offsets.
    layout: PassLayout,

    /// Image width in pixels. Also the row stride.
    width: usize,

    /// Image height in pixels.
    height: usize,

    /// Sample records per pixel.
    parallel_samples: usize,

    /// Sample records.
    data: Vec<AtomicFloat>,
}

impl OutputBuffer {
    /// Allocate a zeroed buffer.
    ///
    /// * `width`            - Image width.
    /// * `height`           - Image height.
    /// * `parallel_samples` - Sample records per pixel.
    /// * `layout`           - Pass layout.
    pub fn new(width: usize, height: usize, parallel_samples: usize, layout: PassLayout) -> Self {
        register_stats();

        let n = width * height * parallel_samples * layout.pass_stride;
        stat_inc!(OUTPUT_BUFFER_MEMORY, (n * std::mem::size_of::<AtomicFloat>()) as u64);

        Self {
            layout,
            width,
            height,
            parallel_samples,
            data: (0..n).map(|_| AtomicFloat::default()).collect(),
        }
    }

    /// Returns the pass layout.
    pub fn layout(&self) -> &PassLayout {
        &self.layout
    }

    /// Returns the image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of sample records per pixel.
    pub fn parallel_samples(&self) -> usize {
        self.parallel_samples
    }

    /// Check that a tile fits the buffer.
    ///
    /// * `config` - Launch configuration of the tile.
    pub fn validate_for(&self, config: &LaunchConfig) -> Result<(), String> {
        if config.stride != self.width {
            return Err(format!(
                "Tile stride {} does not match output width {}",
                config.stride, self.width
            ));
        }
        if config.x + config.width > self.width || config.y + config.height > self.height {
            return Err(format!(
                "Tile {}x{} at ({}, {}) does not fit output {}x{}",
                config.width, config.height, config.x, config.y, self.width, self.height
            ));
        }
        if config.parallel_samples > self.parallel_samples {
            return Err(format!(
                "Tile needs {} sample records per pixel, output has {}",
                config.parallel_samples, self.parallel_samples
            ));
        }
        Ok(())
    }

    /// Returns the index of the sample record a work unit writes to.
    ///
    /// * `config` - Launch configuration of the tile.
    /// * `unit`   - The work unit.
    pub fn sample_offset(&self, config: &LaunchConfig, unit: &WorkUnit) -> usize {
        let x = config.x + unit.tile_x as usize;
        let y = config.y + unit.tile_y as usize;
        let offset =
            ((x + y * config.stride) * self.parallel_samples + unit.sample_slot as usize) * self.layout.pass_stride;
        assert!(
            offset + self.layout.pass_stride <= self.data.len(),
            "Output offset {offset} for pixel ({x}, {y}) is out of bounds"
        );
        offset
    }

    fn write_pass_float(&self, offset: usize, value: Float) {
        self.data[offset].add(value);
    }

    fn write_pass_float3(&self, offset: usize, value: Spectrum) {
        for (i, v) in value.to_rgb().into_iter().enumerate() {
            self.data[offset + i].add(v);
        }
    }

    fn write_pass_float4(&self, offset: usize, value: [Float; 4]) {
        for (i, v) in value.into_iter().enumerate() {
            self.data[offset + i].add(v);
        }
    }

    /// Add a sample's radiance and alpha to the combined pass.
    ///
    /// * `offset` - Sample record index.
    /// * `l`      - Radiance.
    /// * `alpha`  - Alpha.
    pub fn write_combined(&self, offset: usize, l: Spectrum, alpha: Float) {
        let [r, g, b] = l.to_rgb();
        self.write_pass_float4(offset, [r, g, b, alpha]);
    }

    /// Count one finished sample.
    ///
    /// * `offset` - Sample record index.
    pub fn write_sample_count(&self, offset: usize) {
        if let Some(pass) = self.layout.sample_count {
            self.write_pass_float(offset + pass, 1.0);
        }
    }

    /// Add the radiance buckets to their passes.
    ///
    /// * `offset` - Sample record index.
    /// * `l`      - Radiance accumulator.
    pub fn write_light_passes(&self, offset: usize, l: &PathRadiance) {
        if !l.use_light_pass {
            return;
        }
        let passes = [
            (self.layout.emission, l.emission),
            (self.layout.background, l.background),
            (self.layout.direct, l.direct),
            (self.layout.indirect, l.indirect),
        ];
        for (pass, value) in passes {
            if let Some(pass) = pass {
                self.write_pass_float3(offset + pass, value);
            }
        }
    }

    /// Add a slot's diagnostics to the debug pass.
    ///
    /// * `offset` - Sample record index.
    /// * `debug`  - Debug record.
    pub fn write_debug_passes(&self, offset: usize, debug: &DebugData) {
        if let Some(pass) = self.layout.debug {
            self.write_pass_float(offset + pass, debug.num_bounces as Float);
            self.write_pass_float(offset + pass + 1, debug.num_emitter_hits as Float);
            self.write_pass_float(offset + pass + 2, debug.num_intersections as Float);
        }
    }

    /// Returns a pass of a pixel summed over its sample records.
    ///
    /// * `x`     - Pixel x-coordinate.
    /// * `y`     - Pixel y-coordinate.
    /// * `pass`  - Pass offset.
    /// * `width` - Number of floats in the pass.
    pub fn pixel_pass(&self, x: usize, y: usize, pass: usize, width: usize) -> Vec<Float> {
        let pixel = (x + y * self.width) * self.parallel_samples;
        (0..width)
            .map(|i| {
                (0..self.parallel_samples)
                    .map(|s| self.data[(pixel + s) * self.layout.pass_stride + pass + i].load(Ordering::Acquire))
                    .sum()
            })
            .collect()
    }

    /// Returns the combined RGBA of a pixel summed over its samples.
    ///
    /// * `x` - Pixel x-coordinate.
    /// * `y` - Pixel y-coordinate.
    pub fn combined(&self, x: usize, y: usize) -> [Float; 4] {
        let v = self.pixel_pass(x, y, 0, COMBINED_WIDTH);
        [v[0], v[1], v[2], v[3]]
    }

    /// Returns the number of samples written to a pixel if the sample count pass is recorded.
    ///
    /// * `x` - Pixel x-coordinate.
    /// * `y` - Pixel y-coordinate.
    pub fn sample_count(&self, x: usize, y: usize) -> Option<Float> {
        self.layout
            .sample_count
            .map(|pass| self.pixel_pass(x, y, pass, 1)[0])
    }

    /// Returns the average RGBA of a pixel. Without a sample count pass `num_samples` is used.
    ///
    /// * `x`           - Pixel x-coordinate.
    /// * `y`           - Pixel y-coordinate.
    /// * `num_samples` - Expected number of samples.
    pub fn average(&self, x: usize, y: usize, num_samples: u32) -> [Float; 4] {
        let n = self.sample_count(x, y).unwrap_or(num_samples as Float);
        let mut v = self.combined(x, y);
        if n > 0.0 {
            v.iter_mut().for_each(|c| *c /= n);
        }
        v
    }
}
