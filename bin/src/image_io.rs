//! Image output

use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;
use wavefront_core::buffer::OutputBuffer;
use wavefront_core::math::*;

/// Write the averaged combined pass as an 8-bit image.
///
/// * `path`        - Output file path. The format follows the extension; only PNG keeps alpha.
/// * `output`      - The rendered output.
/// * `num_samples` - Samples per pixel, used when the sample count pass is not recorded.
pub fn write_image(path: &str, output: &OutputBuffer, num_samples: u32) -> Result<(), String> {
    let format = ImageFormat::from_path(Path::new(path))
        .map_err(|err| format!("Can't determine image format of {path}: {err}"))?;

    let (res_x, res_y) = (output.width(), output.height());
    info!("Writing image {path} with resolution {res_x}x{res_y}");

    // Allocate an image buffer.
    let mut imgbuf = RgbaImage::new(res_x as u32, res_y as u32);
    for (x, y, pixel) in imgbuf.enumerate_pixels_mut() {
        let [r, g, b, a] = output.average(x as usize, y as usize, num_samples);
        *pixel = Rgba([clamp_byte(r), clamp_byte(g), clamp_byte(b), alpha_byte(a)]);
    }

    // Write the output file.
    match imgbuf.save_with_format(path, format) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

/// Clamp floating point value to 8-bit range [0, 255] after gamma correction.
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

/// Alpha is linear.
#[inline]
fn alpha_byte(v: Float) -> u8 {
    clamp(255.0 * v + 0.5, 0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_clamped() {
        assert_eq!(clamp_byte(-1.0), 0);
        assert_eq!(clamp_byte(0.0), 0);
        assert_eq!(clamp_byte(1.0), 255);
        assert_eq!(clamp_byte(4.0), 255);
        assert_eq!(alpha_byte(0.5), 128);
    }
}
