//! RGB Spectrum.

use crate::math::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign};

/// Number of spectral samples to use for `RGBSpectrum`.
pub const RGB_SAMPLES: usize = 3;

/// RGBSpectrum represents a spectral power distribution (SPD) with a weighted sum of red, green and blue
/// components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    /// The sampled spectral values.
    c: [Float; RGB_SAMPLES],
}

impl RGBSpectrum {
    /// Black.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// Unit weight.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Create a new `RGBSpectrum` with a constant value across all channels.
    ///
    /// * `v` - Constant value.
    pub const fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Create a new `RGBSpectrum` from red, green and blue values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub const fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns the RGB values.
    pub fn to_rgb(&self) -> [Float; RGB_SAMPLES] {
        self.c
    }

    /// Returns the average of the channels.
    pub fn average(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) / RGB_SAMPLES as Float
    }

    /// Returns the sum of the absolute channel values.
    pub fn abs_sum(&self) -> Float {
        self.c.iter().map(|v| v.abs()).sum()
    }

    /// Returns the luminance (y-coefficient of XYZ colour).
    pub fn y(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }

    /// Returns `true` if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|&v| v == 0.0)
    }

    /// Returns `true` if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns `true` if all channels are finite.
    pub fn is_finite(&self) -> bool {
        self.c.iter().all(|v| v.is_finite())
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::from_rgb(self.c[0] + other.c[0], self.c[1] + other.c[1], self.c[2] + other.c[2])
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, other: Self) {
        for (a, b) in self.c.iter_mut().zip(other.c.iter()) {
            *a += *b;
        }
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::from_rgb(self.c[0] * other.c[0], self.c[1] * other.c[1], self.c[2] * other.c[2])
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, other: Self) {
        for (a, b) in self.c.iter_mut().zip(other.c.iter()) {
            *a *= *b;
        }
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, s: Float) -> Self {
        Self::from_rgb(self.c[0] * s, self.c[1] * s, self.c[2] * s)
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> RGBSpectrum {
        s * self
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, s: Float) -> Self {
        assert!(s != 0.0);
        self * (1.0 / s)
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}
