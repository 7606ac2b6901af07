//! Spectrum

mod rgb_spectrum;

// Re-export
pub use rgb_spectrum::*;

/// Paths carry RGB throughput and radiance.
pub type Spectrum = RGBSpectrum;
