//! Seeded Perlin sampling used by terrain, lodes, and flora placement.
//!
//! Every sampler is a pure function of its inputs and the seed, so any
//! chunk can be generated on any thread in any order.

use std::sync::atomic::{AtomicBool, Ordering};

use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::CHUNK_WIDTH;

/// Added to every coordinate so integer positions never land on a lattice
/// point, where gradient noise is always exactly zero.
const LATTICE_NUDGE: f32 = 0.1;

static DEGENERATE_SCALE_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_degenerate_scale(which: &str, scale: f32) {
    if !DEGENERATE_SCALE_WARNED.swap(true, Ordering::Relaxed) {
        log::warn!("{which}: degenerate noise scale {scale}; sampling as 0");
    }
}

pub struct NoiseField {
    seed: i32,
    perlin: FastNoiseLite,
}

impl NoiseField {
    pub fn new(seed: i32) -> Self {
        let mut perlin = FastNoiseLite::with_seed(seed);
        perlin.set_noise_type(Some(NoiseType::Perlin));
        perlin.set_frequency(Some(1.0));
        Self { seed, perlin }
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Raw Perlin remapped from `[-1,1]` to `[0,1]`.
    #[inline]
    fn perlin(&self, x: f32, y: f32) -> f32 {
        (self.perlin.get_noise_2d(x, y) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// 2D field in `[0,1]` at a world column. `scale` is a frequency in
    /// cycles per chunk width; `scale == 0` yields the constant 0.5.
    /// Negative or non-finite scales are misconfiguration and sample as 0.
    pub fn sample_2d(&self, x: f32, z: f32, offset: f32, scale: f32) -> f32 {
        if !scale.is_finite() || scale < 0.0 {
            warn_degenerate_scale("sample_2d", scale);
            return 0.0;
        }
        let w = CHUNK_WIDTH as f32;
        self.perlin(
            (x + offset + LATTICE_NUDGE) / w * scale,
            (z + offset + LATTICE_NUDGE) / w * scale,
        )
    }

    /// 3D presence test built from the six ordered axis-pair 2D samples.
    pub fn sample_3d(&self, x: f32, y: f32, z: f32, offset: f32, scale: f32, threshold: f32) -> bool {
        if !scale.is_finite() || scale < 0.0 {
            warn_degenerate_scale("sample_3d", scale);
            return false;
        }
        let a = (x + offset + LATTICE_NUDGE) * scale;
        let b = (y + offset + LATTICE_NUDGE) * scale;
        let c = (z + offset + LATTICE_NUDGE) * scale;
        self.six_pair_mean(a, b, c) > threshold
    }

    /// Wavelength-style 2D sample: `scale` is the feature size in voxels.
    /// Scales at or below 1 would alias every voxel, so they sample as 0.
    pub fn perlin_2d(&self, x: f32, y: f32, scale: f32, offset: f32) -> f32 {
        if scale.is_nan() || scale <= 1.0 {
            warn_degenerate_scale("perlin_2d", scale);
            return 0.0;
        }
        self.perlin((x + offset) / scale, (y + offset) / scale)
    }

    pub fn perlin_3d(&self, x: f32, y: f32, z: f32, scale: f32, offset: f32) -> f32 {
        if scale.is_nan() || scale <= 1.0 {
            warn_degenerate_scale("perlin_3d", scale);
            return 0.0;
        }
        self.six_pair_mean((x + offset) / scale, (y + offset) / scale, (z + offset) / scale)
    }

    #[inline]
    fn six_pair_mean(&self, a: f32, b: f32, c: f32) -> f32 {
        let ab = self.perlin(a, b);
        let bc = self.perlin(b, c);
        let ac = self.perlin(a, c);
        let ba = self.perlin(b, a);
        let cb = self.perlin(c, b);
        let ca = self.perlin(c, a);
        (ab + bc + ac + ba + cb + ca) / 6.0
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_scale_is_constant_half() {
        let n = NoiseField::new(1234);
        for (x, z) in [(0.0, 0.0), (17.0, -3.0), (1000.0, 555.0)] {
            assert_eq!(n.sample_2d(x, z, 0.0, 0.0), 0.5);
            assert_eq!(n.sample_2d(x, z, 250.0, 0.0), 0.5);
        }
    }

    #[test]
    fn negative_scale_samples_zero() {
        let n = NoiseField::new(7);
        assert_eq!(n.sample_2d(3.0, 4.0, 0.0, -1.0), 0.0);
        assert!(!n.sample_3d(3.0, 4.0, 5.0, 0.0, f32::NAN, 0.0));
    }

    #[test]
    fn wavelength_scale_at_or_below_one_samples_zero() {
        let n = NoiseField::new(7);
        assert_eq!(n.perlin_2d(10.0, 10.0, 1.0, 0.0), 0.0);
        assert_eq!(n.perlin_2d(10.0, 10.0, 0.5, 0.0), 0.0);
        assert_eq!(n.perlin_3d(1.0, 2.0, 3.0, 1.0, 0.0), 0.0);
        let v = n.perlin_2d(10.0, 10.0, 20.0, 0.0);
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn samples_stay_in_unit_range() {
        let n = NoiseField::new(99);
        for i in 0..200 {
            let x = i as f32 * 3.7 - 300.0;
            let z = i as f32 * -1.3 + 40.0;
            let v = n.sample_2d(x, z, 12.0, 0.37);
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn three_d_threshold_bounds() {
        let n = NoiseField::new(5);
        // The mean is in [0,1], so a threshold of 1 never passes and one just below 0 always does.
        for i in 0..50 {
            let p = i as f32 * 2.3;
            assert!(!n.sample_3d(p, p * 0.5, -p, 0.0, 0.1, 1.0));
            assert!(n.sample_3d(p, p * 0.5, -p, 0.0, 0.1, -0.01));
        }
    }
}
