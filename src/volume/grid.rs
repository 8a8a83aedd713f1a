use std::path::Path;

use glam::{IVec3, UVec3, Vec3};

use crate::error::SdfViewError;
use crate::raymarch::kernel::FieldSampler;

/// Decode a signed 8-bit normalized sample the way an `R8Snorm` texture
/// does: `max(v / 127, -1)`.
#[must_use]
pub fn decode_snorm8(v: i8) -> f32 {
    (f32::from(v) / 127.0).max(-1.0)
}

/// Encode a value in `[-1, 1]` as a signed 8-bit normalized sample.
#[must_use]
pub fn encode_snorm8(v: f32) -> i8 {
    (v.clamp(-1.0, 1.0) * 127.0).round() as i8
}

/// What an [`SdfGrid::update`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridChange {
    /// Resolution changed: storage (and the GPU texture) was reallocated.
    pub reallocated: bool,
    /// Physical box size changed: the bounding mesh must be rebuilt.
    pub resized: bool,
}

/// Dense signed-distance grid centered at the origin of its model frame.
///
/// Samples are stored x-fastest, then y, then z. A stored value `v` decodes
/// to `decode_snorm8(v)` in `[-1, 1]` and represents a physical distance of
/// `decode_snorm8(v) * snorm_width`, where `snorm_width` is the narrow-band
/// half-width the producer thresholded with.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfGrid {
    samples: Vec<i8>,
    resolution: UVec3,
    size: Vec3,
    dirty: bool,
}

impl SdfGrid {
    /// Create a grid owning a copy of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::GridLength`] if `data.len()` is not
    /// `resolution.x * resolution.y * resolution.z`, and
    /// [`SdfViewError::DegenerateResolution`] if any axis has fewer than two
    /// samples.
    pub fn new(
        data: &[i8],
        resolution: UVec3,
        size: Vec3,
    ) -> Result<Self, SdfViewError> {
        validate(data, resolution)?;
        Ok(Self {
            samples: data.to_vec(),
            resolution,
            size,
            dirty: true,
        })
    }

    /// Load a headerless signed 8-bit volume (x-fastest) from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`SdfGrid::new`].
    pub fn from_raw_file(
        path: &Path,
        resolution: UVec3,
        size: Vec3,
    ) -> Result<Self, SdfViewError> {
        let bytes = std::fs::read(path)?;
        let data: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
        log::debug!(
            "read {} samples from {}",
            data.len(),
            path.display()
        );
        Self::new(&data, resolution, size)
    }

    /// Sample an analytic distance function on the grid lattice and
    /// threshold it to `[-snorm_width, snorm_width]`.
    ///
    /// Lattice point `i` along an axis sits at
    /// `-size / 2 + i * size / (resolution - 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::DegenerateResolution`] for resolutions below
    /// two samples per axis.
    pub fn from_distance_fn(
        resolution: UVec3,
        size: Vec3,
        snorm_width: f32,
        distance: impl Fn(Vec3) -> f32,
    ) -> Result<Self, SdfViewError> {
        if resolution.min_element() < 2 {
            return Err(SdfViewError::DegenerateResolution(resolution));
        }
        let step = size / (resolution - 1).as_vec3();
        let origin = -0.5 * size;
        let mut data = Vec::with_capacity(sample_count(resolution));
        for z in 0..resolution.z {
            for y in 0..resolution.y {
                for x in 0..resolution.x {
                    let p = origin + UVec3::new(x, y, z).as_vec3() * step;
                    data.push(encode_snorm8(distance(p) / snorm_width));
                }
            }
        }
        Self::new(&data, resolution, size)
    }

    /// Replace the grid contents.
    ///
    /// Same resolution overwrites storage in place; a different resolution
    /// reallocates it and discards the old samples. A size-only change keeps
    /// the samples and changes their physical extent. The grid is marked
    /// dirty for upload either way.
    ///
    /// # Errors
    ///
    /// Same as [`SdfGrid::new`]; the grid is left untouched on error.
    pub fn update(
        &mut self,
        data: &[i8],
        resolution: UVec3,
        size: Vec3,
    ) -> Result<GridChange, SdfViewError> {
        validate(data, resolution)?;

        let change = GridChange {
            reallocated: resolution != self.resolution,
            resized: size != self.size,
        };

        if change.reallocated {
            log::debug!(
                "grid resolution {} -> {}, reallocating",
                self.resolution,
                resolution
            );
            self.samples = data.to_vec();
            self.resolution = resolution;
        } else {
            self.samples.copy_from_slice(data);
        }

        if change.resized {
            log::debug!("grid size {} -> {}", self.size, size);
            self.size = size;
        }

        self.dirty = true;
        Ok(change)
    }

    /// Samples per axis.
    #[must_use]
    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }

    /// Physical box extents.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Raw samples, x-fastest.
    #[must_use]
    pub fn samples(&self) -> &[i8] {
        &self.samples
    }

    /// Whether the samples changed since the last [`mark_uploaded`](Self::mark_uploaded).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after the GPU copy is current.
    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }

    /// Texel pitch in normalized coordinates, `1 / (resolution - 1)`.
    #[must_use]
    pub fn texel_size(&self) -> Vec3 {
        texel_size(self.resolution)
    }

    /// Decoded sample at an integer lattice coordinate.
    #[must_use]
    pub fn value_at(&self, cell: UVec3) -> f32 {
        decode_snorm8(self.samples[self.index(cell)])
    }

    /// Trilinearly filtered sample at normalized texture coordinates, with
    /// clamp-to-edge addressing and texel centers at `(i + 0.5) / n`, the
    /// same convention as a linear-filtered GPU sampler.
    #[must_use]
    pub fn sample_trilinear(&self, uvw: Vec3) -> f32 {
        let coord = uvw * self.resolution.as_vec3() - 0.5;
        let base = coord.floor();
        let t = coord - base;

        let max = self.resolution.as_ivec3() - 1;
        let lo = base.as_ivec3().clamp(IVec3::ZERO, max).as_uvec3();
        let hi = (base.as_ivec3() + 1).clamp(IVec3::ZERO, max).as_uvec3();

        let fetch = |x: u32, y: u32, z: u32| self.value_at(UVec3::new(x, y, z));
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let c00 = lerp(fetch(lo.x, lo.y, lo.z), fetch(hi.x, lo.y, lo.z), t.x);
        let c10 = lerp(fetch(lo.x, hi.y, lo.z), fetch(hi.x, hi.y, lo.z), t.x);
        let c01 = lerp(fetch(lo.x, lo.y, hi.z), fetch(hi.x, lo.y, hi.z), t.x);
        let c11 = lerp(fetch(lo.x, hi.y, hi.z), fetch(hi.x, hi.y, hi.z), t.x);

        lerp(lerp(c00, c10, t.y), lerp(c01, c11, t.y), t.z)
    }

    fn index(&self, cell: UVec3) -> usize {
        let r = self.resolution;
        (cell.x + r.x * (cell.y + r.y * cell.z)) as usize
    }
}

impl FieldSampler for SdfGrid {
    fn sample(&self, uvw: Vec3) -> f32 {
        self.sample_trilinear(uvw)
    }
}

/// Texel pitch `1 / (resolution - 1)` for a grid resolution.
#[must_use]
pub fn texel_size(resolution: UVec3) -> Vec3 {
    Vec3::ONE / (resolution.as_vec3() - 1.0)
}

fn sample_count(resolution: UVec3) -> usize {
    resolution.x as usize * resolution.y as usize * resolution.z as usize
}

fn validate(data: &[i8], resolution: UVec3) -> Result<(), SdfViewError> {
    if resolution.min_element() < 2 {
        return Err(SdfViewError::DegenerateResolution(resolution));
    }
    let expected = sample_count(resolution);
    if data.len() != expected {
        return Err(SdfViewError::GridLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(resolution: UVec3) -> Vec<i8> {
        (0..sample_count(resolution))
            .map(|i| (i % 255) as i8)
            .collect()
    }

    #[test]
    fn rejects_length_mismatch() {
        let res = UVec3::new(4, 4, 4);
        let err = SdfGrid::new(&[0; 63], res, Vec3::ONE).unwrap_err();
        assert!(matches!(
            err,
            SdfViewError::GridLength {
                expected: 64,
                actual: 63
            }
        ));
    }

    #[test]
    fn rejects_single_sample_axis() {
        let res = UVec3::new(4, 1, 4);
        let err = SdfGrid::new(&[0; 16], res, Vec3::ONE).unwrap_err();
        assert!(matches!(err, SdfViewError::DegenerateResolution(_)));
    }

    #[test]
    fn size_only_update_preserves_samples() {
        let res = UVec3::new(4, 3, 2);
        let data = ramp(res);
        let mut grid = SdfGrid::new(&data, res, Vec3::splat(2.0)).unwrap();
        grid.mark_uploaded();

        let change = grid.update(&data, res, Vec3::new(1.0, 2.0, 3.0)).unwrap();

        assert_eq!(
            change,
            GridChange {
                reallocated: false,
                resized: true
            }
        );
        assert_eq!(grid.samples(), data.as_slice());
        assert_eq!(grid.size(), Vec3::new(1.0, 2.0, 3.0));
        assert!(grid.is_dirty());
    }

    #[test]
    fn resolution_change_reallocates() {
        let res = UVec3::splat(2);
        let mut grid = SdfGrid::new(&[1; 8], res, Vec3::ONE).unwrap();

        let new_res = UVec3::splat(3);
        let data = ramp(new_res);
        let change = grid.update(&data, new_res, Vec3::ONE).unwrap();

        assert!(change.reallocated);
        assert!(!change.resized);
        assert_eq!(grid.resolution(), new_res);
        assert_eq!(grid.samples().len(), 27);
    }

    #[test]
    fn failed_update_leaves_grid_untouched() {
        let res = UVec3::splat(2);
        let mut grid = SdfGrid::new(&[5; 8], res, Vec3::ONE).unwrap();
        let before = grid.clone();

        assert!(grid.update(&[0; 7], res, Vec3::splat(4.0)).is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn snorm_decode_matches_r8snorm() {
        assert_eq!(decode_snorm8(127), 1.0);
        assert_eq!(decode_snorm8(-127), -1.0);
        assert_eq!(decode_snorm8(-128), -1.0);
        assert_eq!(decode_snorm8(0), 0.0);
        assert_eq!(encode_snorm8(2.0), 127);
        assert_eq!(encode_snorm8(-0.5), -64);
    }

    #[test]
    fn trilinear_hits_texel_centers_and_midpoints() {
        let res = UVec3::new(2, 2, 2);
        let mut data = [0i8; 8];
        data[1] = 127; // x = 1, y = 0, z = 0
        let grid = SdfGrid::new(&data, res, Vec3::ONE).unwrap();

        // Texel centers sit at 0.25 and 0.75 for two samples.
        let at_center = grid.sample_trilinear(Vec3::new(0.75, 0.25, 0.25));
        assert!((at_center - 1.0).abs() < 1e-6);

        let midway = grid.sample_trilinear(Vec3::new(0.5, 0.25, 0.25));
        assert!((midway - 0.5).abs() < 1e-6);

        // Clamp to edge outside the texel-center range.
        let clamped = grid.sample_trilinear(Vec3::new(1.0, 0.0, 0.0));
        assert!((clamped - 1.0).abs() < 1e-6);
    }

    #[test]
    fn distance_fn_thresholds_to_band() {
        let res = UVec3::splat(5);
        let grid = SdfGrid::from_distance_fn(res, Vec3::splat(2.0), 0.5, |p| {
            p.length() - 0.5
        })
        .unwrap();

        // Center lattice point is 0.5 inside the sphere: exactly -1 band.
        assert_eq!(grid.value_at(UVec3::splat(2)), -1.0);
        // Corners are far outside: clamped to +1.
        assert_eq!(grid.value_at(UVec3::ZERO), 1.0);
    }

    #[test]
    fn raw_file_round_trip() {
        let res = UVec3::new(3, 2, 2);
        let bytes: Vec<u8> = (0u8..12).map(|b| b.wrapping_mul(21)).collect();
        let path = std::env::temp_dir().join("sdfview_raw_grid_test.raw");
        std::fs::write(&path, &bytes).unwrap();

        let grid = SdfGrid::from_raw_file(&path, res, Vec3::ONE).unwrap();
        let expected: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
        assert_eq!(grid.samples(), expected.as_slice());

        let _ = std::fs::remove_file(&path);
    }
}
