//! Sphere-tracing kernel for the SDF volume.
//!
//! This is the CPU rendition of `volume_raymarch.wgsl`: same coordinate
//! chain, same step rule, same shading. The software frame runs it per
//! pixel, and the tests use it to check the march against analytic fields.
//!
//! Coordinate chain for a point `p` in view space:
//!
//! ```text
//! model   = view_to_model * p
//! volume  = model / volume_size + 0.5           (box -> [0, 1]^3)
//! texture = volume * (1 - texel) + 0.5 * texel  (texel = 1 / (res - 1))
//! ```

use glam::{Mat4, UVec3, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::camera::ProjectionKind;
use crate::util::coords::view_point_depth;
use crate::volume::grid::texel_size;

/// Default iteration cap of the march loop.
pub const MAX_STEPS: u32 = 128;
/// Default narrow-band width as a fraction of the box diagonal.
pub const BAND_WIDTH_FACTOR: f32 = 1.0e-2;
/// Default hit tolerance as a fraction of the texel diagonal.
pub const TOLERANCE_FACTOR: f32 = 1.0e-3;

/// Something that yields a normalized distance in `[-1, 1]` at normalized
/// texture coordinates.
pub trait FieldSampler {
    /// Normalized distance at `uvw`.
    fn sample(&self, uvw: Vec3) -> f32;
}

/// Tunables of the march.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchParams {
    /// Iteration cap. Exhausting it reports a hit at the current distance.
    pub max_steps: u32,
    /// `snorm_width = |volume_size| * band_width_factor`.
    pub band_width_factor: f32,
    /// `dist_tol = |volume_size * texel| * tolerance_factor`.
    pub tolerance_factor: f32,
}

impl Default for MarchParams {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            band_width_factor: BAND_WIDTH_FACTOR,
            tolerance_factor: TOLERANCE_FACTOR,
        }
    }
}

/// A ray in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    /// The ray through a back-face fragment at `view_position`.
    ///
    /// Perspective rays start at the eye; orthographic rays start on the
    /// `z = 0` view plane and run down `-z`.
    #[must_use]
    pub fn through_fragment(
        projection: ProjectionKind,
        view_position: Vec3,
    ) -> Self {
        match projection {
            ProjectionKind::Perspective => Self {
                origin: Vec3::ZERO,
                dir: view_position.normalize(),
            },
            ProjectionKind::Orthographic => Self {
                origin: view_position.truncate().extend(0.0),
                dir: Vec3::NEG_Z,
            },
        }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// A shaded volume fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// RGBA color, alpha always 1.
    pub color: Vec4,
    /// Depth in `[0, 1]`.
    pub depth: f32,
}

/// Per-volume constants shared by every ray of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchContext {
    /// Physical box extents.
    pub volume_size: Vec3,
    /// `1 / (resolution - 1)`.
    pub texel_size: Vec3,
    /// Physical distance represented by a normalized sample of 1.
    pub snorm_width: f32,
    /// Hit tolerance.
    pub dist_tol: f32,
    /// View space to box model space.
    pub view_to_model: Mat4,
    /// Iteration cap.
    pub max_steps: u32,
}

impl MarchContext {
    /// Derive the march constants for a grid and camera.
    #[must_use]
    pub fn new(
        resolution: UVec3,
        volume_size: Vec3,
        view_to_model: Mat4,
        params: &MarchParams,
    ) -> Self {
        let texel = texel_size(resolution);
        Self {
            volume_size,
            texel_size: texel,
            snorm_width: volume_size.length() * params.band_width_factor,
            dist_tol: (volume_size * texel).length() * params.tolerance_factor,
            view_to_model,
            max_steps: params.max_steps,
        }
    }

    /// Signed distance at a view-space point: the field, clipped to the box.
    #[must_use]
    pub fn distance_at<S: FieldSampler + ?Sized>(
        &self,
        field: &S,
        p: Vec3,
    ) -> f32 {
        let model = self.view_to_model.transform_point3(p);
        let uvw = volume_to_texture(
            model_to_volume(model, self.volume_size),
            self.texel_size,
        );
        let dist = field.sample(uvw) * self.snorm_width;
        op_intersection(dist, sd_box(model, self.volume_size * 0.5))
    }

    /// Central-difference gradient of [`distance_at`](Self::distance_at)
    /// with half a texel of step along each axis, normalized.
    #[must_use]
    pub fn normal_at<S: FieldSampler + ?Sized>(
        &self,
        field: &S,
        p: Vec3,
    ) -> Vec3 {
        let h = self.volume_size * self.texel_size * 0.5;
        let dx = Vec3::new(h.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, h.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, h.z);
        let diff = Vec3::new(
            self.distance_at(field, p + dx) - self.distance_at(field, p - dx),
            self.distance_at(field, p + dy) - self.distance_at(field, p - dy),
            self.distance_at(field, p + dz) - self.distance_at(field, p - dz),
        );
        // Per-axis steps differ on anisotropic boxes.
        (diff / (2.0 * h)).normalize_or_zero()
    }

    /// Ray parameters `(near, far)` of the box slab intersection. The box
    /// is missed when `near > far`.
    #[must_use]
    pub fn intersect_ray_volume(&self, ray: &Ray) -> Vec2 {
        let start = self.view_to_model.transform_point3(ray.origin);
        let dir = self.view_to_model.transform_vector3(ray.dir);
        intersect_ray_box(start, dir, Vec3::ZERO, self.volume_size * 0.5)
    }

    /// Sphere-trace `ray` up to `max_ray_dist`.
    ///
    /// Returns the hit distance along the ray, or `None` once the ray passes
    /// `max_ray_dist`. Running out of steps counts as a hit.
    #[must_use]
    pub fn cast_ray<S: FieldSampler + ?Sized>(
        &self,
        field: &S,
        ray: &Ray,
        max_ray_dist: f32,
    ) -> Option<f32> {
        let mut ray_dist = self.intersect_ray_volume(ray).x.max(0.0);
        for _ in 0..self.max_steps {
            if ray_dist > max_ray_dist {
                return None;
            }
            let dist = self.distance_at(field, ray.at(ray_dist));
            if dist <= self.dist_tol {
                break;
            }
            ray_dist += dist;
        }
        Some(ray_dist)
    }

    /// Run the full fragment program for a back-face fragment at
    /// `view_position`: march, shade, and project the hit to depth.
    #[must_use]
    pub fn shade_fragment<S: FieldSampler + ?Sized>(
        &self,
        field: &S,
        projection: ProjectionKind,
        clip_from_view: Mat4,
        base_color: Vec3,
        view_position: Vec3,
    ) -> Option<Fragment> {
        let ray = Ray::through_fragment(projection, view_position);
        let max_ray_dist = view_position.dot(ray.dir);
        let t = self.cast_ray(field, &ray, max_ray_dist)?;
        let p = ray.at(t);

        let color = shade(base_color, self.normal_at(field, p));
        Some(Fragment {
            color: color.extend(1.0),
            depth: view_point_depth(clip_from_view, p),
        })
    }
}

/// Half-Lambert style shading keyed on the view-space vertical normal.
#[must_use]
pub fn shade(base_color: Vec3, normal: Vec3) -> Vec3 {
    let v = normal.y * 0.5 + 0.5;
    base_color * (0.2 + (0.8 - 0.2) * v)
}

/// Box-model point to `[0, 1]^3` volume coordinates.
#[must_use]
pub fn model_to_volume(p: Vec3, volume_size: Vec3) -> Vec3 {
    p / volume_size + 0.5
}

/// Inverse of [`model_to_volume`].
#[must_use]
pub fn volume_to_model(p: Vec3, volume_size: Vec3) -> Vec3 {
    (p - 0.5) * volume_size
}

/// Volume coordinates to texture coordinates, pulled half a texel in from
/// each face.
#[must_use]
pub fn volume_to_texture(p: Vec3, texel_size: Vec3) -> Vec3 {
    p * (1.0 - texel_size) + 0.5 * texel_size
}

/// Inverse of [`volume_to_texture`].
#[must_use]
pub fn texture_to_volume(p: Vec3, texel_size: Vec3) -> Vec3 {
    (p - 0.5 * texel_size) / (1.0 - texel_size)
}

/// Exact signed distance to an origin-centered box with half-extents
/// `extents`.
#[must_use]
pub fn sd_box(p: Vec3, extents: Vec3) -> f32 {
    let d = p.abs() - extents;
    d.max_element().min(0.0) + d.max(Vec3::ZERO).length()
}

/// CSG intersection of two distances.
#[must_use]
pub fn op_intersection(d0: f32, d1: f32) -> f32 {
    d0.max(d1)
}

/// Slab test of a ray against an axis-aligned box. Returns `(near, far)`.
#[must_use]
pub fn intersect_ray_box(
    start: Vec3,
    dir: Vec3,
    center: Vec3,
    extents: Vec3,
) -> Vec2 {
    let inv_dir = dir.recip();
    let n = inv_dir * (center - start);
    let k = inv_dir.abs() * extents;
    Vec2::new(cmax(n - k), cmin(n + k))
}

// NaN-ignoring component extrema, so axis-parallel rays through a slab
// center fall back to the other axes.
fn cmax(v: Vec3) -> f32 {
    v.x.max(v.y).max(v.z)
}

fn cmin(v: Vec3) -> f32 {
    v.x.min(v.y).min(v.z)
}

/// Unproject an NDC position on the near plane into view space.
#[must_use]
pub fn unproject_near(view_from_clip: Mat4, ndc: Vec2) -> Vec3 {
    let p = view_from_clip * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
    p.xyz() / p.w
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lossless analytic sphere stored in the same normalized form the
    /// grid uses.
    struct Sphere {
        radius: f32,
        ctx: MarchContext,
    }

    impl FieldSampler for Sphere {
        fn sample(&self, uvw: Vec3) -> f32 {
            let volume = texture_to_volume(uvw, self.ctx.texel_size);
            let model = volume_to_model(volume, self.ctx.volume_size);
            (model.length() - self.radius) / self.ctx.snorm_width
        }
    }

    /// Camera at +5 on world z looking at the origin.
    fn sphere_scene() -> (Sphere, Mat4) {
        let world_to_view =
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let view_to_model = world_to_view.inverse();
        let ctx = MarchContext::new(
            UVec3::splat(32),
            Vec3::splat(2.0),
            view_to_model,
            &MarchParams::default(),
        );
        (Sphere { radius: 0.5, ctx }, world_to_view)
    }

    fn back_face(ctx: &MarchContext, ray: &Ray) -> Vec3 {
        ray.at(ctx.intersect_ray_volume(ray).y)
    }

    #[test]
    fn central_ray_hits_sphere_within_tolerance() {
        let (sphere, _) = sphere_scene();
        let ctx = sphere.ctx;
        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::NEG_Z,
        };
        let far = back_face(&ctx, &ray);

        let t = ctx.cast_ray(&sphere, &ray, far.dot(ray.dir)).unwrap();

        // Eye is 5 from the center, sphere radius 0.5.
        assert!((t - 4.5).abs() <= ctx.dist_tol + 1e-5, "t = {t}");
    }

    #[test]
    fn oblique_ray_hits_sphere() {
        let (sphere, world_to_view) = sphere_scene();
        let ctx = sphere.ctx;
        let target = world_to_view.transform_point3(Vec3::new(0.3, 0.0, 0.0));
        let ray = Ray::through_fragment(ProjectionKind::Perspective, target);
        let far = back_face(&ctx, &ray);

        let t = ctx.cast_ray(&sphere, &ray, far.dot(ray.dir)).unwrap();

        // Analytic |o + t d| = r with the sphere center in view space.
        let c = world_to_view.transform_point3(Vec3::ZERO);
        let b = ray.dir.dot(c);
        let expected = b - (b * b - c.length_squared() + 0.25).sqrt();
        assert!((t - expected).abs() <= 10.0 * ctx.dist_tol, "t = {t}");
        assert!(t <= expected + 1e-5);
    }

    #[test]
    fn ray_past_sphere_misses() {
        let (sphere, world_to_view) = sphere_scene();
        let ctx = sphere.ctx;
        let target = world_to_view.transform_point3(Vec3::new(0.8, 0.0, 0.0));
        let ray = Ray::through_fragment(ProjectionKind::Perspective, target);
        let far = back_face(&ctx, &ray);

        assert!(ctx.cast_ray(&sphere, &ray, far.dot(ray.dir)).is_none());
    }

    #[test]
    fn exhausting_steps_reports_a_hit() {
        let (sphere, world_to_view) = sphere_scene();
        let target = world_to_view.transform_point3(Vec3::new(0.8, 0.0, 0.0));
        let ray = Ray::through_fragment(ProjectionKind::Perspective, target);
        let max_ray_dist = back_face(&sphere.ctx, &ray).dot(ray.dir);

        // The same ray misses with the default cap.
        let ctx = MarchContext {
            max_steps: 1,
            ..sphere.ctx
        };
        let t = ctx.cast_ray(&sphere, &ray, max_ray_dist).unwrap();
        assert!(t < max_ray_dist);
    }

    #[test]
    fn ray_outside_box_misses() {
        let (sphere, _) = sphere_scene();
        let ctx = sphere.ctx;
        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::new(0.0, 1.0, -1.0).normalize(),
        };
        let hit = ctx.intersect_ray_volume(&ray);
        assert!(hit.x > hit.y);
    }

    #[test]
    fn texture_mapping_round_trips() {
        let texel = texel_size(UVec3::new(4, 8, 16));
        for p in [Vec3::ZERO, Vec3::ONE, Vec3::new(0.25, 0.5, 0.75)] {
            let back = texture_to_volume(volume_to_texture(p, texel), texel);
            assert!(back.abs_diff_eq(p, 1e-6));
        }
        // Faces map half a texel inside [0, 1].
        assert!(volume_to_texture(Vec3::ZERO, texel).abs_diff_eq(texel * 0.5, 1e-7));
    }

    #[test]
    fn sd_box_signs() {
        let ext = Vec3::splat(1.0);
        assert_eq!(sd_box(Vec3::ZERO, ext), -1.0);
        assert_eq!(sd_box(Vec3::new(2.0, 0.0, 0.0), ext), 1.0);
        assert!((sd_box(Vec3::splat(2.0), ext) - 3f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn orthographic_ray_starts_on_view_plane() {
        let ray = Ray::through_fragment(
            ProjectionKind::Orthographic,
            Vec3::new(0.5, -0.25, -7.0),
        );
        assert_eq!(ray.origin, Vec3::new(0.5, -0.25, 0.0));
        assert_eq!(ray.dir, Vec3::NEG_Z);
    }

    #[test]
    fn normal_follows_gradient_in_stretched_box() {
        // z texels are four times longer than x and y texels.
        let ctx = MarchContext::new(
            UVec3::splat(32),
            Vec3::new(2.0, 2.0, 8.0),
            Mat4::IDENTITY,
            &MarchParams::default(),
        );
        let sphere = Sphere { radius: 0.5, ctx };
        let p = Vec3::new(0.0, 1.0, 1.0).normalize() * 0.5;

        let n = ctx.normal_at(&sphere, p);

        assert!(n.abs_diff_eq(p.normalize(), 2e-2), "n = {n}");
        let lit = shade(Vec3::ONE, n);
        assert!(lit.abs_diff_eq(shade(Vec3::ONE, p.normalize()), 1e-2));
    }

    #[test]
    fn shading_spans_ambient_to_full() {
        let base = Vec3::ONE;
        assert!(shade(base, Vec3::Y).abs_diff_eq(Vec3::splat(0.8), 1e-6));
        assert!(shade(base, Vec3::NEG_Y).abs_diff_eq(Vec3::splat(0.2), 1e-6));
    }
}
