//! CPU execution of the frame plan.
//!
//! [`SoftwareFrame`] mirrors [`VolumeRenderPass`](super::VolumeRenderPass)
//! on plain images: the raymarch step emulates back-face rasterization of
//! the bounding box per pixel and runs [`kernel`](crate::raymarch::kernel)
//! for each covered pixel; compositing samples the volume image with
//! nearest filtering. It needs no GPU, which makes it the reference for
//! headless checks.

use glam::{Mat4, UVec3, Vec2, Vec3, Vec4};

use super::{CopySource, Destination, FramePlan, FrameStep, StepTarget};
use crate::camera::CameraState;
use crate::composite::{composite_texel, Texel};
use crate::error::SdfViewError;
use crate::options::Options;
use crate::raymarch::kernel::{unproject_near, MarchContext, MarchParams, Ray};
use crate::util::coords::view_point_depth;
use crate::volume::{GridChange, SdfGrid};

/// A color + depth image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    texels: Vec<Texel>,
}

impl Image {
    /// `width` x `height` image filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Texel) -> Self {
        Self {
            width,
            height,
            texels: vec![fill; width as usize * height as usize],
        }
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Texel at pixel `(x, y)`, row 0 at the top.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Texel {
        self.texels[self.index(x, y)]
    }

    /// Overwrite pixel `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, texel: Texel) {
        let i = self.index(x, y);
        self.texels[i] = texel;
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, texel: Texel) {
        self.texels.fill(texel);
    }

    /// Change the size, discarding contents.
    pub fn reset(&mut self, width: u32, height: u32, fill: Texel) {
        self.width = width;
        self.height = height;
        self.texels.clear();
        self.texels
            .resize(width as usize * height as usize, fill);
    }

    /// Nearest texel at normalized coordinates, clamped to the edge.
    #[must_use]
    pub fn sample_nearest(&self, uv: Vec2) -> Texel {
        let x = ((uv.x * self.width as f32) as u32).min(self.width - 1);
        let y = ((uv.y * self.height as f32) as u32).min(self.height - 1);
        self.get(x, y)
    }

    /// All texels, row-major.
    #[must_use]
    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }
}

/// CPU counterpart of the GPU frame orchestrator.
pub struct SoftwareFrame {
    grid: SdfGrid,
    params: MarchParams,
    base_color: Vec3,
    clear: Texel,
    visible: bool,
    opaque: Image,
    volume: Image,
    transient: Image,
}

impl SoftwareFrame {
    /// Allocate images for a `viewport` and the configured volume size.
    /// The opaque image starts cleared to the volume clear color.
    #[must_use]
    pub fn new(grid: SdfGrid, options: &Options, viewport: (u32, u32)) -> Self {
        let clear = Texel::cleared(Vec4::from(options.volume.clear_color));
        let (width, height) = (viewport.0.max(1), viewport.1.max(1));
        let render_size = options.volume.render_size.max(1);
        Self {
            grid,
            params: options.raymarch.march_params(),
            base_color: Vec3::from(options.volume.base_color),
            clear,
            visible: options.volume.visible,
            opaque: Image::new(width, height, clear),
            volume: Image::new(render_size, render_size, clear),
            transient: Image::new(width, height, clear),
        }
    }

    /// Replace the volume.
    ///
    /// # Errors
    ///
    /// Returns the grid's validation errors; nothing changes on error.
    pub fn set_volume(
        &mut self,
        data: &[i8],
        resolution: UVec3,
        size: Vec3,
    ) -> Result<GridChange, SdfViewError> {
        self.grid.update(data, resolution, size)
    }

    /// The current grid.
    #[must_use]
    pub fn grid(&self) -> &SdfGrid {
        &self.grid
    }

    /// Show or hide the volume.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Resize the viewport images. Zero sizes are ignored and the volume
    /// image keeps its size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.opaque.size() {
            return;
        }
        self.opaque.reset(width, height, self.clear);
        self.transient.reset(width, height, self.clear);
    }

    /// The opaque image, for the host to draw into.
    pub fn opaque_mut(&mut self) -> &mut Image {
        &mut self.opaque
    }

    /// The opaque image.
    #[must_use]
    pub fn opaque(&self) -> &Image {
        &self.opaque
    }

    /// The volume image of the last raymarch.
    #[must_use]
    pub fn volume_image(&self) -> &Image {
        &self.volume
    }

    /// Run one frame into `destination`. External destinations are resized
    /// to the viewport.
    pub fn render(
        &mut self,
        camera: &CameraState,
        box_to_world: Mat4,
        mut destination: Destination<&mut Image>,
    ) {
        let plan = FramePlan::new(self.visible, destination.aliases_opaque());
        for step in plan.steps() {
            match *step {
                FrameStep::RaymarchVolume => {
                    self.raymarch(camera, box_to_world);
                }
                FrameStep::Composite { target } => {
                    let out = match &mut destination {
                        Destination::External(image)
                            if target == StepTarget::Destination =>
                        {
                            &mut **image
                        }
                        _ => &mut self.transient,
                    };
                    composite_into(&self.opaque, &self.volume, out);
                }
                FrameStep::Copy { source } => match (&mut destination, source) {
                    (Destination::External(image), CopySource::Transient) => {
                        image.clone_from(&self.transient);
                    }
                    (Destination::External(image), CopySource::Opaque) => {
                        image.clone_from(&self.opaque);
                    }
                    (Destination::Opaque, CopySource::Transient) => {
                        self.opaque.clone_from(&self.transient);
                    }
                    (Destination::Opaque, CopySource::Opaque) => {}
                },
            }
        }
    }

    fn raymarch(&mut self, camera: &CameraState, box_to_world: Mat4) {
        let ctx = MarchContext::new(
            self.grid.resolution(),
            self.grid.size(),
            camera.view_to_model(box_to_world),
            &self.params,
        );
        let view_from_clip = camera.clip_from_view.inverse();
        let (width, height) = self.volume.size();

        self.volume.fill(self.clear);
        for y in 0..height {
            for x in 0..width {
                let ndc = Vec2::new(
                    (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
                    1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
                );
                let near = unproject_near(view_from_clip, ndc);
                let ray = Ray::through_fragment(camera.projection, near);

                // Back face of the box along this pixel's ray.
                let bounds = ctx.intersect_ray_volume(&ray);
                let covered = bounds.x <= bounds.y && bounds.y >= 0.0;
                if !covered {
                    continue;
                }
                let back = ray.at(bounds.y);
                if !back_face_rasterized(camera.clip_from_view, back) {
                    continue;
                }

                if let Some(fragment) = ctx.shade_fragment(
                    &self.grid,
                    camera.projection,
                    camera.clip_from_view,
                    self.base_color,
                    back,
                ) {
                    self.volume.set(
                        x,
                        y,
                        Texel {
                            color: fragment.color,
                            depth: fragment.depth.clamp(0.0, 1.0),
                        },
                    );
                }
            }
        }
    }
}

/// Whether a back-face fragment at view-space `back` survives clipping
/// against the near and far planes.
fn back_face_rasterized(clip_from_view: Mat4, back: Vec3) -> bool {
    (0.0..=1.0).contains(&view_point_depth(clip_from_view, back))
}

fn composite_into(opaque: &Image, volume: &Image, out: &mut Image) {
    let (width, height) = opaque.size();
    if out.size() != (width, height) {
        out.reset(width, height, Texel::cleared(Vec4::ZERO));
    }
    for y in 0..height {
        for x in 0..width {
            let uv = Vec2::new(
                (x as f32 + 0.5) / width as f32,
                (y as f32 + 0.5) / height as f32,
            );
            let merged =
                composite_texel(opaque.get(x, y), volume.sample_nearest(uv));
            out.set(x, y, merged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ProjectionKind;

    const BACKGROUND: Vec4 = Vec4::new(0.1, 0.2, 0.3, 1.0);

    fn options(render_size: u32) -> Options {
        let mut options = Options::default();
        options.volume.render_size = render_size;
        options.volume.clear_color = BACKGROUND.to_array();
        options
    }

    /// 4x4x4 zero grid with a single `127` at (2, 2, 2), spanning 2^3.
    fn single_voxel_grid() -> SdfGrid {
        let mut data = vec![0i8; 64];
        data[2 + 4 * (2 + 4 * 2)] = 127;
        SdfGrid::new(&data, UVec3::splat(4), Vec3::splat(2.0)).unwrap()
    }

    /// Orthographic camera 5 below the box on world z, looking up +z.
    fn ortho_camera() -> CameraState {
        let world_to_view = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ZERO,
            Vec3::Y,
        );
        CameraState {
            projection: ProjectionKind::Orthographic,
            view_to_world: world_to_view.inverse(),
            clip_from_view: Mat4::orthographic_rh_gl(
                -2.0, 2.0, -2.0, 2.0, 0.1, 20.0,
            ),
        }
    }

    fn perspective_camera() -> CameraState {
        let world_to_view = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
        );
        CameraState {
            projection: ProjectionKind::Perspective,
            view_to_world: world_to_view.inverse(),
            clip_from_view: Mat4::perspective_rh_gl(
                45f32.to_radians(),
                1.0,
                0.1,
                20.0,
            ),
        }
    }

    #[test]
    fn orthographic_ray_hits_nearest_face() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (16, 16));
        let camera = ortho_camera();
        let mut out = Image::new(1, 1, Texel::cleared(Vec4::ZERO));

        frame.render(&camera, Mat4::IDENTITY, Destination::External(&mut out));

        let hit = frame.volume_image().get(8, 8);
        assert!(hit.depth > 0.0 && hit.depth < 1.0);
        assert_eq!(hit.color.w, 1.0);

        // The face nearest the camera is 4 units down the view axis.
        let expected =
            view_point_depth(camera.clip_from_view, Vec3::new(0.0, 0.0, -4.0));
        assert!((hit.depth - expected).abs() < 1e-3, "{}", hit.depth);

        // Face normal is perpendicular to view-space y: mid-tone shading.
        assert!(hit.color.truncate().abs_diff_eq(Vec3::splat(0.5), 1e-3));

        // Nearer than the cleared opaque buffer, so the volume shows.
        assert_eq!(out.size(), (16, 16));
        assert_eq!(out.get(8, 8), hit);
    }

    #[test]
    fn pixels_outside_box_keep_clear() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (16, 16));
        let mut out = Image::new(16, 16, Texel::cleared(Vec4::ZERO));

        frame.render(&ortho_camera(), Mat4::IDENTITY, Destination::External(&mut out));

        // Corners look past the 2x2 box inside a 4x4 view.
        assert_eq!(frame.volume_image().get(0, 0).depth, 1.0);
        assert_eq!(out.get(0, 0), Texel::cleared(BACKGROUND));
    }

    #[test]
    fn nearer_opaque_geometry_occludes_volume() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (16, 16));
        let wall = Texel {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            depth: 0.01,
        };
        frame.opaque_mut().fill(wall);
        let mut out = Image::new(16, 16, Texel::cleared(Vec4::ZERO));

        frame.render(&ortho_camera(), Mat4::IDENTITY, Destination::External(&mut out));

        assert!(out.texels().iter().all(|t| *t == wall));
    }

    #[test]
    fn perspective_sphere_is_round() {
        let grid = SdfGrid::from_distance_fn(
            UVec3::splat(24),
            Vec3::splat(2.0),
            Vec3::splat(2.0).length() * 1.0e-2,
            |p| p.length() - 0.6,
        )
        .unwrap();
        let mut frame = SoftwareFrame::new(grid, &options(32), (32, 32));
        let mut out = Image::new(32, 32, Texel::cleared(Vec4::ZERO));

        frame.render(
            &perspective_camera(),
            Mat4::IDENTITY,
            Destination::External(&mut out),
        );

        let volume = frame.volume_image();
        let center = volume.get(16, 16);
        assert!(center.depth < 1.0);
        // Top of the sphere faces view-space +y: brighter than the bottom.
        let covered: Vec<_> = (0..32)
            .filter(|&y| volume.get(16, y).depth < 1.0)
            .collect();
        let (top, bottom) = (covered[0], covered[covered.len() - 1]);
        assert!(volume.get(16, top).color.x > volume.get(16, bottom).color.x);
        // Box corners are not part of the sphere.
        assert_eq!(volume.get(0, 0).depth, 1.0);
    }

    #[test]
    fn resize_tracks_viewport_not_volume() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (8, 6));
        frame.resize(10, 7);
        frame.resize(0, 3);

        let mut out = Image::new(1, 1, Texel::cleared(Vec4::ZERO));
        frame.render(&ortho_camera(), Mat4::IDENTITY, Destination::External(&mut out));

        assert_eq!(out.size(), (10, 7));
        assert_eq!(frame.opaque().size(), (10, 7));
        assert_eq!(frame.volume_image().size(), (16, 16));
    }

    #[test]
    fn aliased_destination_matches_external() {
        let camera = ortho_camera();
        let mut direct =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (12, 12));
        let mut out = Image::new(12, 12, Texel::cleared(Vec4::ZERO));
        direct.render(&camera, Mat4::IDENTITY, Destination::External(&mut out));

        let mut aliased =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (12, 12));
        aliased.render(&camera, Mat4::IDENTITY, Destination::Opaque);

        assert_eq!(aliased.opaque(), &out);
    }

    #[test]
    fn hidden_volume_passes_opaque_through() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(16), (8, 8));
        frame.set_visible(false);
        let marker = Texel {
            color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            depth: 0.5,
        };
        frame.opaque_mut().set(3, 4, marker);
        let mut out = Image::new(8, 8, Texel::cleared(Vec4::ZERO));

        frame.render(&ortho_camera(), Mat4::IDENTITY, Destination::External(&mut out));

        assert_eq!(&out, frame.opaque());
        assert_eq!(out.get(3, 4), marker);
    }

    #[test]
    fn back_faces_outside_depth_range_are_clipped() {
        let clip_from_view =
            Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.1, 20.0);
        let at = |z: f32| {
            back_face_rasterized(clip_from_view, Vec3::new(0.0, 0.0, z))
        };
        assert!(!at(-0.05), "in front of the near plane");
        assert!(at(-1.0));
        assert!(!at(-30.0), "beyond the far plane");
    }

    #[test]
    fn set_volume_keeps_samples_on_size_change() {
        let mut frame =
            SoftwareFrame::new(single_voxel_grid(), &options(8), (8, 8));
        let data = frame.grid().samples().to_vec();
        let change = frame
            .set_volume(&data, UVec3::splat(4), Vec3::splat(3.0))
            .unwrap();
        assert!(change.resized && !change.reallocated);
        assert_eq!(frame.grid().samples(), data.as_slice());
        assert_eq!(frame.grid().size(), Vec3::splat(3.0));
    }
}
