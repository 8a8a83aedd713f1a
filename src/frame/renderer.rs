use glam::{Mat4, UVec3, Vec3};

use super::{CopySource, Destination, FramePlan, FrameStep, StepTarget};
use crate::camera::CameraState;
use crate::composite::{CopyPass, DepthCompositePass, ScreenPass};
use crate::error::SdfViewError;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::gpu::texture::{FrameTarget, TargetViews};
use crate::options::Options;
use crate::raymarch::VolumeRaymarcher;
use crate::volume::{GridChange, SdfGrid};

/// Runs the volume raymarch and depth composite each frame.
///
/// Owns the opaque buffer (viewport sized, drawn into by the host's mesh
/// renderer through [`opaque_views`](Self::opaque_views)), the fixed-size
/// square volume buffer, and the transient buffer used when the destination
/// is the opaque buffer. All destinations must use the context's color
/// format.
pub struct VolumeRenderPass {
    grid: SdfGrid,
    raymarcher: VolumeRaymarcher,
    composite: DepthCompositePass,
    copy: CopyPass,

    opaque: FrameTarget,
    volume: FrameTarget,
    transient: FrameTarget,

    composite_inputs: wgpu::BindGroup,
    transient_copy_inputs: wgpu::BindGroup,
    opaque_copy_inputs: wgpu::BindGroup,

    clear_color: wgpu::Color,
    visible: bool,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl VolumeRenderPass {
    /// Allocate buffers at the context's viewport size and build the passes.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::ShaderCompose`] if a shader fails to compose.
    pub fn new(
        context: &RenderContext,
        shader_composer: &mut ShaderComposer,
        mut grid: SdfGrid,
        options: &Options,
    ) -> Result<Self, SdfViewError> {
        let format = context.format();
        let (width, height) = context.size();
        let render_size = options.volume.render_size.max(1);

        let raymarcher = VolumeRaymarcher::new(
            context,
            shader_composer,
            &mut grid,
            Vec3::from(options.volume.base_color),
            &options.raymarch,
            format,
        )?;
        let composite = DepthCompositePass::new(context, shader_composer, format)?;
        let copy = CopyPass::new(context, shader_composer, format)?;

        let device = &context.device;
        let opaque = FrameTarget::new(device, "Opaque", width, height, format);
        let volume = FrameTarget::new(
            device,
            "Volume",
            render_size,
            render_size,
            format,
        );
        let transient =
            FrameTarget::new(device, "Transient", width, height, format);

        let composite_inputs =
            composite.bind(device, opaque.views(), volume.views());
        let transient_copy_inputs = copy.bind(device, transient.views());
        let opaque_copy_inputs = copy.bind(device, opaque.views());

        let [r, g, b, a] = options.volume.clear_color.map(f64::from);
        log::debug!(
            "volume render pass: viewport {width}x{height}, volume target \
             {render_size}x{render_size}"
        );

        Ok(Self {
            grid,
            raymarcher,
            composite,
            copy,
            opaque,
            volume,
            transient,
            composite_inputs,
            transient_copy_inputs,
            opaque_copy_inputs,
            clear_color: wgpu::Color { r, g, b, a },
            visible: options.volume.visible,
            format,
            width,
            height,
        })
    }

    /// Replace the volume. See [`SdfGrid::update`] for what is reallocated.
    ///
    /// # Errors
    ///
    /// Returns the grid's validation errors; nothing changes on error.
    pub fn set_volume(
        &mut self,
        context: &RenderContext,
        data: &[i8],
        resolution: UVec3,
        size: Vec3,
    ) -> Result<GridChange, SdfViewError> {
        let change = self.grid.update(data, resolution, size)?;
        self.raymarcher.apply_grid(context, &mut self.grid, change);
        Ok(change)
    }

    /// The current grid.
    #[must_use]
    pub fn grid(&self) -> &SdfGrid {
        &self.grid
    }

    /// Show or hide the volume. Hidden volumes pass the opaque image
    /// through.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the volume is drawn.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Set the surface base color.
    pub fn set_base_color(&mut self, color: Vec3) {
        self.raymarcher.set_base_color(color);
    }

    /// Color + depth views of the opaque buffer for the host's mesh pass.
    #[must_use]
    pub fn opaque_views(&self) -> TargetViews<'_> {
        self.opaque.views()
    }

    /// The fixed-size volume buffer.
    #[must_use]
    pub fn volume_target(&self) -> &FrameTarget {
        &self.volume
    }

    /// Viewport size the opaque and transient buffers track.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reallocate the viewport-sized buffers. Zero sizes are ignored and the
    /// volume buffer keeps its size.
    pub fn resize(&mut self, context: &RenderContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;

        let device = &context.device;
        self.opaque =
            FrameTarget::new(device, "Opaque", width, height, self.format);
        self.transient =
            FrameTarget::new(device, "Transient", width, height, self.format);

        self.composite_inputs =
            self.composite
                .bind(device, self.opaque.views(), self.volume.views());
        self.transient_copy_inputs =
            self.copy.bind(device, self.transient.views());
        self.opaque_copy_inputs = self.copy.bind(device, self.opaque.views());

        log::debug!("volume render pass resized to {width}x{height}");
    }

    /// Encode one frame into `destination`.
    ///
    /// Uploads pending grid samples and the camera, then runs the
    /// [`FramePlan`] for the current visibility and destination.
    pub fn render(
        &mut self,
        context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        camera: &CameraState,
        box_to_world: Mat4,
        destination: Destination<TargetViews<'_>>,
    ) {
        let plan = FramePlan::new(self.visible, destination.aliases_opaque());
        if plan.steps().contains(&FrameStep::RaymarchVolume) {
            self.raymarcher.apply_grid(
                context,
                &mut self.grid,
                GridChange::default(),
            );
            self.raymarcher.prepare(&context.queue, camera, box_to_world);
        }

        let output = match destination {
            Destination::External(views) => views,
            Destination::Opaque => self.opaque.views(),
        };

        for step in plan.steps() {
            match *step {
                FrameStep::RaymarchVolume => {
                    self.raymarcher.render(
                        encoder,
                        &self.volume,
                        self.clear_color,
                    );
                }
                FrameStep::Composite { target } => {
                    let target_views = match target {
                        StepTarget::Destination => output,
                        StepTarget::Transient => self.transient.views(),
                    };
                    self.composite.render(
                        encoder,
                        &self.composite_inputs,
                        target_views,
                    );
                }
                FrameStep::Copy { source } => {
                    let inputs = match source {
                        CopySource::Transient => &self.transient_copy_inputs,
                        CopySource::Opaque => &self.opaque_copy_inputs,
                    };
                    self.copy.render(encoder, inputs, output);
                }
            }
        }
    }
}
