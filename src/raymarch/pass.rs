use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::camera::CameraState;
use crate::error::SdfViewError;
use crate::gpu::pipeline_helpers::{self, begin_color_depth_pass};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{
    raymarch_defs, ShaderComposer, VOLUME_RAYMARCH,
};
use crate::gpu::texture::{FrameTarget, DEPTH_FORMAT};
use crate::options::RaymarchOptions;
use crate::volume::bounds::BoxMesh;
use crate::volume::texture::VolumeTexture;
use crate::volume::{GridChange, SdfGrid};

/// Uniforms of `volume_raymarch.wgsl`. Matrices are column-major.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumeUniforms {
    /// OpenGL-convention projection.
    pub clip_from_view: [[f32; 4]; 4],
    /// Box model space to view space.
    pub view_from_model: [[f32; 4]; 4],
    /// View space to box model space.
    pub view_to_model: [[f32; 4]; 4],
    /// Physical box extents.
    pub volume_size: [f32; 3],
    /// 0 = perspective, 1 = orthographic.
    pub projection_kind: u32,
    /// Surface base color.
    pub base_color: [f32; 3],
    /// Narrow-band width factor.
    pub band_width_factor: f32,
    /// Hit tolerance factor.
    pub tolerance_factor: f32,
    /// Padding to a 16-byte multiple.
    pub(crate) _pad: [f32; 3],
}

impl VolumeUniforms {
    fn new(volume_size: Vec3, base_color: Vec3, options: &RaymarchOptions) -> Self {
        Self {
            clip_from_view: Mat4::IDENTITY.to_cols_array_2d(),
            view_from_model: Mat4::IDENTITY.to_cols_array_2d(),
            view_to_model: Mat4::IDENTITY.to_cols_array_2d(),
            volume_size: volume_size.to_array(),
            projection_kind: 0,
            base_color: base_color.to_array(),
            band_width_factor: options.band_width_factor,
            tolerance_factor: options.tolerance_factor,
            _pad: [0.0; 3],
        }
    }

    /// Refresh the camera-dependent fields.
    pub fn set_camera(&mut self, camera: &CameraState, box_to_world: Mat4) {
        self.clip_from_view = camera.clip_from_view.to_cols_array_2d();
        self.view_from_model =
            camera.model_to_view(box_to_world).to_cols_array_2d();
        self.view_to_model =
            camera.view_to_model(box_to_world).to_cols_array_2d();
        self.projection_kind = camera.projection.as_uniform();
    }
}

/// Draws the bounding box's back faces and sphere-traces the SDF per
/// fragment into a color + depth target.
pub struct VolumeRaymarcher {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniforms: VolumeUniforms,
    uniform_buffer: wgpu::Buffer,
    volume: VolumeTexture,
    mesh: BoxMesh,
}

impl VolumeRaymarcher {
    /// Build the pipeline, upload `grid`, and create its box mesh.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::ShaderCompose`] if the raymarch shader fails
    /// to compose.
    pub fn new(
        context: &RenderContext,
        shader_composer: &mut ShaderComposer,
        grid: &mut SdfGrid,
        base_color: Vec3,
        options: &RaymarchOptions,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, SdfViewError> {
        let device = &context.device;

        let uniforms = VolumeUniforms::new(grid.size(), base_color, options);
        let uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Volume Uniform Buffer"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let volume = VolumeTexture::new(device, &context.queue, grid);
        let mesh = BoxMesh::new(device, grid.size());

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Volume Bind Group Layout"),
                entries: &[
                    pipeline_helpers::uniform_buffer(0),
                    pipeline_helpers::texture_3d(1),
                    pipeline_helpers::filtering_sampler(2),
                ],
            });
        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &uniform_buffer,
            &volume,
        );

        let shader = shader_composer.compose(
            device,
            "Volume Raymarch Shader",
            VOLUME_RAYMARCH,
            raymarch_defs(options.max_steps),
        )?;
        let pipeline = Self::create_pipeline(
            device,
            &shader,
            &bind_group_layout,
            target_format,
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            uniforms,
            uniform_buffer,
            volume,
            mesh,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        volume: &VolumeTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Volume Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&volume.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&volume.sampler),
                },
            ],
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Volume Raymarch Pipeline Layout"),
                bind_group_layouts: &[bind_group_layout],
                push_constant_ranges: &[],
            });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Volume Raymarch Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[BoxMesh::vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Back faces only: fragments exist even with the eye inside
            // the box, and each one bounds its ray.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Bring the GPU copy in line with `grid` after an update.
    ///
    /// A reallocated grid gets a new texture and bind group; a resized one
    /// a new box mesh and `volume_size`; otherwise the samples are
    /// re-uploaded in place.
    pub fn apply_grid(
        &mut self,
        context: &RenderContext,
        grid: &mut SdfGrid,
        change: GridChange,
    ) {
        if change.reallocated {
            self.volume =
                VolumeTexture::new(&context.device, &context.queue, grid);
            self.bind_group = Self::create_bind_group(
                &context.device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.volume,
            );
        } else {
            self.volume.upload(&context.queue, grid);
        }

        if change.resized {
            self.mesh = BoxMesh::new(&context.device, grid.size());
            self.uniforms.volume_size = grid.size().to_array();
        }
    }

    /// Set the surface base color.
    pub fn set_base_color(&mut self, color: Vec3) {
        self.uniforms.base_color = color.to_array();
    }

    /// Write the camera for this frame.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        camera: &CameraState,
        box_to_world: Mat4,
    ) {
        self.uniforms.set_camera(camera, box_to_world);
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );
    }

    /// Clear `target` to `clear_color` at far depth, then raymarch into it.
    /// Missed pixels keep the clear values.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &FrameTarget,
        clear_color: wgpu::Color,
    ) {
        let mut pass = begin_color_depth_pass(
            encoder,
            "Volume Raymarch Pass",
            &target.color_view,
            &target.depth_view,
            Some((clear_color, 1.0)),
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(
            self.mesh.index_buffer.slice(..),
            wgpu::IndexFormat::Uint16,
        );
        pass.draw_indexed(0..self.mesh.index_count(), 0, 0..1);
    }

    /// Current uniform block.
    #[must_use]
    pub fn uniforms(&self) -> &VolumeUniforms {
        &self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ProjectionKind;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // Three mat4 (192) + two vec3/scalar rows (32) + tolerance row (16).
        assert_eq!(size_of::<VolumeUniforms>(), 240);
        assert_eq!(size_of::<VolumeUniforms>() % 16, 0);
    }

    #[test]
    fn camera_fields_follow_state() {
        let mut uniforms = VolumeUniforms::new(
            Vec3::splat(2.0),
            Vec3::ONE,
            &RaymarchOptions::default(),
        );
        let box_to_world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let camera = CameraState {
            projection: ProjectionKind::Orthographic,
            view_to_world: Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            clip_from_view: Mat4::orthographic_rh_gl(
                -1.0, 1.0, -1.0, 1.0, 0.1, 10.0,
            ),
        };
        uniforms.set_camera(&camera, box_to_world);

        assert_eq!(uniforms.projection_kind, 1);
        let view_from_model = Mat4::from_cols_array_2d(&uniforms.view_from_model);
        let view_to_model = Mat4::from_cols_array_2d(&uniforms.view_to_model);
        assert!((view_from_model * view_to_model).abs_diff_eq(Mat4::IDENTITY, 1e-6));
        // Box center sits 2 below the eye's z and offset in x/y.
        let center = view_from_model.transform_point3(Vec3::ZERO);
        assert!(center.abs_diff_eq(Vec3::new(1.0, 2.0, -2.0), 1e-6));
    }
}
