use super::screen_pass::ScreenPass;
use crate::error::SdfViewError;
use crate::gpu::pipeline_helpers::{
    self, create_screen_space_pipeline, depth_texture_2d, filtering_sampler,
    non_filtering_sampler, texture_2d,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, DEPTH_COMPOSITE};
use crate::gpu::texture::TargetViews;

/// Merges the opaque image (A) with the volume image (B) by depth. B wins
/// ties.
///
/// The volume image may be smaller than the destination; it is sampled at
/// the destination's normalized coordinates.
pub struct DepthCompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    color_sampler: wgpu::Sampler,
    depth_sampler: wgpu::Sampler,
}

impl DepthCompositePass {
    /// Build the pipeline for a destination of the given color format.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::ShaderCompose`] if the shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        shader_composer: &mut ShaderComposer,
        format: wgpu::TextureFormat,
    ) -> Result<Self, SdfViewError> {
        let device = &context.device;
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Depth Composite Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    depth_texture_2d(1),
                    texture_2d(2),
                    depth_texture_2d(3),
                    filtering_sampler(4),
                    non_filtering_sampler(5),
                ],
            });

        let shader = shader_composer.compose(
            device,
            "Depth Composite Shader",
            DEPTH_COMPOSITE,
            Default::default(),
        )?;
        let pipeline = create_screen_space_pipeline(
            device,
            "Depth Composite",
            &shader,
            format,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            color_sampler: pipeline_helpers::linear_sampler(
                device,
                "Depth Composite Color Sampler",
            ),
            depth_sampler: pipeline_helpers::nearest_sampler(
                device,
                "Depth Composite Depth Sampler",
            ),
        })
    }

    /// Bind an opaque image and a volume image as inputs.
    #[must_use]
    pub fn bind(
        &self,
        device: &wgpu::Device,
        opaque: TargetViews<'_>,
        volume: TargetViews<'_>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(opaque.color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(opaque.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(volume.color),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(volume.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(
                        &self.color_sampler,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(
                        &self.depth_sampler,
                    ),
                },
            ],
        })
    }
}

impl ScreenPass for DepthCompositePass {
    fn label(&self) -> &'static str {
        "Depth Composite Pass"
    }

    fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
