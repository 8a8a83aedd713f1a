use super::screen_pass::ScreenPass;
use crate::error::SdfViewError;
use crate::gpu::pipeline_helpers::{
    self, create_screen_space_pipeline, depth_texture_2d, filtering_sampler,
    non_filtering_sampler, texture_2d,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, COPY};
use crate::gpu::texture::TargetViews;

/// Copies a color + depth image into a destination.
pub struct CopyPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    color_sampler: wgpu::Sampler,
    depth_sampler: wgpu::Sampler,
}

impl CopyPass {
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
                label: Some("Copy Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    depth_texture_2d(1),
                    filtering_sampler(2),
                    non_filtering_sampler(3),
                ],
            });

        let shader = shader_composer.compose(
            device,
            "Copy Shader",
            COPY,
            Default::default(),
        )?;
        let pipeline = create_screen_space_pipeline(
            device,
            "Copy",
            &shader,
            format,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            color_sampler: pipeline_helpers::nearest_sampler(
                device,
                "Copy Color Sampler",
            ),
            depth_sampler: pipeline_helpers::nearest_sampler(
                device,
                "Copy Depth Sampler",
            ),
        })
    }

    /// Bind `source` as the image to copy.
    #[must_use]
    pub fn bind(
        &self,
        device: &wgpu::Device,
        source: TargetViews<'_>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Copy Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(
                        &self.color_sampler,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(
                        &self.depth_sampler,
                    ),
                },
            ],
        })
    }
}

impl ScreenPass for CopyPass {
    fn label(&self) -> &'static str {
        "Copy Pass"
    }

    fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
