use crate::gpu::pipeline_helpers::begin_color_depth_pass;
use crate::gpu::texture::TargetViews;

/// Uniform interface for fullscreen passes that write a color + depth
/// destination from a bind group of inputs.
pub trait ScreenPass {
    /// Debug label of the render pass.
    fn label(&self) -> &'static str;

    /// Fullscreen pipeline with `vs_main` / `fs_main`.
    fn pipeline(&self) -> &wgpu::RenderPipeline;

    /// Encode one fullscreen draw into `output`.
    ///
    /// `inputs` must not reference the textures behind `output`.
    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &wgpu::BindGroup,
        output: TargetViews<'_>,
    ) {
        let mut pass = begin_color_depth_pass(
            encoder,
            self.label(),
            output.color,
            output.depth,
            Some((wgpu::Color::TRANSPARENT, 1.0)),
        );
        pass.set_pipeline(self.pipeline());
        pass.set_bind_group(0, inputs, &[]);
        pass.draw(0..3, 0..1);
    }
}
