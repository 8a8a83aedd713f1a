//! Color + depth render-target pairs.

/// Depth format of every target the renderer reads or writes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Borrowed color and depth views of one image.
#[derive(Clone, Copy)]
pub struct TargetViews<'a> {
    /// Color attachment.
    pub color: &'a wgpu::TextureView,
    /// Depth attachment.
    pub depth: &'a wgpu::TextureView,
}

/// An off-screen color + depth pair.
///
/// Both textures are created with `RENDER_ATTACHMENT | TEXTURE_BINDING`
/// usage so one pass can write the pair and a later pass can sample it.
pub struct FrameTarget {
    /// Color texture.
    pub color: wgpu::Texture,
    /// Full view of `color`.
    pub color_view: wgpu::TextureView,
    /// Depth texture ([`DEPTH_FORMAT`]).
    pub depth: wgpu::Texture,
    /// Full view of `depth`.
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl FrameTarget {
    /// Allocate a `width` x `height` pair with the given color format.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let color = create_texture(
            device,
            &format!("{label} Color"),
            width,
            height,
            format,
        );
        let depth = create_texture(
            device,
            &format!("{label} Depth"),
            width,
            height,
            DEPTH_FORMAT,
        );
        let color_view =
            color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view =
            depth.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            color,
            color_view,
            depth,
            depth_view,
            width,
            height,
        }
    }

    /// Views for attaching or binding the pair.
    #[must_use]
    pub fn views(&self) -> TargetViews<'_> {
        TargetViews {
            color: &self.color_view,
            depth: &self.depth_view,
        }
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Standalone depth texture for a destination that only brings a color
/// view (e.g. a swapchain image).
#[must_use]
pub fn create_depth_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    create_texture(device, label, width, height, DEPTH_FORMAT)
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}
