use glam::UVec3;

use super::grid::SdfGrid;
use crate::gpu::pipeline_helpers;

/// `R8Snorm` 3D texture holding the grid samples, plus its linear sampler.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    /// Full 3D view, bound to the raymarch pass.
    pub view: wgpu::TextureView,
    /// Trilinear clamp-to-edge sampler.
    pub sampler: wgpu::Sampler,
    resolution: UVec3,
}

impl VolumeTexture {
    /// Allocate a texture matching `grid` and upload its samples.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: &mut SdfGrid,
    ) -> Self {
        let resolution = grid.resolution();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SDF Volume"),
            size: extent(resolution),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R8Snorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler =
            pipeline_helpers::linear_sampler(device, "SDF Volume Sampler");

        let mut volume = Self {
            texture,
            view,
            sampler,
            resolution,
        };
        volume.upload(queue, grid);
        volume
    }

    /// Copy the grid samples if they changed since the last upload.
    ///
    /// The grid must have the resolution this texture was allocated with;
    /// a reallocated grid needs a new `VolumeTexture`.
    pub fn upload(&mut self, queue: &wgpu::Queue, grid: &mut SdfGrid) {
        if !grid.is_dirty() {
            return;
        }
        debug_assert_eq!(grid.resolution(), self.resolution);

        let res = self.resolution;
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(grid.samples()),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(res.x),
                rows_per_image: Some(res.y),
            },
            extent(res),
        );
        grid.mark_uploaded();
        log::debug!("uploaded SDF volume {}x{}x{}", res.x, res.y, res.z);
    }

    /// Samples per axis of the allocated texture.
    #[must_use]
    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }
}

fn extent(resolution: UVec3) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: resolution.x,
        height: resolution.y,
        depth_or_array_layers: resolution.z,
    }
}
