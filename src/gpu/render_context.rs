use std::fmt;

/// GPU setup failures.
#[derive(Debug)]
pub enum RenderContextError {
    /// The window handle could not back a wgpu surface.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter can present to the surface.
    AdapterRequest(wgpu::RequestAdapterError),
    /// The adapter refused the device request.
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter reports no configuration for the surface.
    UnsupportedSurface,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => write!(f, "cannot create surface: {e}"),
            Self::AdapterRequest(e) => write!(f, "no usable adapter: {e}"),
            Self::DeviceRequest(e) => write!(f, "cannot open device: {e}"),
            Self::UnsupportedSurface => {
                f.write_str("adapter cannot present to this surface")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedSurface => None,
        }
    }
}

/// Color format and pixel size shared by every viewport-sized target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Color format of the destination and the opaque/transient buffers.
    pub format: wgpu::TextureFormat,
    /// Width in pixels, never zero.
    pub width: u32,
    /// Height in pixels, never zero.
    pub height: u32,
}

impl Viewport {
    /// Viewport of at least 1x1 pixels.
    #[must_use]
    pub fn new(format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// The viewport at a new size, or `None` when a dimension is zero or
    /// nothing changes.
    #[must_use]
    pub fn resized(self, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if (width, height) == (self.width, self.height) {
            return None;
        }
        Some(Self {
            width,
            height,
            ..self
        })
    }
}

/// A configured window surface.
struct Presenter {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

/// Device, queue, and viewport, plus the window surface when the crate
/// owns one.
///
/// Hosts that already own a device use [`from_device`](Self::from_device)
/// and pass their own targets to the orchestrator as destinations.
pub struct RenderContext {
    /// The wgpu logical device.
    pub device: wgpu::Device,
    /// The wgpu command queue.
    pub queue: wgpu::Queue,
    viewport: Viewport,
    presenter: Option<Presenter>,
}

impl RenderContext {
    /// Open a device able to present to `window` and configure the surface
    /// at `initial_size` with vsync.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderContextError`] naming the step that failed.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        initial_size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;
        let info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdfview device"),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::DeviceRequest)?;

        let (width, height) = initial_size;
        let mut config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or(RenderContextError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);

        let viewport = Viewport::new(config.format, config.width, config.height);
        log::info!(
            "{} ({:?}): {:?} {}x{}",
            info.name,
            info.backend,
            viewport.format,
            viewport.width,
            viewport.height
        );

        Ok(Self {
            device,
            queue,
            viewport,
            presenter: Some(Presenter { surface, config }),
        })
    }

    /// Wrap a host-owned device. There is no surface; `viewport` describes
    /// the host's destination.
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        viewport: Viewport,
    ) -> Self {
        Self {
            device,
            queue,
            viewport,
            presenter: None,
        }
    }

    /// Viewport color format.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.viewport.format
    }

    /// Viewport size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    /// Follow a new viewport size, reconfiguring the surface if there is
    /// one. Zero and unchanged sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(viewport) = self.viewport.resized(width, height) else {
            return;
        };
        self.viewport = viewport;
        if let Some(presenter) = &mut self.presenter {
            presenter.config.width = width;
            presenter.config.height = height;
            presenter.surface.configure(&self.device, &presenter.config);
        }
    }

    /// Acquire the next swapchain image.
    ///
    /// # Errors
    ///
    /// Returns the surface's [`wgpu::SurfaceError`], or
    /// [`wgpu::SurfaceError::Lost`] for a context without a surface.
    pub fn get_next_frame(
        &self,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.presenter
            .as_ref()
            .map_or(Err(wgpu::SurfaceError::Lost), |p| {
                p.surface.get_current_texture()
            })
    }

    /// New encoder for one frame.
    #[must_use]
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdfview frame encoder"),
            })
    }

    /// Finish and submit `encoder`.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}
