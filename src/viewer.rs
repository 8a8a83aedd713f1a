//! Standalone window that raymarches one SDF grid over a cleared opaque
//! buffer.
//!
//! ```no_run
//! # use sdfview::viewer::Viewer;
//! # use sdfview::volume::SdfGrid;
//! # use glam::{UVec3, Vec3};
//! let grid = SdfGrid::from_distance_fn(
//!     UVec3::splat(64),
//!     Vec3::splat(2.0),
//!     0.05,
//!     |p| p.length() - 0.8,
//! )
//! .unwrap();
//! Viewer::builder().with_grid(grid).build().run().unwrap();
//! ```
//!
//! `P` toggles between perspective and orthographic projection, `V` toggles
//! the volume.

use std::{sync::Arc, time::Duration};

use glam::{Mat4, Vec3};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    camera::Camera,
    error::SdfViewError,
    frame::{Destination, VolumeRenderPass},
    gpu::{
        pipeline_helpers::begin_color_depth_pass,
        render_context::RenderContext,
        shader_composer::ShaderComposer,
        texture::{create_depth_texture, TargetViews},
    },
    options::Options,
    util::frame_timing::FrameTiming,
    volume::SdfGrid,
};

/// Distance from the box center to the eye, in box diagonals.
const EYE_DISTANCE: f32 = 1.6;

// ── Builder ─────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    grid: Option<SdfGrid>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            grid: None,
            options: None,
            title: "sdfview".into(),
        }
    }

    /// Set the grid to display.
    #[must_use]
    pub fn with_grid(mut self, grid: SdfGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            grid: self.grid,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ──────────────────────────────────────────────────────────────

/// A window showing one SDF volume composited over an empty opaque scene.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run).
pub struct Viewer {
    grid: Option<SdfGrid>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`SdfViewError::Viewer`] if no grid was given, the event loop
    /// fails, or the GPU state cannot be created.
    pub fn run(self) -> Result<(), SdfViewError> {
        let grid = self
            .grid
            .ok_or_else(|| SdfViewError::Viewer("no grid to display".into()))?;
        let event_loop =
            EventLoop::new().map_err(|e| SdfViewError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            pending: Some(grid),
            options: self.options,
            title: self.title,
            state: None,
            failure: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| SdfViewError::Viewer(e.to_string()))?;
        app.failure.map_or(Ok(()), Err)
    }
}

// ── Winit app ───────────────────────────────────────────────────────────

/// GPU state created once the window exists.
struct ViewerState {
    window: Arc<Window>,
    context: RenderContext,
    pass: VolumeRenderPass,
    camera: Camera,
    display_depth: wgpu::TextureView,
    opaque_clear: wgpu::Color,
    timing: FrameTiming,
}

struct ViewerApp {
    /// Grid waiting for the window; taken in `resumed`.
    pending: Option<SdfGrid>,
    options: Options,
    title: String,
    state: Option<ViewerState>,
    failure: Option<SdfViewError>,
}

/// Surface size for a window, never zero.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

/// Eye position looking at the box center from the front, slightly above.
fn initial_eye(size: Vec3) -> Vec3 {
    let reach = size.length() * EYE_DISTANCE;
    Vec3::new(0.0, -reach, reach * 0.35)
}

impl ViewerState {
    fn new(
        window: Arc<Window>,
        grid: SdfGrid,
        options: &Options,
    ) -> Result<Self, SdfViewError> {
        let (width, height) = viewport_size(window.inner_size());
        let context = pollster::block_on(RenderContext::new(
            window.clone(),
            (width, height),
        ))?;
        let mut composer = ShaderComposer::new()?;

        let camera = Camera::new(
            initial_eye(grid.size()),
            Vec3::ZERO,
            width as f32 / height as f32,
            &options.camera,
        );
        let pass = VolumeRenderPass::new(&context, &mut composer, grid, options)?;
        let display_depth =
            create_depth_texture(&context.device, "Display depth", width, height);

        let [r, g, b, a] = options.volume.clear_color.map(f64::from);
        Ok(Self {
            window,
            context,
            pass,
            camera,
            display_depth,
            opaque_clear: wgpu::Color { r, g, b, a },
            timing: FrameTiming::new(Duration::from_secs(2)),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.pass.resize(&self.context, width, height);
        self.camera.resize(width, height);
        self.display_depth = create_depth_texture(
            &self.context.device,
            "Display depth",
            width,
            height,
        );
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder();

        // No host geometry: the opaque pass is just a clear. It uses the
        // volume clear color so far-plane ties look the same either way.
        {
            let opaque = self.pass.opaque_views();
            let _clear = begin_color_depth_pass(
                &mut encoder,
                "Opaque clear",
                opaque.color,
                opaque.depth,
                Some((self.opaque_clear, 1.0)),
            );
        }

        self.pass.render(
            &self.context,
            &mut encoder,
            &self.camera.state(),
            Mat4::IDENTITY,
            Destination::External(TargetViews {
                color: &view,
                depth: &self.display_depth,
            }),
        );
        self.context.submit(encoder);
        frame.present();

        self.timing.end_frame();
        if let Some(fps) = self.timing.take_report() {
            log::info!("{fps:.1} fps");
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::KeyP => {
                self.camera.projection = self.camera.projection.toggled();
                log::info!("projection: {:?}", self.camera.projection);
            }
            KeyCode::KeyV => {
                let visible = !self.pass.visible();
                self.pass.set_visible(visible);
                log::info!("volume visible: {visible}");
            }
            _ => return,
        }
        self.window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(grid) = self.pending.take() else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                self.failure = Some(SdfViewError::Viewer(e.to_string()));
                event_loop.exit();
                return;
            }
        };

        match ViewerState::new(window.clone(), grid, &self.options) {
            Ok(state) => {
                window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {e}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::Resized(event_size) => {
                let (w, h) = viewport_size(event_size);
                state.resize(w, h);
            }

            WindowEvent::RedrawRequested => {
                match state.render() {
                    Ok(()) => {}
                    Err(
                        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost,
                    ) => {
                        let (w, h) = viewport_size(state.window.inner_size());
                        state.resize(w, h);
                    }
                    Err(e) => {
                        log::error!("render error: {e:?}");
                    }
                }
                state.window.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    state.handle_key(code);
                }
            }

            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_sits_in_front_and_above() {
        let eye = initial_eye(Vec3::splat(2.0));
        assert!(eye.y < 0.0);
        assert!(eye.z > 0.0);
        assert!(eye.length() > Vec3::splat(2.0).length());
    }

    #[test]
    fn viewport_never_zero() {
        let size = winit::dpi::PhysicalSize::new(0, 10);
        assert_eq!(viewport_size(size), (1, 10));
    }
}
