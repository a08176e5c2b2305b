//! The demo set. Each demo owns its GPU resources and builds them in `on_init`.

mod circles;
mod compute_circles;
mod gradient;
mod shapes;
mod triangle;

use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::GalleryError;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::config::{DemoConfig, DemoKind};

pub use circles::CirclesDemo;
pub use compute_circles::ComputeCirclesDemo;
pub use gradient::GradientDemo;
pub use shapes::ShapesDemo;
pub use triangle::TriangleDemo;

/// Circle radius in normalized device coordinates.
pub const CIRCLE_RADIUS: f32 = 0.025;

/// The selected demo behind one `App`; Escape closes the window.
pub struct Gallery {
    kind: DemoKind,
    demo: Box<dyn App>,
}

impl Gallery {
    pub fn new(kind: DemoKind, config: &DemoConfig) -> Self {
        let demo: Box<dyn App> = match kind {
            DemoKind::Triangle => Box::new(TriangleDemo::new(config.shader_dir.join("triangle.wgsl"))),
            DemoKind::Gradient => Box::new(GradientDemo::new(config.shader_dir.join("gradient.wgsl"))),
            DemoKind::Circles => Box::new(CirclesDemo::new(config.count)),
            DemoKind::ComputeCircles => Box::new(ComputeCirclesDemo::new(config.count)),
            DemoKind::Shapes => Box::new(ShapesDemo::new(config.count)),
        };
        Self { kind, demo }
    }

    pub fn title(&self) -> String {
        format!("gallery: {}", self.kind.name())
    }
}

impl App for Gallery {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        log::info!("starting {} demo", self.kind.name());
        self.demo.on_init(ctx)
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event: key, .. } = event {
            if key.state == ElementState::Pressed
                && key.physical_key == PhysicalKey::Code(KeyCode::Escape)
            {
                return AppControl::Exit;
            }
        }
        self.demo.on_window_event(window_id, event)
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.demo.on_frame(ctx)
    }
}
