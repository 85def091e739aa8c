use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    demo,
    rendering::{wgpu_context::WgpuContext, RenderContext},
    scene::Scene,
    timer::FrameTimer,
};

struct App {
    config: AppConfig,
    context: Option<WgpuContext>,
    scene: Scene,
    timer: FrameTimer,
    mouse_pos: Vec2,
    error: Option<anyhow::Error>,
}

impl App {
    fn from_config(config: AppConfig) -> Self {
        Self {
            scene: Scene::new(config.clear_color),
            config,
            context: None,
            timer: FrameTimer::new(),
            mouse_pos: Vec2::ZERO,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(self.config.size);
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut context = pollster::block_on(WgpuContext::new(Arc::new(window), self.config.vsync))
            .context("Failed to create graphics context")?;
        context.set_projection(self.config.projection.matrix());

        demo::populate(&mut self.scene, &mut context, &self.config)
            .context("Failed to populate scene")?;

        context.window().request_redraw();
        self.context = Some(context);
        self.timer = FrameTimer::new();

        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:?}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() {
            return;
        }

        if let Err(error) = self.init(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                context.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.timer.mark();
                let result = self.scene.frame(context, dt);
                context.window().request_redraw();

                if let Err(error) = result {
                    self.fail(event_loop, anyhow::Error::new(error).context("Frame failed"));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);

                if let Some(title) = self.config.mouse_position_title(self.mouse_pos) {
                    context.window().set_title(&title);
                }
            }
            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Shared GPU resources go before the device does.
        self.scene.teardown();
        self.context = None;
    }
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::from_config(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
