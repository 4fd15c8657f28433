use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::trace;
use pollster::FutureExt as _;
use winit::{
    dpi::LogicalSize,
    event::{DeviceEvent, ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod app;
mod assets;
mod entity;
mod orbit;
mod renderer;
mod settings;
mod simulation;
mod window;

use app::App;
use settings::Settings;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::parse();

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title("Snow Globe")
        .with_inner_size(LogicalSize::<u32> {
            width: settings.window.width,
            height: settings.window.height,
        })
        .build(&event_loop)
        .context("Failed to build window")?;

    let mut last_render_inst = Instant::now();

    let mut app = App::new(window, settings).block_on()?;

    event_loop.run(move |e, _, control_flow| {
        trace!("{:?}", e);

        match e {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => app.on_resize(size),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    app.on_resize(*new_inner_size)
                }
                WindowEvent::MouseInput { state, button, .. } => app.on_mouse_button(button, state),
                WindowEvent::MouseWheel { delta, .. } => app.on_mouse_scroll(delta),
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Released,
                            virtual_keycode: Some(VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => *control_flow = ControlFlow::Exit,
                _ => (),
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => app.on_mouse_move(delta),
            Event::MainEventsCleared => {
                let target_frame_interval = Duration::from_secs_f64(1.0 / 60.0);
                let elapsed_from_last_draw = last_render_inst.elapsed();
                if target_frame_interval > elapsed_from_last_draw {
                    let wait = target_frame_interval - elapsed_from_last_draw;
                    *control_flow = ControlFlow::WaitUntil(Instant::now() + wait);
                    return;
                }

                app.render();

                last_render_inst = Instant::now();
            }
            _ => (),
        }
    });
}
