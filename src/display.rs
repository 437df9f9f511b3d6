//! Interactive `winit`/`pixels` window, enabled by the `display` feature.
//!
//! Runs the CPU continuously, advancing exactly one NES frame's worth of
//! emulation per redraw rather than trying to pace cycles against wall-clock
//! time; `winit`'s `ControlFlow::Poll` keeps redraws coming as fast as the
//! host can present them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::bus::Bus;
use crate::cpu::Cpu6502;
use crate::joypad::Button;
use crate::ppu::{BYTES_PER_PIXEL, NES_HEIGHT, NES_WIDTH};

const SCALE: u32 = 3;

fn map_key(key: KeyCode) -> Option<Button> {
    match key {
        KeyCode::KeyZ => Some(Button::A),
        KeyCode::KeyX => Some(Button::B),
        KeyCode::ShiftRight | KeyCode::ShiftLeft => Some(Button::Select),
        KeyCode::Enter => Some(Button::Start),
        KeyCode::ArrowUp => Some(Button::Up),
        KeyCode::ArrowDown => Some(Button::Down),
        KeyCode::ArrowLeft => Some(Button::Left),
        KeyCode::ArrowRight => Some(Button::Right),
        _ => None,
    }
}

struct EmuApp {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    cpu: Cpu6502,
    bus: Bus,
    frame_ready: Rc<Cell<bool>>,
    framebuffer: Rc<RefCell<Vec<u8>>>,
}

impl EmuApp {
    fn new(mut cpu: Cpu6502, mut bus: Bus) -> Self {
        let frame_ready = Rc::new(Cell::new(false));
        let framebuffer = Rc::new(RefCell::new(vec![
            0u8;
            NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL
        ]));

        let ready = frame_ready.clone();
        let fb = framebuffer.clone();
        bus.set_frame_callback(move |ppu, _joypad| {
            fb.borrow_mut().copy_from_slice(ppu.framebuffer());
            ready.set(true);
        });

        cpu.reset(&mut bus);

        Self {
            window: None,
            pixels: None,
            cpu,
            bus,
            frame_ready,
            framebuffer,
        }
    }

    /// Run the CPU until the bus reports a completed frame.
    fn run_one_frame(&mut self) {
        self.frame_ready.set(false);
        while !self.frame_ready.get() {
            if self.cpu.step(&mut self.bus).is_err() {
                self.frame_ready.set(true);
                break;
            }
        }
    }

    fn render(&mut self) {
        if let Some(pixels) = &mut self.pixels {
            pixels.frame_mut().copy_from_slice(&self.framebuffer.borrow());
            if let Err(err) = pixels.render() {
                log::error!("pixels render failed: {err}");
            }
        }
    }
}

impl ApplicationHandler for EmuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("oxines")
            .with_inner_size(LogicalSize::new(
                (NES_WIDTH as u32) * SCALE,
                (NES_HEIGHT as u32) * SCALE,
            ))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels = Pixels::new(NES_WIDTH as u32, NES_HEIGHT as u32, surface_texture)
            .expect("failed to create pixel buffer");

        self.window = Some(window);
        self.pixels = Some(pixels);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(button) = map_key(code) {
                    self.bus
                        .joypad
                        .set_button(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                self.run_one_frame();
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open a window and run `cpu`/`bus` interactively until the window closes.
pub fn run(cpu: Cpu6502, bus: Bus) {
    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = EmuApp::new(cpu, bus);
    event_loop.run_app(&mut app).expect("event loop exited with an error");
}
