//! Pointer input tracking for the camera controller and picking.
//!
//! Collects winit window events into per-frame state: mouse buttons,
//! cursor position and delta, wheel delta, and the shift modifier. Call
//! [`Input::begin_frame`] after each frame to reset the per-frame sets.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

/// Tracks pointer state across window events.
#[derive(Default)]
pub struct Input {
    buttons_down: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    position: Vec2,
    delta: Vec2,
    scroll: Vec2,
    shift: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state. Held buttons and the cursor position persist.
    pub fn begin_frame(&mut self) {
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
    }

    /// Fold a window event into the tracked state. Events the controller
    /// does not consume are ignored.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if !self.buttons_down.contains(button) {
                        self.buttons_pressed.insert(*button);
                    }
                    self.buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_down.remove(button);
                    self.buttons_released.insert(*button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let new_position = Vec2::new(position.x as f32, position.y as f32);
                self.delta += new_position - self.position;
                self.position = new_position;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    winit::event::MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                // Each event contributes at most one step per axis; a frame
                // with several events still accumulates each of them.
                self.scroll += d.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
            }
            _ => {}
        }
    }

    /// Returns true while the button is held.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Returns true if the button went down this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Returns true if the button went up this frame.
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Cursor position in logical window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.position
    }

    /// Cursor movement accumulated this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.delta
    }

    /// Wheel delta accumulated this frame, in steps clamped to one per
    /// event.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll
    }

    /// Whether shift is currently held.
    pub fn shift_down(&self) -> bool {
        self.shift
    }
}

#[cfg(test)]
impl Input {
    pub(crate) fn press(&mut self, button: MouseButton) {
        if !self.buttons_down.contains(&button) {
            self.buttons_pressed.insert(button);
        }
        self.buttons_down.insert(button);
    }

    pub(crate) fn release(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
        self.buttons_released.insert(button);
    }

    pub(crate) fn move_to(&mut self, x: f32, y: f32) {
        let new_position = Vec2::new(x, y);
        self.delta += new_position - self.position;
        self.position = new_position;
    }

    pub(crate) fn wheel(&mut self, lines: f32) {
        self.scroll += Vec2::new(0.0, lines.clamp(-1.0, 1.0));
    }

    pub(crate) fn set_shift(&mut self, held: bool) {
        self.shift = held;
    }
}
