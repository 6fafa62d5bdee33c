//! Maps terminal key, mouse and resize events onto the scene

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use icoscene_core::raster::CELL_ASPECT;
use icoscene_core::{Result, SceneContext};

/// Orbit step for one arrow key press, in radians
const KEY_ROTATE_STEP: f32 = 0.1;

/// Dolly factor for one `+` / `-` press
const KEY_ZOOM_STEP: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Orbit,
    Pan,
}

/// Pointer state carried between events
#[derive(Debug)]
pub struct InputState {
    running: bool,
    drag: Option<(DragMode, u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            running: true,
            drag: None,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn handle_event(&mut self, ctx: &mut SceneContext, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(ctx, key),
            Event::Mouse(mouse) => self.handle_mouse(ctx, mouse),
            Event::Resize(width, height) => {
                ctx.resize(width as usize, height as usize)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, ctx: &mut SceneContext, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let controls = &mut ctx.controls;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => controls.rotate_up(KEY_ROTATE_STEP),
            KeyCode::Char('s') | KeyCode::Down => controls.rotate_up(-KEY_ROTATE_STEP),
            KeyCode::Char('a') | KeyCode::Left => controls.rotate_left(KEY_ROTATE_STEP),
            KeyCode::Char('d') | KeyCode::Right => controls.rotate_left(-KEY_ROTATE_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => controls.dolly_in(KEY_ZOOM_STEP),
            KeyCode::Char('-') => controls.dolly_out(KEY_ZOOM_STEP),
            KeyCode::Char('p') => {
                let enabled = !controls.enable_damping;
                let factor = controls.damping_factor;
                controls.set_damping(enabled, factor);
            }
            _ => {}
        }
    }

    /// Rows count `CELL_ASPECT` times a column so drags feel the same in both directions.
    fn handle_mouse(&mut self, ctx: &mut SceneContext, mouse: MouseEvent) {
        let height = ctx.surface.height() as f32 * CELL_ASPECT;
        match mouse.kind {
            MouseEventKind::Down(button) => {
                let mode = match button {
                    MouseButton::Left => DragMode::Orbit,
                    MouseButton::Right | MouseButton::Middle => DragMode::Pan,
                };
                self.drag = Some((mode, mouse.column, mouse.row));
            }
            MouseEventKind::Drag(_) => {
                let Some((mode, column, row)) = self.drag else {
                    return;
                };
                let dx = mouse.column as f32 - column as f32;
                let dy = (mouse.row as f32 - row as f32) * CELL_ASPECT;
                match mode {
                    DragMode::Orbit => ctx.controls.pointer_drag(dx, dy, height),
                    DragMode::Pan => ctx.controls.pan(dx, dy, &ctx.camera, height),
                }
                self.drag = Some((mode, mouse.column, mouse.row));
            }
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::ScrollUp => ctx.controls.wheel(-1.0),
            MouseEventKind::ScrollDown => ctx.controls.wheel(1.0),
            _ => {}
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
