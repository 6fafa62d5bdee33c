//! Terminal front-end: runs the icoscene frame loop in a terminal

use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute, terminal,
};
use icoscene_core::{
    FrameClock, FrameDriver, FramePacer, HeadlessSink, Result, SceneConfig, SceneContext,
};
use std::io::{self, stdout};
use std::time::Duration;

pub mod input;
pub mod renderer;

pub use input::InputState;
pub use renderer::TerminalSink;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    ctx: SceneContext,
    driver: FrameDriver,
    fps: u32,
}

impl TerminalApp {
    /// Size the scene to the current terminal.
    pub fn new(config: &SceneConfig) -> Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(config, width as usize, height as usize)
    }

    pub fn with_size(config: &SceneConfig, width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            ctx: SceneContext::from_config(config, width, height)?,
            driver: FrameDriver::new(config.rotation_speed),
            fps: config.fps,
        })
    }

    pub fn context(&self) -> &SceneContext {
        &self.ctx
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        let restored = restore_terminal();
        result?;
        restored?;
        Ok(())
    }

    fn main_loop(&mut self) -> Result<()> {
        let mut pacer = TerminalPacer {
            clock: FrameClock::new(self.fps),
            input: InputState::new(),
        };
        let mut sink = TerminalSink::new(io::BufWriter::new(stdout()));
        self.driver.run(&mut self.ctx, &mut pacer, &mut sink)?;
        Ok(())
    }

    /// Render `frames` frames without touching the terminal and return the
    /// text of the last one.
    pub fn render_headless(&mut self, frames: u64) -> Result<String> {
        let mut clock = FrameClock::new(self.fps).limit(frames);
        let mut sink = HeadlessSink::default();
        self.driver.run(&mut self.ctx, &mut clock, &mut sink)?;
        Ok(sink.last_frame)
    }
}

fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(
        stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show
    )?;
    Ok(())
}

/// Paces frames with a clock and applies terminal input between them
struct TerminalPacer {
    clock: FrameClock,
    input: InputState,
}

impl FramePacer for TerminalPacer {
    fn next_frame(&mut self, ctx: &mut SceneContext) -> Result<Option<f64>> {
        while event::poll(Duration::from_millis(0))? {
            let event = event::read()?;
            self.input.handle_event(ctx, event)?;
        }

        if !self.input.running() {
            return Ok(None);
        }
        Ok(self.clock.tick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_render() {
        let mut config = SceneConfig::default();
        config.fps = 1000;
        let mut app = TerminalApp::with_size(&config, 40, 12).unwrap();
        let text = app.render_headless(2).unwrap();

        assert_eq!(text.lines().count(), 12);
        assert!(text.chars().any(|c| c != ' ' && c != '\n'));
        assert_eq!(app.context().surface.width(), 40);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = SceneConfig::default();
        config.near = 20.0;
        assert!(TerminalApp::with_size(&config, 40, 12).is_err());
    }
}
