//! Presents a rendered surface on a terminal

use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use icoscene_core::{OutputSink, Result, Surface};
use std::io::Write;
use std::time::Instant;

/// Frames-per-second estimate refreshed once a second
#[derive(Debug)]
pub struct FpsCounter {
    last_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            last_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn frame(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        let elapsed = now - self.last_sample;
        if elapsed.as_secs() >= 1 {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            self.frame_count = 0;
            self.last_sample = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Output sink writing cells as coloured characters
pub struct TerminalSink<W: Write> {
    writer: W,
    fps: FpsCounter,
    show_status: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            fps: FpsCounter::new(),
            show_status: true,
        }
    }

    pub fn without_status(mut self) -> Self {
        self.show_status = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn draw_status(&mut self) -> std::io::Result<()> {
        self.writer
            .queue(cursor::MoveTo(0, 0))?
            .queue(SetForegroundColor(Color::Yellow))?
            .queue(Print(format!(
                "icoscene | FPS: {:.1} | Drag=Orbit RightDrag=Pan Wheel/+-=Zoom Arrows=Orbit P=Damping Q=Quit",
                self.fps.fps()
            )))?
            .queue(ResetColor)?;
        Ok(())
    }
}

impl<W: Write> OutputSink for TerminalSink<W> {
    fn present(&mut self, surface: &Surface) -> Result<()> {
        self.fps.frame();

        let mut current = None;
        for (y, row) in surface.rows().enumerate() {
            // Raw mode does not return the carriage on '\n'
            self.writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                let color = terminal_color(cell.color);
                if cell.ch != ' ' && current != Some(color) {
                    self.writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                self.writer.queue(Print(cell.ch))?;
            }
        }
        self.writer.queue(ResetColor)?;

        if self.show_status {
            self.draw_status()?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

fn terminal_color(color: icoscene_core::Color) -> Color {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icoscene_core::{Camera, Scene, SceneConfig};

    fn drawn_surface() -> Surface {
        let config = SceneConfig::default();
        let mut surface = Surface::new(40, 12, false).unwrap();
        let scene = Scene::icosahedron(&config).unwrap();
        let camera = Camera::from_config(&config, surface.aspect());
        surface.draw(&scene, &camera);
        surface
    }

    #[test]
    fn test_present_writes_every_row() {
        let surface = drawn_surface();
        let mut sink = TerminalSink::new(Vec::new()).without_status();
        sink.present(&surface).unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();

        let printed: String = output.chars().filter(|c| "@%#*+=-:.|/\\".contains(*c)).collect();
        assert!(!printed.is_empty());
        assert!(!output.contains("FPS"));
    }

    #[test]
    fn test_status_line() {
        let surface = drawn_surface();
        let mut sink = TerminalSink::new(Vec::new());
        sink.present(&surface).unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("icoscene | FPS"));
    }

    #[test]
    fn test_colour_conversion_clamps() {
        let color = terminal_color(icoscene_core::Color::new(2.0, 0.5, -1.0));
        assert_eq!(color, Color::Rgb { r: 255, g: 128, b: 0 });
    }
}
