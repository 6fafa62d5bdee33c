//! Per-frame update and draw loop.

use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SceneConfig;
use crate::controls::OrbitControls;
use crate::error::Result;
use crate::projection::Camera;
use crate::raster::{DrawStats, OutputSink, Surface};
use crate::scene::Scene;

/// Everything a frame reads or mutates, owned in one place
pub struct SceneContext {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub surface: Surface,
}

impl SceneContext {
    /// Build the default scene, camera and controls for a `width` x `height` surface.
    pub fn from_config(config: &SceneConfig, width: usize, height: usize) -> Result<Self> {
        config.validate()?;
        let surface = Surface::new(width, height, config.antialias)?;
        let scene = Scene::icosahedron(config)?;
        let camera = Camera::from_config(config, surface.aspect());
        let mut controls = OrbitControls::new(&camera);
        controls.set_damping(config.enable_damping, config.damping_factor);

        Ok(Self {
            scene,
            camera,
            controls,
            surface,
        })
    }

    /// Resize the surface and keep the camera's aspect in step.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.surface.resize(width, height)?;
        self.camera.aspect = self.surface.aspect();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Running,
}

/// What happened during one `step`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    /// Absolute angle; the node stores it wrapped to `[0, 2π)`.
    pub angle: f64,
    pub camera_moved: bool,
    pub draw: DrawStats,
}

/// Y rotation for elapsed time `t`; absolute, not accumulated.
pub fn rotation_angle(t: f64, speed: f64) -> f64 {
    t * speed
}

/// Source of frame timing. Blocks until the next frame is due and returns
/// the elapsed-time sample for it, or `None` to stop the loop.
///
/// Input that arrived since the previous frame is applied to `ctx` here,
/// on the same thread as the frame itself.
pub trait FramePacer {
    fn next_frame(&mut self, ctx: &mut SceneContext) -> Result<Option<f64>>;
}

/// Advances the mesh rotation, integrates controls and draws, once per frame
#[derive(Debug)]
pub struct FrameDriver {
    rotation_speed: f64,
    state: FrameState,
    frames: u64,
}

impl FrameDriver {
    pub fn new(rotation_speed: f64) -> Self {
        Self {
            rotation_speed,
            state: FrameState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    /// One frame at elapsed time `t`: rotate, update controls, draw, present.
    pub fn step(
        &mut self,
        t: f64,
        ctx: &mut SceneContext,
        sink: &mut dyn OutputSink,
    ) -> Result<FrameStats> {
        if self.state == FrameState::Idle {
            tracing::debug!(rotation_speed = self.rotation_speed, "frame driver running");
            self.state = FrameState::Running;
        }

        let angle = rotation_angle(t, self.rotation_speed);
        // Wrapped to one turn so f32 keeps sub-frame resolution at large t
        ctx.scene.root.transform.rotation.y = angle.rem_euclid(TAU) as f32;

        let camera_moved = ctx.controls.update(&mut ctx.camera);

        let draw = ctx.surface.draw(&ctx.scene, &ctx.camera);
        sink.present(&ctx.surface)?;

        self.frames += 1;
        tracing::trace!(frame = self.frames, t, angle, camera_moved, "frame");

        Ok(FrameStats {
            frame: self.frames,
            angle,
            camera_moved,
            draw,
        })
    }

    /// Step once per frame handed out by `pacer` until it returns `None`.
    pub fn run<P>(
        &mut self,
        ctx: &mut SceneContext,
        pacer: &mut P,
        sink: &mut dyn OutputSink,
    ) -> Result<u64>
    where
        P: FramePacer + ?Sized,
    {
        let start = self.frames;
        while let Some(t) = pacer.next_frame(ctx)? {
            self.step(t, ctx, sink)?;
        }
        let rendered = self.frames - start;
        tracing::info!(frames = rendered, "frame loop stopped");
        Ok(rendered)
    }
}

/// Fixed-interval pacer. The first sample is 0, later ones are
/// milliseconds since the first call.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    start: Option<Instant>,
    deadline: Option<Instant>,
    remaining: Option<u64>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self::with_interval(Duration::from_secs(1) / fps.max(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            start: None,
            deadline: None,
            remaining: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next deadline and return the elapsed-time sample.
    pub fn tick(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let Some(start) = self.start else {
            let now = Instant::now();
            self.start = Some(now);
            self.deadline = Some(now + self.interval);
            return Some(0.0);
        };

        let now = Instant::now();
        let deadline = self.deadline.unwrap_or(now);
        if deadline > now {
            thread::sleep(deadline - now);
        }
        // A long frame delays the next one rather than bunching frames up.
        let now = Instant::now();
        self.deadline = Some(if deadline + self.interval < now {
            now + self.interval
        } else {
            deadline + self.interval
        });

        Some((now - start).as_secs_f64() * 1000.0)
    }
}

impl FramePacer for FrameClock {
    fn next_frame(&mut self, _ctx: &mut SceneContext) -> Result<Option<f64>> {
        Ok(self.tick())
    }
}
