//! Integration tests for the frame loop.

use std::time::Duration;

use icoscene_core::{
    FrameClock, FrameDriver, FramePacer, HeadlessSink, OutputSink, Result, SceneConfig,
    SceneContext, Surface,
};

/// Replays a fixed list of elapsed-time samples, dragging the pointer on the first.
struct ScriptedPacer {
    samples: Vec<f64>,
    next: usize,
}

impl FramePacer for ScriptedPacer {
    fn next_frame(&mut self, ctx: &mut SceneContext) -> Result<Option<f64>> {
        if self.next == 0 {
            let height = ctx.surface.height() as f32;
            ctx.controls.pointer_drag(3.0, 0.0, height);
        }
        let sample = self.samples.get(self.next).copied();
        self.next += 1;
        Ok(sample)
    }
}

/// Records the mesh's on-screen footprint per frame
#[derive(Default)]
struct FootprintSink {
    filled: Vec<usize>,
}

impl OutputSink for FootprintSink {
    fn present(&mut self, surface: &Surface) -> Result<()> {
        self.filled
            .push(surface.cells().iter().filter(|c| c.ch != ' ').count());
        Ok(())
    }
}

#[test]
fn test_scripted_frames_render_every_sample() {
    let config = SceneConfig::default();
    let mut ctx = SceneContext::from_config(&config, 60, 20).unwrap();
    let mut driver = FrameDriver::new(config.rotation_speed);
    let mut pacer = ScriptedPacer {
        samples: vec![0.0, 16.0, 33.0, 50.0, 10_000.0],
        next: 0,
    };
    let mut sink = FootprintSink::default();

    let frames = driver.run(&mut ctx, &mut pacer, &mut sink).unwrap();

    assert_eq!(frames, 5);
    assert_eq!(sink.filled.len(), 5);
    assert!(sink.filled.iter().all(|&n| n > 0));
    assert!((ctx.scene.root.transform.rotation.y - 1.0).abs() < 1e-6);
}

#[test]
fn test_damped_drag_keeps_moving_after_input() {
    let config = SceneConfig::default();
    let mut ctx = SceneContext::from_config(&config, 60, 20).unwrap();
    let mut driver = FrameDriver::new(config.rotation_speed);
    let mut pacer = ScriptedPacer {
        samples: vec![0.0, 16.0, 33.0],
        next: 0,
    };
    let mut sink = HeadlessSink::default();

    let start = ctx.camera.position;
    let mut positions = Vec::new();
    while let Some(t) = pacer.next_frame(&mut ctx).unwrap() {
        let stats = driver.step(t, &mut ctx, &mut sink).unwrap();
        assert!(stats.camera_moved);
        positions.push(ctx.camera.position);
    }

    assert_eq!(positions.len(), 3);
    assert!((positions[0] - start).norm() > 0.0);
    assert!((positions[2] - positions[1]).norm() > 0.0);
    assert!((ctx.camera.distance_to_target() - config.camera_distance).abs() < 1e-4);
}

#[test]
fn test_clock_paced_loop() {
    let config = SceneConfig::default();
    let mut ctx = SceneContext::from_config(&config, 30, 10).unwrap();
    let mut driver = FrameDriver::new(config.rotation_speed);
    let mut clock = FrameClock::with_interval(Duration::from_millis(1)).limit(3);
    let mut sink = HeadlessSink::default();

    assert_eq!(driver.run(&mut ctx, &mut clock, &mut sink).unwrap(), 3);
    assert_eq!(sink.last_frame.lines().count(), 10);
}
