//! icoscene Web - WASM front-end
//!
//! The host page owns the frame loop: it calls `frame(t)` from its
//! `requestAnimationFrame` callback with the timestamp it receives, and
//! forwards pointer and wheel events. Frames are written as text into a
//! `<pre>` element.

use icoscene_core::raster::CELL_ASPECT;
use icoscene_core::{
    Error, FrameDriver, HeadlessSink, OutputSink, Result, SceneConfig, SceneContext, Surface,
};
use std::sync::OnceLock;
use wasm_bindgen::prelude::*;

static LOGGING: OnceLock<()> = OnceLock::new();

/// Route panics and `tracing` events to the browser console, once per module.
fn init_logging_once() {
    LOGGING.get_or_init(|| {
        #[cfg(target_arch = "wasm32")]
        {
            console_error_panic_hook::set_once();
            tracing_wasm::set_as_global_default();
        }
    });
}

#[wasm_bindgen(start)]
pub fn start() {
    init_logging_once();
}

/// Output sink writing the surface into a DOM element's text
struct ElementSink {
    element: web_sys::Element,
}

impl OutputSink for ElementSink {
    fn present(&mut self, surface: &Surface) -> Result<()> {
        self.element.set_text_content(Some(&surface.to_text()));
        Ok(())
    }
}

#[wasm_bindgen]
pub struct WebScene {
    ctx: SceneContext,
    driver: FrameDriver,
    element: Option<web_sys::Element>,
}

impl WebScene {
    fn detached(config: &SceneConfig, cols: usize, rows: usize) -> Result<WebScene> {
        Ok(WebScene {
            ctx: SceneContext::from_config(config, cols, rows)?,
            driver: FrameDriver::new(config.rotation_speed),
            element: None,
        })
    }

    fn step(&mut self, t: f64) -> Result<()> {
        match self.element.clone() {
            Some(element) => {
                let mut sink = ElementSink { element };
                self.driver.step(t, &mut self.ctx, &mut sink)?;
            }
            None => {
                let mut sink = HeadlessSink::default();
                self.driver.step(t, &mut self.ctx, &mut sink)?;
            }
        }
        Ok(())
    }

    fn drag_height(&self) -> f32 {
        self.ctx.surface.height() as f32 * CELL_ASPECT
    }
}

#[wasm_bindgen]
impl WebScene {
    /// Render into the element with id `element_id`, `cols` x `rows` cells.
    #[wasm_bindgen(constructor)]
    pub fn new(element_id: &str, cols: usize, rows: usize) -> std::result::Result<WebScene, JsValue> {
        Self::with_config(element_id, cols, rows, None)
    }

    /// Like `new`, with a JSON scene config.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(
        element_id: &str,
        cols: usize,
        rows: usize,
        config_json: Option<String>,
    ) -> std::result::Result<WebScene, JsValue> {
        init_logging_once();
        let config = match config_json {
            Some(text) => SceneConfig::from_json(&text).map_err(to_js)?,
            None => SceneConfig::default(),
        };
        let element = find_element(element_id).map_err(to_js)?;
        let mut scene = Self::detached(&config, cols, rows).map_err(to_js)?;
        scene.element = Some(element);
        tracing::info!(element_id, cols, rows, "web scene attached");
        Ok(scene)
    }

    /// One frame at `t` milliseconds, as passed to `requestAnimationFrame` callbacks.
    pub fn frame(&mut self, t: f64) -> std::result::Result<(), JsValue> {
        self.step(t).map_err(to_js)
    }

    #[wasm_bindgen(js_name = pointerDrag)]
    pub fn pointer_drag(&mut self, dx: f32, dy: f32) {
        let height = self.drag_height();
        self.ctx.controls.pointer_drag(dx, dy * CELL_ASPECT, height);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        let height = self.drag_height();
        self.ctx
            .controls
            .pan(dx, dy * CELL_ASPECT, &self.ctx.camera, height);
    }

    /// Wheel notches, negative zooms in.
    pub fn wheel(&mut self, delta: f32) {
        self.ctx.controls.wheel(delta);
    }

    #[wasm_bindgen(js_name = setDamping)]
    pub fn set_damping(&mut self, enabled: bool, factor: f32) {
        self.ctx.controls.set_damping(enabled, factor);
    }

    pub fn resize(&mut self, cols: usize, rows: usize) -> std::result::Result<(), JsValue> {
        self.ctx.resize(cols, rows).map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> u64 {
        self.driver.frames()
    }
}

fn find_element(id: &str) -> Result<web_sys::Element> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
        .ok_or_else(|| Error::Surface(format!("no element with id {id:?}")))
}

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}
