//! Browser bindings for the particle portrait.
//!
//! The host page owns a [`ParticlePortrait`] and forwards its events to it:
//! image load completion, scroll, resize, and the `requestAnimationFrame`
//! tick. Buffers are exposed as copies for hosts that bring their own
//! renderer; [`ParticlePortrait::attach_canvas`] draws through WebGL2
//! instead.

use log::{Level, LevelFilter, Log, Metadata, Record};
use portrait_core::scene::require_anchor;
use portrait_core::{
    PortraitConfig, PortraitError, PortraitScene, Raster, SectionBounds, TargetSource, Viewport,
};
use wasm_bindgen::prelude::*;

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Installs the console logger at `warn`. Safe to call more than once.
#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        });
    }
}

fn js_err(e: PortraitError) -> JsError {
    JsError::new(&e.to_string())
}

/// Parses host parameters; an empty string means all defaults.
fn parse_config(params_json: &str) -> Result<PortraitConfig, JsError> {
    let params: serde_json::Value = if params_json.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(params_json).map_err(|e| JsError::new(&e.to_string()))?
    };
    Ok(PortraitConfig::from_json(&params))
}

fn source_name(source: TargetSource) -> String {
    match source {
        TargetSource::Image => "image".into(),
        TargetSource::FallbackSphere => "fallback_sphere".into(),
    }
}

/// Anything with a resizable drawing buffer.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
trait DrawingSurface {
    fn set_buffer_size(&self, width: u32, height: u32);
}

impl DrawingSurface for web_sys::HtmlCanvasElement {
    fn set_buffer_size(&self, width: u32, height: u32) {
        self.set_width(width);
        self.set_height(height);
    }
}

/// Sizes `surface` to the viewport's drawing buffer (pixel ratio capped)
/// and returns that size for the GL viewport.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn fit_surface<S: DrawingSurface + ?Sized>(surface: &S, viewport: Viewport) -> (u32, u32) {
    let (w, h) = viewport.drawing_buffer_size();
    surface.set_buffer_size(w, h);
    (w, h)
}

/// GL state created by `attach_canvas`; the renderer appears once the
/// field exists.
#[cfg(target_arch = "wasm32")]
struct GlTarget {
    canvas: web_sys::HtmlCanvasElement,
    gl: glow::Context,
    renderer: Option<portrait_core::render::PointCloudRenderer>,
}

/// Handle owned by the host page.
#[wasm_bindgen]
pub struct ParticlePortrait {
    scene: PortraitScene,
    anchor: Option<web_sys::Element>,
    #[cfg(target_arch = "wasm32")]
    target: Option<GlTarget>,
}

#[wasm_bindgen]
impl ParticlePortrait {
    /// Creates a portrait for a `width x height` CSS-pixel surface.
    #[wasm_bindgen(constructor)]
    pub fn new(
        params_json: &str,
        width: f32,
        height: f32,
        pixel_ratio: f32,
    ) -> Result<ParticlePortrait, JsError> {
        let config = parse_config(params_json)?;
        let viewport = Viewport::new(width, height, pixel_ratio).map_err(js_err)?;
        let scene = PortraitScene::new(config, viewport).map_err(js_err)?;
        Ok(Self {
            scene,
            anchor: None,
            #[cfg(target_arch = "wasm32")]
            target: None,
        })
    }

    /// Looks up the reference section by CSS selector and sizes the
    /// portrait to the window. Fails without side effects when the page has
    /// no matching element.
    pub fn attach(selector: &str, params_json: &str) -> Result<ParticlePortrait, JsError> {
        let window = require_anchor(web_sys::window(), "window").map_err(js_err)?;
        let document = require_anchor(window.document(), "document").map_err(js_err)?;
        let found = document
            .query_selector(selector)
            .map_err(|_| JsError::new(&format!("invalid selector '{selector}'")))?;
        let anchor = require_anchor(found, selector).map_err(js_err)?;

        let width = window_dimension(window.inner_width());
        let height = window_dimension(window.inner_height());
        let ratio = window.device_pixel_ratio() as f32;
        let mut portrait = Self::new(params_json, width, height, ratio)?;
        portrait.anchor = Some(anchor);
        portrait.sync_scroll();
        Ok(portrait)
    }

    /// Reads the attached section's bounds and applies them as a scroll
    /// event. Does nothing for portraits created without `attach`.
    #[wasm_bindgen(js_name = "syncScroll")]
    pub fn sync_scroll(&mut self) -> Option<f32> {
        let anchor = self.anchor.as_ref()?;
        let window = web_sys::window()?;
        let rect = anchor.get_bounding_client_rect();
        let vh = window_dimension(window.inner_height());
        self.scene.on_scroll(
            SectionBounds::new(rect.top() as f32, rect.bottom() as f32),
            vh,
        )
    }

    /// Completes the image load with decoded RGBA8 pixels. Returns the
    /// target source that was used.
    #[wasm_bindgen(js_name = "loadRgba")]
    pub fn load_rgba(
        &mut self,
        rgba: &[u8],
        width: usize,
        height: usize,
    ) -> Result<String, JsError> {
        let raster = Raster::from_rgba(width, height, rgba.to_vec());
        self.scene.load_image(raster).map(source_name).map_err(js_err)
    }

    /// Completes the image load with a failure; the fallback sphere is used.
    #[wasm_bindgen(js_name = "loadFailed")]
    pub fn load_failed(&mut self, reason: &str) -> Result<String, JsError> {
        self.scene
            .load_image(Err(PortraitError::ImageLoad(reason.to_string())))
            .map(source_name)
            .map_err(js_err)
    }

    /// Scroll handler taking the section's bounding rect directly.
    #[wasm_bindgen(js_name = "onScroll")]
    pub fn on_scroll(&mut self, top: f32, bottom: f32, viewport_height: f32) -> Option<f32> {
        self.scene
            .on_scroll(SectionBounds::new(top, bottom), viewport_height)
    }

    /// Resize handler; degenerate sizes are ignored.
    #[wasm_bindgen(js_name = "onResize")]
    pub fn on_resize(&mut self, width: f32, height: f32, pixel_ratio: f32) -> bool {
        match Viewport::new(width, height, pixel_ratio) {
            Ok(viewport) => {
                self.scene.on_resize(viewport);
                #[cfg(target_arch = "wasm32")]
                self.resize_target();
                true
            }
            Err(e) => {
                log::warn!("ignoring resize to {width}x{height}: {e}");
                false
            }
        }
    }

    /// Per-frame tick. Returns `true` when the particle positions changed.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.scene.frame(now_ms)
    }

    pub fn progress(&self) -> f32 {
        self.scene.progress()
    }

    #[wasm_bindgen(js_name = "particleCount")]
    pub fn particle_count(&self) -> usize {
        self.scene.field().map_or(0, |f| f.len())
    }

    /// Current interleaved xyz positions.
    pub fn positions(&self) -> Vec<f32> {
        self.scene
            .field()
            .map(|f| f.positions().to_vec())
            .unwrap_or_default()
    }

    /// Interleaved rgb colors in [0, 1].
    pub fn colors(&self) -> Vec<f32> {
        self.scene
            .field()
            .map(|f| f.colors().to_vec())
            .unwrap_or_default()
    }

    pub fn sizes(&self) -> Vec<f32> {
        self.scene
            .field()
            .map(|f| f.sizes().to_vec())
            .unwrap_or_default()
    }

    /// Clears and returns the "positions changed" flag.
    #[wasm_bindgen(js_name = "takeDirty")]
    pub fn take_dirty(&mut self) -> bool {
        self.scene.field_mut().is_some_and(|f| f.take_dirty())
    }

    /// Cloud rotation as `[x, y, z]` Euler angles in radians.
    pub fn rotation(&self) -> Vec<f32> {
        self.scene
            .field()
            .map(|f| f.rotation().to_array().to_vec())
            .unwrap_or_else(|| vec![0.0; 3])
    }

    /// Column-major model matrix.
    #[wasm_bindgen(js_name = "modelMatrix")]
    pub fn model_matrix(&self) -> Vec<f32> {
        self.scene
            .field()
            .map(|f| f.model_matrix())
            .unwrap_or_default()
            .to_cols_array()
            .to_vec()
    }

    #[wasm_bindgen(js_name = "viewMatrix")]
    pub fn view_matrix(&self) -> Vec<f32> {
        self.scene.camera().view().to_cols_array().to_vec()
    }

    #[wasm_bindgen(js_name = "projectionMatrix")]
    pub fn projection_matrix(&self) -> Vec<f32> {
        self.scene.camera().projection().to_cols_array().to_vec()
    }

    /// Drawing-buffer size in device pixels as `[width, height]`.
    #[wasm_bindgen(js_name = "drawingBufferSize")]
    pub fn drawing_buffer_size(&self) -> Vec<u32> {
        let (w, h) = self.scene.camera().viewport().drawing_buffer_size();
        vec![w, h]
    }

    #[wasm_bindgen(js_name = "glowIntensity")]
    pub fn glow_intensity(&self) -> f32 {
        self.scene.config().glow_intensity
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl ParticlePortrait {
    /// Takes over `canvas` for drawing: sizes its drawing buffer, creates a
    /// WebGL2 context with a transparent, premultiplied background.
    #[wasm_bindgen(js_name = "attachCanvas")]
    pub fn attach_canvas(&mut self, canvas: web_sys::HtmlCanvasElement) -> Result<(), JsError> {
        use wasm_bindgen::JsCast;

        let options = js_options();
        let context = canvas
            .get_context_with_context_options("webgl2", &options)
            .map_err(|_| JsError::new("webgl2 context request failed"))?
            .ok_or_else(|| JsError::new("webgl2 is not available"))?
            .dyn_into::<web_sys::WebGl2RenderingContext>()
            .map_err(|_| JsError::new("unexpected context type"))?;
        self.target = Some(GlTarget {
            canvas,
            gl: glow::Context::from_webgl2_context(context),
            renderer: None,
        });
        self.resize_target();
        Ok(())
    }

    /// Draws the current field. Returns `false` before the image load
    /// completes or without an attached canvas.
    pub fn render(&mut self) -> Result<bool, JsError> {
        use glow::HasContext;
        use portrait_core::render::PointCloudRenderer;

        let glow_intensity = self.scene.config().glow_intensity;
        let camera = *self.scene.camera();
        let (Some(target), Some(field)) = (self.target.as_mut(), self.scene.field_mut()) else {
            return Ok(false);
        };
        if target.renderer.is_none() {
            let renderer = PointCloudRenderer::new(&target.gl, field)
                .map_err(|e| JsError::new(&e.to_string()))?;
            target.renderer = Some(renderer);
        }
        // SAFETY: clearing the default framebuffer of the attached context.
        unsafe {
            target.gl.clear_color(0.0, 0.0, 0.0, 0.0);
            target.gl.clear(glow::COLOR_BUFFER_BIT);
        }
        if let Some(renderer) = target.renderer.as_mut() {
            renderer.draw(&target.gl, field, &camera, glow_intensity);
        }
        Ok(true)
    }

    /// Releases GPU resources; the portrait can be re-attached afterwards.
    #[wasm_bindgen(js_name = "detachCanvas")]
    pub fn detach_canvas(&mut self) {
        if let Some(GlTarget {
            gl,
            renderer: Some(renderer),
            ..
        }) = self.target.take()
        {
            renderer.destroy(&gl);
        }
    }

    /// Resizes the canvas drawing buffer and the GL viewport together.
    fn resize_target(&self) {
        use glow::HasContext;

        if let Some(target) = &self.target {
            let (w, h) = fit_surface(&target.canvas, self.scene.camera().viewport());
            // SAFETY: viewport update on the attached context.
            unsafe {
                target.gl.viewport(0, 0, w as i32, h as i32);
            }
        }
    }
}

/// WebGL context attributes: transparent, antialiased, premultiplied.
const CONTEXT_OPTIONS: [(&str, bool); 3] =
    [("alpha", true), ("antialias", true), ("premultipliedAlpha", true)];

/// Applies [`CONTEXT_OPTIONS`] through `set`, logging each key that could
/// not be set. Returns how many failed.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn apply_context_options<E: std::fmt::Debug>(
    mut set: impl FnMut(&str, bool) -> Result<(), E>,
) -> usize {
    let mut failed = 0;
    for (key, value) in CONTEXT_OPTIONS {
        if let Err(e) = set(key, value) {
            log::warn!("could not set context option '{key}': {e:?}");
            failed += 1;
        }
    }
    failed
}

#[cfg(target_arch = "wasm32")]
fn js_options() -> JsValue {
    let options: JsValue = js_sys::Object::new().into();
    apply_context_options(|key, value| {
        js_sys::Reflect::set(&options, &key.into(), &value.into()).map(|_| ())
    });
    options
}

fn window_dimension(value: Result<JsValue, JsValue>) -> f32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}
