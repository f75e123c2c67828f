//! WebAssembly bindings for protimeline
//!
//! Exposes [`TimelineVisual`] to a browser host as `WasmTimeline`. The host
//! passes its tooltip and event channels as plain callback properties:
//!
//! ```js
//! const timeline = new WasmTimeline({
//!   tooltipShow: (args) => tooltip.show(args),
//!   tooltipMove: (args) => tooltip.move(args),
//!   tooltipHide: (args) => tooltip.hide(args),
//!   renderingStarted: () => events.renderingStarted(),
//!   renderingFinished: () => events.renderingFinished(),
//!   renderingFailed: (reason) => events.renderingFailed(reason),
//! });
//! const report = timeline.update({ table, viewport: { width, height }, objects, now: "2020-03-15" });
//! container.innerHTML = report.svg;
//! ```

use js_sys::Function;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use protimeline_core::{HostEvents, ObjectInstance, SkippedRow};
use protimeline_render::{
    Point, PointerKind, RedrawDiff, TimelineVisual, TooltipHide, TooltipMove, TooltipService,
    TooltipShow, UpdateOutcome, VisualUpdate,
};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// ============================================================================
// Host channels
// ============================================================================

fn callback(host: &JsValue, name: &str) -> Option<Function> {
    js_sys::Reflect::get(host, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn call<T: Serialize>(function: Option<&Function>, args: &T) {
    if let Some(function) = function {
        if let Ok(value) = to_js(args) {
            // Host callbacks are fire-and-forget
            let _ = function.call1(&JsValue::NULL, &value);
        }
    }
}

/// Tooltip channel backed by host callbacks; disabled without `tooltipShow`
#[derive(Default)]
pub struct JsTooltip {
    show: Option<Function>,
    move_to: Option<Function>,
    hide: Option<Function>,
}

impl JsTooltip {
    fn from_host(host: &JsValue) -> Self {
        Self {
            show: callback(host, "tooltipShow"),
            move_to: callback(host, "tooltipMove"),
            hide: callback(host, "tooltipHide"),
        }
    }
}

impl TooltipService for JsTooltip {
    fn enabled(&self) -> bool {
        self.show.is_some()
    }

    fn show(&mut self, args: TooltipShow) {
        call(self.show.as_ref(), &args);
    }

    fn move_to(&mut self, args: TooltipMove) {
        call(self.move_to.as_ref(), &args);
    }

    fn hide(&mut self, args: TooltipHide) {
        call(self.hide.as_ref(), &args);
    }
}

/// Rendering lifecycle channel backed by host callbacks
#[derive(Default)]
pub struct JsEvents {
    started: Option<Function>,
    finished: Option<Function>,
    failed: Option<Function>,
}

impl JsEvents {
    fn from_host(host: &JsValue) -> Self {
        Self {
            started: callback(host, "renderingStarted"),
            finished: callback(host, "renderingFinished"),
            failed: callback(host, "renderingFailed"),
        }
    }
}

impl HostEvents for JsEvents {
    fn rendering_started(&mut self) {
        if let Some(f) = &self.started {
            let _ = f.call0(&JsValue::NULL);
        }
    }

    fn rendering_finished(&mut self) {
        if let Some(f) = &self.finished {
            let _ = f.call0(&JsValue::NULL);
        }
    }

    fn rendering_failed(&mut self, reason: &str) {
        if let Some(f) = &self.failed {
            let _ = f.call1(&JsValue::NULL, &JsValue::from_str(reason));
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Result of one update as handed back to JavaScript
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub rendered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    pub width: f64,
    pub height: f64,
    pub entered: Vec<String>,
    pub updated: Vec<String>,
    pub exited: Vec<String>,
    pub skipped: Vec<SkippedRowInfo>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRowInfo {
    pub index: usize,
    pub project_name: String,
    pub reason: String,
}

impl From<&SkippedRow> for SkippedRowInfo {
    fn from(row: &SkippedRow) -> Self {
        Self {
            index: row.index,
            project_name: row.project_name.clone(),
            reason: format!("{:?}", row.reason),
        }
    }
}

fn ids(diff: &[protimeline_core::RowId]) -> Vec<String> {
    diff.iter().map(ToString::to_string).collect()
}

/// Map a DOM event type to a pointer kind
pub fn parse_pointer_kind(kind: &str) -> Option<PointerKind> {
    match kind {
        "mouseover" => Some(PointerKind::MouseOver),
        "mousemove" => Some(PointerKind::MouseMove),
        "mouseout" => Some(PointerKind::MouseOut),
        "touchstart" => Some(PointerKind::TouchStart),
        "touchend" => Some(PointerKind::TouchEnd),
        _ => None,
    }
}

/// Event timestamp in milliseconds, as delivered by `performance.now()`
fn timestamp(millis: f64) -> Duration {
    Duration::try_from_secs_f64(millis.max(0.0) / 1000.0).unwrap_or_default()
}

// ============================================================================
// WasmTimeline Class
// ============================================================================

/// A project timeline bound to a browser host
#[wasm_bindgen]
pub struct WasmTimeline {
    visual: TimelineVisual<JsTooltip, JsEvents>,
}

#[wasm_bindgen]
impl WasmTimeline {
    /// Create a timeline bound to the callbacks found on `host`
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue) -> Self {
        Self::with_channels(JsTooltip::from_host(&host), JsEvents::from_host(&host))
    }

    /// Run one update cycle
    ///
    /// # Arguments
    /// * `options` - `{ table, viewport: { width, height }, objects, now }`
    ///
    /// # Returns
    /// An update report; failures are reported in it rather than thrown
    pub fn update(&mut self, options: JsValue) -> Result<JsValue, JsValue> {
        let update: VisualUpdate = serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid update: {}", e)))?;
        to_js(&self.apply(update))
    }

    /// SVG of the last successful update
    pub fn svg(&self) -> Option<String> {
        self.visual.frame().map(|f| f.rendered.svg.clone())
    }

    /// Forward a pointer event at document coordinates `(x, y)`
    pub fn pointer(
        &mut self,
        kind: &str,
        x: f64,
        y: f64,
        buttons: u16,
        timestamp_ms: f64,
    ) -> Result<(), JsValue> {
        let kind = parse_pointer_kind(kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown pointer event: {}", kind)))?;
        self.visual
            .pointer_at(kind, Point::new(x, y), buttons, timestamp(timestamp_ms));
        Ok(())
    }

    #[wasm_bindgen(js_name = enumerateObjectInstances)]
    pub fn enumerate_object_instances(&self, object_name: &str) -> Result<JsValue, JsValue> {
        to_js(&self.object_instances(object_name))
    }

    #[wasm_bindgen(js_name = hideTooltip)]
    pub fn hide_tooltip(&mut self) {
        self.visual.hide_tooltip();
    }
}

impl WasmTimeline {
    /// Create a timeline over explicit channels
    pub fn with_channels(tooltip: JsTooltip, events: JsEvents) -> Self {
        Self {
            visual: TimelineVisual::new(tooltip, events),
        }
    }

    pub fn apply(&mut self, update: VisualUpdate) -> UpdateReport {
        let outcome = self.visual.update(update);
        let (width, height) = self
            .visual
            .frame()
            .map_or((0.0, 0.0), |f| (f.rendered.width, f.rendered.height));

        match outcome {
            UpdateOutcome::Rendered(RedrawDiff {
                entered,
                updated,
                exited,
            }) => UpdateReport {
                rendered: true,
                reason: None,
                svg: self.svg(),
                width,
                height,
                entered: ids(&entered),
                updated: ids(&updated),
                exited: ids(&exited),
                skipped: self
                    .visual
                    .frame()
                    .map(|f| f.skipped.iter().map(SkippedRowInfo::from).collect())
                    .unwrap_or_default(),
            },
            UpdateOutcome::Failed(reason) => UpdateReport {
                rendered: false,
                reason: Some(reason),
                svg: None,
                width,
                height,
                entered: Vec::new(),
                updated: Vec::new(),
                exited: Vec::new(),
                skipped: Vec::new(),
            },
        }
    }

    pub fn object_instances(&self, object_name: &str) -> Vec<ObjectInstance> {
        self.visual.enumerate_object_instances(object_name)
    }
}
