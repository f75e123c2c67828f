//! Host-facing visual
//!
//! [`TimelineVisual`] owns everything that survives between host updates:
//! the last successful frame, the parsed settings and the tooltip adapter.
//! The host injects its tooltip channel and event channel at construction.

use chrono::NaiveDate;
use protimeline_core::{
    DataTable, HostEvents, ObjectInstance, RenderError, Renderer, RowId, RowModelBuilder,
    SkippedRow, Timeline, TimelineSettings,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};

use crate::scene::Point;
use crate::tooltip::{PointerEvent, PointerKind, TooltipAdapter, TooltipService};
use crate::{IconKind, RenderedTimeline, TimelineRenderer};

/// Size of the host drawing surface
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Everything the host hands over on one update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualUpdate {
    pub table: DataTable,
    pub viewport: Viewport,
    /// Persisted formatting objects, `{"showLegend": {"show": false}}`
    #[serde(default)]
    pub objects: Option<serde_json::Value>,
    pub now: NaiveDate,
}

/// Row identities entering, staying in and leaving the chart
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RedrawDiff {
    pub entered: Vec<RowId>,
    pub updated: Vec<RowId>,
    pub exited: Vec<RowId>,
}

impl RedrawDiff {
    /// Diff keyed by row identity; `entered` and `updated` follow the new
    /// row order, `exited` the old one
    pub fn between(previous: &[RowId], next: &[RowId]) -> Self {
        let old: HashSet<&RowId> = previous.iter().collect();
        let new: HashSet<&RowId> = next.iter().collect();

        let (updated, entered): (Vec<RowId>, Vec<RowId>) = next.iter().cloned().partition(|id| old.contains(id));
        let exited: Vec<RowId> = previous
            .iter()
            .filter(|id| !new.contains(id))
            .cloned()
            .collect();

        Self {
            entered,
            updated,
            exited,
        }
    }
}

/// The last successfully rendered state
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub timeline: Timeline,
    pub rendered: RenderedTimeline,
    pub skipped: Vec<SkippedRow>,
}

impl Frame {
    pub fn row_ids(&self) -> Vec<RowId> {
        self.timeline.rows.iter().map(|r| r.id.clone()).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    Rendered(RedrawDiff),
    Failed(String),
}

/// Classes that answer pointer interaction with a tooltip
const TOOLTIP_CLASSES: [&str; 2] = ["bar", "error"];

/// A project timeline bound to a host
pub struct TimelineVisual<S: TooltipService, E: HostEvents> {
    renderer: TimelineRenderer,
    tooltip: TooltipAdapter<S>,
    events: E,
    settings: TimelineSettings,
    frame: Option<Frame>,
}

impl<S: TooltipService, E: HostEvents> TimelineVisual<S, E> {
    pub fn new(tooltip: S, events: E) -> Self {
        Self {
            renderer: TimelineRenderer::default(),
            tooltip: TooltipAdapter::new(tooltip),
            events,
            settings: TimelineSettings::default(),
            frame: None,
        }
    }

    /// Use `renderer` for layout and styling; the viewport still comes from
    /// each update
    pub fn with_renderer(mut self, renderer: TimelineRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_touch_delay(mut self, delay: Duration) -> Self {
        self.tooltip.set_touch_delay(delay);
        self
    }

    /// Run one update cycle. Failures are reported through
    /// [`HostEvents::rendering_failed`] and leave the previous frame and its
    /// settings in place.
    ///
    /// Panics inside layout are caught only where unwinding is available.
    /// Builds with `panic = "abort"`, wasm32 among them, still abort on a
    /// panic; there the host only sees what the panic hook reports.
    pub fn update(&mut self, update: VisualUpdate) -> UpdateOutcome {
        self.events.rendering_started();

        let settings = TimelineSettings::from_objects_or_default(update.objects.as_ref());
        let renderer = self
            .renderer
            .clone()
            .viewport(update.viewport.width, update.viewport.height);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            draw(&renderer, &update.table, settings, update.now)
        }));

        let reason = match result {
            Ok(Ok(frame)) => {
                let previous = self.frame.as_ref().map(Frame::row_ids).unwrap_or_default();
                let diff = RedrawDiff::between(&previous, &frame.row_ids());
                debug!(
                    entered = diff.entered.len(),
                    updated = diff.updated.len(),
                    exited = diff.exited.len(),
                    skipped = frame.skipped.len(),
                    "timeline updated"
                );
                self.frame = Some(frame);
                self.settings = settings;
                self.register_tooltips();
                self.events.rendering_finished();
                return UpdateOutcome::Rendered(diff);
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        warn!(%reason, "timeline update failed, keeping previous frame");
        self.events.rendering_failed(&reason);
        UpdateOutcome::Failed(reason)
    }

    fn register_tooltips(&mut self) {
        let icon_classes = IconKind::ALL
            .into_iter()
            .filter(|kind| *kind != IconKind::Error)
            .map(IconKind::class_name);
        for class in TOOLTIP_CLASSES.into_iter().chain(icon_classes) {
            if !self.tooltip.add_tooltip(class, false) {
                debug!("host tooltip service disabled");
                return;
            }
        }
    }

    /// The last successfully rendered frame
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn settings(&self) -> TimelineSettings {
        self.settings
    }

    /// Settings objects for the host property pane
    pub fn enumerate_object_instances(&self, object_name: &str) -> Vec<ObjectInstance> {
        self.settings.enumerate_object_instances(object_name)
    }

    /// Forward a pointer event whose target chain the host already resolved
    pub fn pointer(&mut self, event: &PointerEvent) {
        let rows = match &self.frame {
            Some(frame) => frame.timeline.rows.as_slice(),
            None => &[],
        };
        self.tooltip.handle(event, rows);
    }

    /// Hit-test `point` against the retained scene, then forward the event
    pub fn pointer_at(&mut self, kind: PointerKind, point: Point, buttons: u16, timestamp: Duration) {
        let target = self
            .frame
            .as_ref()
            .map(|f| f.rendered.scene.hit_test(point))
            .unwrap_or_default();
        let mut event = PointerEvent::new(kind, target, point, timestamp);
        event.buttons = buttons;
        self.pointer(&event);
    }

    pub fn hide_tooltip(&mut self) {
        self.tooltip.hide();
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn tooltip_service(&self) -> &S {
        self.tooltip.service()
    }
}

fn draw(
    renderer: &TimelineRenderer,
    table: &DataTable,
    settings: TimelineSettings,
    now: NaiveDate,
) -> Result<Frame, RenderError> {
    let model = RowModelBuilder::new(now).build(table);
    let timeline = Timeline::new(model.rows, now).with_settings(settings);
    let rendered = renderer.render(&timeline)?;
    Ok(Frame {
        timeline,
        rendered,
        skipped: model.skipped,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic during render: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic during render: {message}")
    } else {
        "panic during render".to_string()
    }
}
