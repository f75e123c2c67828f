//! # protimeline-render
//!
//! Layout and rendering for protimeline charts.
//!
//! This crate provides:
//! - Time and band scales derived from the row model
//! - Placement functions for bars, milestone glyphs, terminal glyphs and
//!   error markers
//! - An SVG renderer producing the chart document and a retained scene
//! - A tooltip adapter over a host tooltip channel
//! - `TimelineVisual`, the host-facing wrapper driving a full update cycle
//!
//! ## Example
//!
//! ```rust,ignore
//! use protimeline_core::{Renderer, RowModelBuilder, Timeline};
//! use protimeline_render::TimelineRenderer;
//!
//! let model = RowModelBuilder::new(today).build(&table);
//! let timeline = Timeline::new(model.rows, today);
//!
//! let rendered = TimelineRenderer::new().viewport(1200.0, 600.0).render(&timeline)?;
//! std::fs::write("timeline.svg", rendered.svg)?;
//! ```

pub mod icons;
pub mod scale;
pub mod scene;
pub mod tooltip;
pub mod transform;
pub mod visual;

pub use icons::{humanize, IconKind};
pub use scale::{BandScale, ScalePair, TimeScale, ROW_BAND};
pub use scene::{Bounds, ElementRef, Point, Scene};
pub use tooltip::{
    PointerEvent, PointerKind, TooltipAdapter, TooltipHide, TooltipItem, TooltipMove,
    TooltipService, TooltipShow,
};
pub use transform::{ErrorMarker, Offset, Placement, TerminalGates};
pub use visual::{Frame, RedrawDiff, TimelineVisual, UpdateOutcome, Viewport, VisualUpdate};

use protimeline_core::{InnerIcon, ProjectRow, RenderError, Renderer, TerminalStatus, Timeline};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use svg::node::element::{Group, Line, Rectangle, Text};
use svg::Document;
use tracing::debug;

use crate::icons::ICON_SIZE;

/// Space around the plotting area
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 40.0,
            bottom: 20.0,
            left: 150.0,
        }
    }
}

/// SVG timeline renderer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineRenderer {
    /// Total document width in pixels
    pub width: f64,
    /// Minimum document height in pixels
    pub height: f64,
    pub margin: Margin,
    /// Approximate number of ticks on the time axis
    pub tick_count: usize,
    /// strftime format of time axis labels
    pub tick_format: String,
    pub bar_color: String,
    pub error_color: String,
    pub background_color: String,
    pub axis_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
    /// Fixed time axis window; `None` fits the axis to the rows
    pub time_domain: Option<(NaiveDate, NaiveDate)>,
}

impl Default for TimelineRenderer {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 400.0,
            margin: Margin::default(),
            tick_count: 10,
            tick_format: "%m/%d/%Y".into(),
            bar_color: "#5b9bd5".into(),
            error_color: "#ff0000".into(),
            background_color: "#ffffff".into(),
            axis_color: "#2c3e50".into(),
            text_color: "#2c3e50".into(),
            font_family: "Segoe UI, system-ui, sans-serif".into(),
            font_size: 11,
            time_domain: None,
        }
    }
}

// Row-relative geometry
const BAR_Y: f64 = 20.0;
const BAR_HEIGHT: f64 = 20.0;
const ERROR_Y: f64 = 30.0;
const LABEL_X: f64 = -80.0;
const LABEL_NAME_Y: f64 = 25.0;
const LABEL_DATE_Y: f64 = 40.0;
const TERMINAL_SHIFT: f64 = -10.0;
const TICK_SIZE: f64 = 8.0;
const LEGEND_GAP: f64 = 30.0;
const LEGEND_HEIGHT: f64 = ICON_SIZE + 10.0;

/// A rendered chart: the SVG document plus what the host needs to interact
/// with it
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedTimeline {
    pub svg: String,
    pub scene: Scene,
    pub scales: ScalePair,
    pub width: f64,
    pub height: f64,
}

/// Where the plotting area sits in document coordinates
#[derive(Clone, Copy)]
struct Origin {
    x: f64,
    y: f64,
    /// Scene index of the chart group
    node: usize,
}

impl TimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure document size
    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Pin the time axis to `[start, end]` instead of fitting it to the rows
    pub fn time_domain(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.time_domain = Some((start, end));
        self
    }

    /// Width available to the time axis
    pub fn chart_width(&self) -> f64 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    fn validate(&self) -> Result<(), RenderError> {
        let dims = [
            self.width,
            self.height,
            self.margin.top,
            self.margin.right,
            self.margin.bottom,
            self.margin.left,
        ];
        if dims.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(RenderError::InvalidData(format!(
                "viewport {}x{} with margins {:?} is not drawable",
                self.width, self.height, self.margin
            )));
        }
        if let Some((start, end)) = self.time_domain {
            if start >= end {
                return Err(RenderError::InvalidData(format!(
                    "time domain {start} to {end} is empty"
                )));
            }
        }
        Ok(())
    }

    /// Top time axis with ticks and date labels
    fn render_x_axis(&self, scales: &ScalePair) -> Result<Group, RenderError> {
        let mut group = Group::new().set("class", "x axis");

        group = group.add(
            Line::new()
                .set("class", "domain")
                .set("x1", 0)
                .set("y1", 0)
                .set("x2", scales.time.width())
                .set("y2", 0)
                .set("stroke", self.axis_color.as_str()),
        );

        for tick in scales.time.ticks(self.tick_count) {
            let x = scales.x(tick);
            let tick_group = Group::new()
                .set("class", "tick")
                .set("transform", Offset::new(x, 0.0).to_string())
                .add(
                    Line::new()
                        .set("y2", -TICK_SIZE)
                        .set("stroke", self.axis_color.as_str()),
                )
                .add(
                    Text::new(format_tick(tick, &self.tick_format)?)
                        .set("y", -TICK_SIZE - 3.0)
                        .set("font-family", self.font_family.as_str())
                        .set("font-size", self.font_size.saturating_sub(1))
                        .set("fill", self.text_color.as_str())
                        .set("text-anchor", "middle"),
                );
            group = group.add(tick_group);
        }

        Ok(group)
    }

    /// Left axis naming each band
    fn render_y_axis(&self, scales: &ScalePair) -> Group {
        let mut group = Group::new().set("class", "y axis").add(
            Line::new()
                .set("class", "domain")
                .set("x1", 0)
                .set("y1", 0)
                .set("x2", 0)
                .set("y2", scales.band.range_end())
                .set("stroke", self.axis_color.as_str()),
        );

        for name in scales.band.names() {
            let y = scales.y(name) + scales.band.bandwidth() / 2.0;
            group = group.add(
                Text::new(name.as_str())
                    .set("class", "tick")
                    .set("x", -3)
                    .set("y", y)
                    .set("dy", "0.32em")
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size)
                    .set("fill", self.text_color.as_str())
                    .set("text-anchor", "end"),
            );
        }

        group
    }

    fn render_bar(&self, row: &ProjectRow, scales: &ScalePair, origin: Origin, scene: &mut Scene) -> Rectangle {
        let offset = transform::bar_offset(row, scales);
        let width = transform::bar_width(row, scales);
        let hidden = !row.is_displayed();

        scene.push(
            origin.node,
            "bar",
            Some(row.id.clone()),
            Bounds::new(origin.x + offset.x, origin.y + offset.y + BAR_Y, width, BAR_HEIGHT),
            hidden,
        );

        let bar = Rectangle::new()
            .set("class", "bar")
            .set("data-row-id", row.id.as_str())
            .set("rx", 0)
            .set("ry", 0)
            .set("y", BAR_Y)
            .set("transform", offset.to_string())
            .set("height", BAR_HEIGHT)
            .set("width", width)
            .set("fill", self.bar_color.as_str());
        if hidden {
            bar.set("display", "none")
        } else {
            bar
        }
    }

    /// Project name with the assign date underneath, left of the bar start
    fn render_label(&self, row: &ProjectRow, scales: &ScalePair) -> Group {
        let offset = transform::bar_offset(row, scales);
        Group::new()
            .set("class", "label")
            .set("data-row-id", row.id.as_str())
            .set("transform", offset.to_string())
            .add(
                Text::new(row.project_name.as_str())
                    .set("x", LABEL_X)
                    .set("y", LABEL_NAME_Y)
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size)
                    .set("fill", self.text_color.as_str()),
            )
            .add(
                Text::new(tooltip::short_date(row.pm_assign_date))
                    .set("x", LABEL_X)
                    .set("y", LABEL_DATE_Y)
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size.saturating_sub(1))
                    .set("fill", self.text_color.as_str()),
            )
    }

    fn render_error(&self, row: &ProjectRow, scales: &ScalePair, origin: Origin, scene: &mut Scene) -> Rectangle {
        let marker = transform::error_marker(row, scales);

        scene.push(
            origin.node,
            "error",
            Some(row.id.clone()),
            Bounds::new(
                origin.x + marker.offset.x,
                origin.y + marker.offset.y + ERROR_Y,
                marker.width,
                1.0,
            ),
            !marker.visible,
        );

        Rectangle::new()
            .set("class", "error")
            .set("data-row-id", row.id.as_str())
            .set("y", ERROR_Y)
            .set("transform", marker.offset.to_string())
            .set("height", 1)
            .set("width", marker.width)
            .set("fill", self.error_color.as_str())
            .set("display", if marker.visible { "inline" } else { "none" })
    }

    /// One glyph group of `kind` positioned by `placement`
    fn render_icon(
        &self,
        kind: IconKind,
        row: &ProjectRow,
        placement: Placement,
        shift: f64,
        origin: Origin,
        scene: &mut Scene,
    ) -> Group {
        let classes = format!("{} icon", kind.class_name());
        scene.push(
            origin.node,
            &classes,
            Some(row.id.clone()),
            Bounds::new(
                origin.x + placement.offset.x + shift,
                origin.y + placement.offset.y,
                ICON_SIZE,
                ICON_SIZE,
            ),
            !placement.visible,
        );

        let glyph = if shift == 0.0 {
            kind.glyph()
        } else {
            Group::new()
                .set("transform", Offset::new(shift, 0.0).to_string())
                .add(kind.glyph())
        };

        Group::new()
            .set("class", classes)
            .set("data-row-id", row.id.as_str())
            .set("transform", placement.offset.to_string())
            .set("display", if placement.visible { "inline" } else { "none" })
            .add(glyph)
    }

    /// Legend explaining every glyph, at fixed offsets per glyph kind
    fn render_legend(&self, y: f64) -> Group {
        let mut group = Group::new()
            .set("class", "legend")
            .set("transform", Offset::new(0.0, y).to_string());

        for kind in IconKind::ALL {
            let x = kind.legend_offset();
            group = group
                .add(
                    Group::new()
                        .set("class", format!("legend-icon {}", kind.class_name()))
                        .set("transform", Offset::new(x, 0.0).to_string())
                        .add(kind.glyph()),
                )
                .add(
                    Text::new(kind.legend_label())
                        .set("class", "legend-label")
                        .set("x", x + ICON_SIZE + 6.0)
                        .set("y", 17)
                        .set("font-family", self.font_family.as_str())
                        .set("font-size", self.font_size)
                        .set("fill", self.text_color.as_str()),
                );
        }

        group
    }
}

/// Axis label for `date`; rejects format strings chrono cannot render
fn format_tick(date: NaiveDate, format: &str) -> Result<String, RenderError> {
    let mut label = String::new();
    write!(label, "{}", date.format(format))
        .map_err(|_| RenderError::Format(format!("invalid tick format {:?}", format)))?;
    Ok(label)
}

impl Renderer for TimelineRenderer {
    type Output = RenderedTimeline;

    fn render(&self, timeline: &Timeline) -> Result<RenderedTimeline, RenderError> {
        self.validate()?;

        let rows = &timeline.rows;
        let scales =
            ScalePair::derive_in(rows, self.chart_width(), timeline.now, self.time_domain);
        let show_legend = timeline.settings.show_legend.show;

        let chart_bottom = self.margin.top + scales.band.range_end() + ICON_SIZE;
        let legend_y = scales.band.range_end() + LEGEND_GAP;
        let mut height = chart_bottom + self.margin.bottom;
        if show_legend {
            height += LEGEND_GAP + LEGEND_HEIGHT;
        }
        let height = height.max(self.height);
        let width = self.width;

        let mut scene = Scene::new();
        let root = scene.push_container(None, "chart");
        let origin = Origin {
            x: self.margin.left,
            y: self.margin.top,
            node: scene.push_container(Some(root), "gantt-chart"),
        };

        let mut document = Document::new()
            .set("class", "chart")
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg")
            .add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", self.background_color.as_str()),
            );

        let mut chart = Group::new()
            .set("class", "gantt-chart")
            .set("transform", Offset::new(origin.x, origin.y).to_string());

        chart = chart.add(self.render_x_axis(&scales)?);
        chart = chart.add(self.render_y_axis(&scales));

        for row in rows {
            chart = chart.add(self.render_bar(row, &scales, origin, &mut scene));
        }
        for row in rows {
            chart = chart.add(self.render_label(row, &scales));
        }
        for row in rows {
            chart = chart.add(self.render_error(row, &scales, origin, &mut scene));
        }

        for icon in InnerIcon::ALL {
            for row in rows {
                let placement = transform::inner_icon(icon, row, &scales);
                chart = chart.add(self.render_icon(icon.into(), row, placement, 0.0, origin, &mut scene));
            }
        }
        for status in TerminalStatus::GLYPHS {
            let Ok(kind) = IconKind::try_from(status) else {
                continue;
            };
            for row in rows {
                let placement = transform::terminal_icon(status, row, &scales, timeline.now);
                chart = chart.add(self.render_icon(kind, row, placement, TERMINAL_SHIFT, origin, &mut scene));
            }
        }

        if show_legend {
            chart = chart.add(self.render_legend(legend_y));
        }

        document = document.add(chart);

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;
        let svg = String::from_utf8(output)
            .map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))?;

        debug!(
            rows = rows.len(),
            primitives = scene.len(),
            width,
            height,
            legend = show_legend,
            "rendered timeline"
        );

        Ok(RenderedTimeline {
            svg,
            scene,
            scales,
            width,
            height,
        })
    }
}
