//! # protimeline-core
//!
//! Core domain model and traits for the protimeline project timeline chart.
//!
//! This crate provides:
//! - Input types: `CellValue`, `Column`, `DataTable`, `Role`
//! - Domain types: `ProjectRow`, `TerminalStatus`, `InnerIcon`, `Timeline`
//! - The row model builder that turns a role-tagged table into sorted rows
//! - Visual settings and their host round trip
//! - Core traits: `Renderer`, `HostEvents`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use protimeline_core::{CellValue, Column, DataTable, Role, RowModelBuilder};
//!
//! let table = DataTable::new(vec![
//!     Column::new("Project").role(Role::Project),
//!     Column::new("PM Assign").role(Role::PmAssign),
//! ])
//! .row(vec![CellValue::from("Altera"), CellValue::from("2015-06-01")]);
//!
//! let now = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let model = RowModelBuilder::new(now).build(&table);
//! assert_eq!(model.rows[0].project_name, "Altera");
//! assert!(model.rows[0].active_program);
//! ```

pub mod rows;
pub mod settings;

pub use rows::{RowModel, RowModelBuilder, SkipReason, SkippedRow};
pub use settings::{ObjectInstance, ShowLegend, TimelineSettings};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identity of a timeline row, used to match rows across redraws.
///
/// Built once per row: the host selection identity when one is supplied,
/// otherwise derived from the row's position in the source table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_index(index: usize) -> Self {
        Self(format!("row-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tabular Input
// ============================================================================

/// A primitive table cell as delivered by the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the cell as a calendar date.
    ///
    /// Text accepts ISO dates, US `m/d/Y` dates and timestamps (the time of
    /// day is dropped). Numbers are epoch milliseconds.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            CellValue::Text(text) => parse_date_text(text.trim()),
            CellValue::Number(millis) if millis.is_finite() => {
                DateTime::from_timestamp_millis(*millis as i64).map(|dt| dt.date_naive())
            }
            _ => None,
        }
    }

    /// Render the cell as display text
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            CellValue::Text(text) => text.clone(),
        }
    }

    /// Truthiness of the cell, used for flag columns
    pub fn as_bool(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Date(_) => true,
            CellValue::Text(text) => {
                let text = text.trim();
                !(text.is_empty()
                    || text == "0"
                    || text.eq_ignore_ascii_case("false")
                    || text.eq_ignore_ascii_case("no"))
            }
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Semantic role a column can be bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Project,
    PmAssign,
    EndDate,
    DealSign,
    DealClose,
    Day2,
    Error,
    PensDown,
    TransitionToSustaining,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Project,
        Role::PmAssign,
        Role::EndDate,
        Role::DealSign,
        Role::DealClose,
        Role::Day2,
        Role::Error,
        Role::PensDown,
        Role::TransitionToSustaining,
    ];

    /// Role name as declared by the host data binding
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Project => "project",
            Role::PmAssign => "pmAssign",
            Role::EndDate => "endDate",
            Role::DealSign => "dealSign",
            Role::DealClose => "dealClose",
            Role::Day2 => "day2",
            Role::Error => "error",
            Role::PensDown => "pensDown",
            Role::TransitionToSustaining => "transitionToSustaining",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column metadata: display name plus the roles bound to it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Bind a role to this column
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role.as_str().to_string());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }
}

/// Role-tagged table handed over by the host on every update
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    /// Host selection identities, parallel to `rows` when present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
}

impl DataTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            identities: Vec::new(),
        }
    }

    /// Append a row of cells
    pub fn row(mut self, cells: Vec<CellValue>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Index of the first column carrying `role`, `None` when unbound
    pub fn column_for(&self, role: Role) -> Option<usize> {
        self.columns.iter().position(|c| c.has_role(role))
    }

    /// Cell of `row` bound to `role`.
    ///
    /// Short rows read as `Null` for the missing trailing cells.
    pub fn cell(&self, row: usize, role: Role) -> Option<&CellValue> {
        let column = self.column_for(role)?;
        let cells = self.rows.get(row)?;
        Some(cells.get(column).unwrap_or(&CellValue::Null))
    }
}

// ============================================================================
// Timeline Rows
// ============================================================================

/// Milestone glyphs drawn at an interior date of the bar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnerIcon {
    DealSign,
    DealClose,
    Day2,
}

impl InnerIcon {
    pub const ALL: [InnerIcon; 3] = [InnerIcon::DealSign, InnerIcon::DealClose, InnerIcon::Day2];

    pub fn class_name(self) -> &'static str {
        match self {
            InnerIcon::DealSign => "dealSign",
            InnerIcon::DealClose => "dealClose",
            InnerIcon::Day2 => "day2",
        }
    }

    /// Milestone date of `row` for this icon
    pub fn date(self, row: &ProjectRow) -> Option<NaiveDate> {
        match self {
            InnerIcon::DealSign => row.deal_sign,
            InnerIcon::DealClose => row.deal_close,
            InnerIcon::Day2 => row.day2,
        }
    }
}

/// Status glyph shown at the end of a row's bar.
///
/// Computed once per row so that at most one terminal glyph is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalStatus {
    ActiveProgram,
    TransitionToSustaining,
    PensDown,
    #[default]
    None,
}

impl TerminalStatus {
    /// Glyph-bearing variants, in drawing order
    pub const GLYPHS: [TerminalStatus; 3] = [
        TerminalStatus::ActiveProgram,
        TerminalStatus::TransitionToSustaining,
        TerminalStatus::PensDown,
    ];

    /// Rows without a display name draw no bar and therefore no glyph.
    pub fn derive(project_name: &str, pens_down: bool, active_program: bool) -> Self {
        if project_name.is_empty() {
            TerminalStatus::None
        } else if pens_down {
            TerminalStatus::PensDown
        } else if active_program {
            TerminalStatus::ActiveProgram
        } else {
            TerminalStatus::TransitionToSustaining
        }
    }

    pub fn class_name(self) -> Option<&'static str> {
        match self {
            TerminalStatus::ActiveProgram => Some("activeProgram"),
            TerminalStatus::TransitionToSustaining => Some("transitionToSustaining"),
            TerminalStatus::PensDown => Some("pensDown"),
            TerminalStatus::None => None,
        }
    }
}

/// One normalized timeline entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: RowId,
    pub project_name: String,
    pub pm_assign_date: NaiveDate,
    /// Resolved end; "now" at build time when the row is ongoing
    pub end_date: NaiveDate,
    /// Whether `end_date` came from the data rather than the "now" fallback
    pub has_end_date: bool,
    pub deal_sign: Option<NaiveDate>,
    pub deal_close: Option<NaiveDate>,
    pub day2: Option<NaiveDate>,
    pub pens_down: Option<NaiveDate>,
    pub transition_to_sustaining: Option<NaiveDate>,
    pub error: bool,
    pub active_program: bool,
    pub terminal: TerminalStatus,
}

impl ProjectRow {
    /// A finished, error-free row spanning `pm_assign_date..=end_date`
    pub fn new(
        id: RowId,
        project_name: impl Into<String>,
        pm_assign_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let project_name = project_name.into();
        let terminal = TerminalStatus::derive(&project_name, false, false);
        Self {
            id,
            project_name,
            pm_assign_date,
            end_date,
            has_end_date: true,
            deal_sign: None,
            deal_close: None,
            day2: None,
            pens_down: None,
            transition_to_sustaining: None,
            error: false,
            active_program: false,
            terminal,
        }
    }

    pub fn is_pens_down(&self) -> bool {
        self.pens_down.is_some()
    }

    /// Bars are drawn only for rows with a display name
    pub fn is_displayed(&self) -> bool {
        !self.project_name.is_empty()
    }
}

/// The view model handed to a renderer
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub rows: Vec<ProjectRow>,
    pub settings: TimelineSettings,
    /// Reference date for ongoing rows and the active-program glyph
    pub now: NaiveDate,
}

impl Timeline {
    pub fn new(rows: Vec<ProjectRow>, now: NaiveDate) -> Self {
        Self {
            rows,
            settings: TimelineSettings::default(),
            now,
        }
    }

    pub fn with_settings(mut self, settings: TimelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn row(&self, id: &RowId) -> Option<&ProjectRow> {
        self.rows.iter().find(|r| &r.id == id)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a timeline to the output format
    fn render(&self, timeline: &Timeline) -> Result<Self::Output, RenderError>;
}

/// Host event-reporting channel, invoked once per update cycle
pub trait HostEvents {
    fn rendering_started(&mut self);

    fn rendering_finished(&mut self);

    fn rendering_failed(&mut self, reason: &str);
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Settings parsing error
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings object: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================
