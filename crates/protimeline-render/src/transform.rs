//! Placement of every timeline primitive
//!
//! Pure functions from a [`ProjectRow`] and the [`ScalePair`] to pixel
//! offsets in chart coordinates. Offsets are computed even for primitives
//! that end up hidden, so a host can animate them in and out.

use chrono::NaiveDate;
use protimeline_core::{InnerIcon, ProjectRow, TerminalStatus};
use std::fmt;

use crate::scale::ScalePair;

/// Vertical offset of icon glyphs below the band top
pub const ICON_ROW_OFFSET: f64 = 18.0;

/// A 2D translation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{})", self.x, self.y)
    }
}

/// Offset plus visibility of one glyph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub offset: Offset,
    pub visible: bool,
}

/// Error underline spanning a row's bar
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorMarker {
    pub offset: Offset,
    pub width: f64,
    pub visible: bool,
}

/// Bar origin: assign date on the row's band
pub fn bar_offset(row: &ProjectRow, scales: &ScalePair) -> Offset {
    Offset::new(scales.x(row.pm_assign_date), scales.y(&row.project_name))
}

/// Bar length, zero when the end precedes the start
pub fn bar_width(row: &ProjectRow, scales: &ScalePair) -> f64 {
    (scales.x(row.end_date) - scales.x(row.pm_assign_date)).max(0.0)
}

/// Milestone glyph placement; hidden when the row lacks that milestone
pub fn inner_icon(icon: InnerIcon, row: &ProjectRow, scales: &ScalePair) -> Placement {
    let date = icon.date(row);
    Placement {
        offset: Offset::new(
            date.map_or(0.0, |d| scales.x(d)),
            scales.y(&row.project_name) + ICON_ROW_OFFSET,
        ),
        visible: date.is_some(),
    }
}

/// Terminal glyph placement for `status` on `row`.
///
/// The active-program glyph tracks "now"; the others sit at the end date.
pub fn terminal_icon(
    status: TerminalStatus,
    row: &ProjectRow,
    scales: &ScalePair,
    now: NaiveDate,
) -> Placement {
    let anchor = match status {
        TerminalStatus::ActiveProgram => now,
        _ => row.end_date,
    };
    Placement {
        offset: Offset::new(
            scales.x(anchor),
            scales.y(&row.project_name) + ICON_ROW_OFFSET,
        ),
        visible: status != TerminalStatus::None && row.terminal == status,
    }
}

pub fn error_marker(row: &ProjectRow, scales: &ScalePair) -> ErrorMarker {
    ErrorMarker {
        offset: bar_offset(row, scales),
        width: bar_width(row, scales),
        visible: row.error,
    }
}

/// The three independent visibility gates of the terminal glyphs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalGates {
    pub active_program: bool,
    pub transition_to_sustaining: bool,
    pub pens_down: bool,
}

impl TerminalGates {
    pub fn for_row(row: &ProjectRow) -> Self {
        let pens_down = row.is_pens_down();
        Self {
            active_program: !pens_down && row.active_program,
            transition_to_sustaining: !row.active_program && !pens_down,
            pens_down,
        }
    }

    pub fn visible_count(self) -> usize {
        [self.active_program, self.transition_to_sustaining, self.pens_down]
            .into_iter()
            .filter(|gate| *gate)
            .count()
    }
}
