//! Icon glyphs and legend entries
//!
//! Every glyph is drawn in a 24×24 box with its origin at the top-left
//! corner; callers position it with a `translate` on the enclosing group.

use protimeline_core::{InnerIcon, TerminalStatus};
use svg::node::element::{Circle, Group, Path, Rectangle, Text};

/// Side length of a glyph box
pub const ICON_SIZE: f64 = 24.0;

const EMPTY_BOX: &str = "M0 0h24v24H0z";

/// Every glyph the chart can draw, in legend order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconKind {
    DealSign,
    DealClose,
    Day2,
    ActiveProgram,
    TransitionToSustaining,
    PensDown,
    Error,
}

impl IconKind {
    pub const ALL: [IconKind; 7] = [
        IconKind::DealSign,
        IconKind::DealClose,
        IconKind::Day2,
        IconKind::ActiveProgram,
        IconKind::TransitionToSustaining,
        IconKind::PensDown,
        IconKind::Error,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            IconKind::DealSign => "dealSign",
            IconKind::DealClose => "dealClose",
            IconKind::Day2 => "day2",
            IconKind::ActiveProgram => "activeProgram",
            IconKind::TransitionToSustaining => "transitionToSustaining",
            IconKind::PensDown => "pensDown",
            IconKind::Error => "error",
        }
    }

    /// Caption shown next to the glyph in the legend
    pub fn legend_label(self) -> &'static str {
        match self {
            IconKind::DealSign => "Deal Sign",
            IconKind::DealClose => "Deal Close / Day 1",
            IconKind::Day2 => "Day 2",
            IconKind::ActiveProgram => "Active Program",
            IconKind::TransitionToSustaining => "Transition To Sustaining",
            IconKind::PensDown => "Pens Down",
            IconKind::Error => "Error",
        }
    }

    /// Fixed horizontal position of the entry inside the legend
    pub fn legend_offset(self) -> f64 {
        match self {
            IconKind::DealSign => 0.0,
            IconKind::DealClose => 110.0,
            IconKind::Day2 => 270.0,
            IconKind::ActiveProgram => 350.0,
            IconKind::TransitionToSustaining => 490.0,
            IconKind::PensDown => 700.0,
            IconKind::Error => 810.0,
        }
    }

    /// Glyph contents, without positioning
    pub fn glyph(self) -> Group {
        match self {
            IconKind::DealSign => two_tone(
                "M3 17.25V21h3.75L17.81 9.94l-3.75-3.75L3 17.25zM20.71 7.04c.39-.39.39-1.02 0-1.41l-2.34-2.34c-.39-.39-1.02-.39-1.41 0l-1.83 1.83 3.75 3.75 1.83-1.83z",
                "#cc681f",
            ),
            IconKind::DealClose => numbered_disc("rgb(94, 77, 129)", "1", 6.0),
            IconKind::Day2 => numbered_disc("rgb(153, 136, 85)", "2", 7.0),
            IconKind::ActiveProgram => two_tone(
                "M12 4V1L8 5l4 4V6c3.31 0 6 2.69 6 6 0 1.01-.25 1.97-.7 2.8l1.46 1.46C19.54 15.03 20 13.57 20 12c0-4.42-3.58-8-8-8zm0 14c-3.31 0-6-2.69-6-6 0-1.01.25-1.97.7-2.8L5.24 7.74C4.46 8.97 4 10.43 4 12c0 4.42 3.58 8 8 8v3l4-4-4-4v3z",
                "#29416c",
            ),
            IconKind::TransitionToSustaining => {
                two_tone("M9 16.2L4.8 12l-1.4 1.4L9 19 21 7l-1.4-1.4L9 16.2z", "green")
            }
            IconKind::PensDown => two_tone(
                "M19 6.41L17.59 5 12 10.59 6.41 5 5 6.41 10.59 12 5 17.59 6.41 19 12 13.41 17.59 19 19 17.59 13.41 12z",
                "red",
            ),
            IconKind::Error => Group::new().add(
                Rectangle::new()
                    .set("width", ICON_SIZE)
                    .set("height", 1)
                    .set("y", 12)
                    .set("fill", "rgb(255,0,0)"),
            ),
        }
    }
}

impl From<InnerIcon> for IconKind {
    fn from(icon: InnerIcon) -> Self {
        match icon {
            InnerIcon::DealSign => IconKind::DealSign,
            InnerIcon::DealClose => IconKind::DealClose,
            InnerIcon::Day2 => IconKind::Day2,
        }
    }
}

impl TryFrom<TerminalStatus> for IconKind {
    type Error = ();

    fn try_from(status: TerminalStatus) -> Result<Self, ()> {
        match status {
            TerminalStatus::ActiveProgram => Ok(IconKind::ActiveProgram),
            TerminalStatus::TransitionToSustaining => Ok(IconKind::TransitionToSustaining),
            TerminalStatus::PensDown => Ok(IconKind::PensDown),
            TerminalStatus::None => Err(()),
        }
    }
}

fn two_tone(path: &str, fill: &str) -> Group {
    Group::new()
        .add(Path::new().set("d", EMPTY_BOX).set("fill", "none"))
        .add(Path::new().set("d", path).set("fill", fill))
}

fn numbered_disc(fill: &str, digit: &str, x: f64) -> Group {
    Group::new()
        .add(
            Circle::new()
                .set("cx", 12)
                .set("cy", 12)
                .set("r", 12)
                .set("fill", fill),
        )
        .add(
            Text::new(digit)
                .set("x", x)
                .set("y", 19)
                .set("fill", "rgb(255, 255, 255)")
                .set("font-family", "Roboto Slab")
                .set("font-size", 22),
        )
}

/// Split a camelCase class name into spaced title case.
///
/// `transitionToSustaining` becomes `Transition To Sustaining`, `day2`
/// becomes `Day 2`.
pub fn humanize(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len() + 4);
    let mut previous: Option<char> = None;
    for c in class_name.chars() {
        match previous {
            None => out.extend(c.to_uppercase()),
            Some(p) => {
                let boundary = (c.is_uppercase() && !p.is_uppercase())
                    || (c.is_ascii_digit() && p.is_alphabetic());
                if boundary && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push(c);
            }
        }
        previous = Some(c);
    }
    out
}
