//! Tooltip adapter
//!
//! Bridges pointer and touch interaction on rendered primitives to the
//! host's tooltip channel. The adapter resolves the nearest ancestor of the
//! event target bearing a registered class, formats the bound row for that
//! class, and forwards coordinates and content to the [`TooltipService`].
//!
//! Hybrid devices emit synthetic mouse events after a touch; mouse handling
//! is suppressed for a short window after every touch end so the same
//! interaction does not open two tooltips.

use chrono::NaiveDate;
use protimeline_core::ProjectRow;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

use crate::icons::humanize;
use crate::scene::{ElementRef, Point};

/// Default mouse suppression window after a touch ends
pub const DEFAULT_HANDLE_TOUCH_DELAY: Duration = Duration::from_millis(1000);

/// Text substituted for a missing end date
pub const ONGOING: &str = "Ongoing";

/// One header/value line of a tooltip
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipItem {
    pub display_name: String,
    pub value: String,
}

impl TooltipItem {
    pub fn new(display_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipShow {
    pub coordinates: [f64; 2],
    pub is_touch_event: bool,
    pub data_items: Vec<TooltipItem>,
    pub identities: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipMove {
    pub coordinates: [f64; 2],
    pub is_touch_event: bool,
    /// Present only when the registration reloads content on move
    pub data_items: Option<Vec<TooltipItem>>,
    pub identities: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipHide {
    pub is_touch_event: bool,
    pub immediately: bool,
}

/// Host tooltip channel. Calls are fire-and-forget.
pub trait TooltipService {
    fn enabled(&self) -> bool {
        true
    }

    fn show(&mut self, options: TooltipShow);

    fn move_to(&mut self, options: TooltipMove);

    fn hide(&mut self, options: TooltipHide);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    MouseOver,
    MouseMove,
    MouseOut,
    TouchStart,
    TouchEnd,
}

/// A pointer or touch event on a rendered element
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Event target followed by its ancestors
    pub target: Vec<ElementRef>,
    /// Position relative to the visual's root element
    pub coordinates: Point,
    /// Pressed mouse buttons bitmask
    pub buttons: u16,
    /// Event time on the host's monotonic clock
    pub timestamp: Duration,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, target: Vec<ElementRef>, coordinates: Point, timestamp: Duration) -> Self {
        Self {
            kind,
            target,
            coordinates,
            buttons: 0,
            timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Registration {
    class: String,
    reload_on_move: bool,
}

/// Forwards interaction on registered element classes to a [`TooltipService`]
#[derive(Debug)]
pub struct TooltipAdapter<S> {
    service: S,
    registrations: Vec<Registration>,
    handle_touch_delay: Duration,
    touch_guard_until: Option<Duration>,
}

impl<S: TooltipService> TooltipAdapter<S> {
    pub fn new(service: S) -> Self {
        Self::with_touch_delay(service, DEFAULT_HANDLE_TOUCH_DELAY)
    }

    pub fn with_touch_delay(service: S, handle_touch_delay: Duration) -> Self {
        Self {
            service,
            registrations: Vec::new(),
            handle_touch_delay,
            touch_guard_until: None,
        }
    }

    /// Length of the window after a touch ends in which mouse events are ignored
    pub fn set_touch_delay(&mut self, handle_touch_delay: Duration) {
        self.handle_touch_delay = handle_touch_delay;
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.registrations.iter().any(|r| r.class == class)
    }

    /// Start handling events on elements of `class`.
    ///
    /// Returns false when the host tooltip service is disabled.
    pub fn add_tooltip(&mut self, class: &str, reload_on_move: bool) -> bool {
        if !self.service.enabled() {
            return false;
        }
        match self.registrations.iter_mut().find(|r| r.class == class) {
            Some(existing) => existing.reload_on_move = reload_on_move,
            None => self.registrations.push(Registration {
                class: class.to_string(),
                reload_on_move,
            }),
        }
        true
    }

    /// Hide any visible tooltip immediately
    pub fn hide(&mut self) {
        self.service.hide(TooltipHide {
            is_touch_event: false,
            immediately: true,
        });
    }

    /// Process one event against the rows bound to the rendered elements
    pub fn handle(&mut self, event: &PointerEvent, rows: &[ProjectRow]) {
        if self
            .touch_guard_until
            .is_some_and(|until| event.timestamp >= until)
        {
            self.touch_guard_until = None;
        }

        match event.kind {
            PointerKind::MouseOver => {
                if !self.can_display(event) {
                    return;
                }
                let Some((class, row)) = self.resolve(event, rows) else {
                    return;
                };
                let Some(items) = tooltip_items(&class, row) else {
                    return;
                };
                self.service.show(TooltipShow {
                    coordinates: coordinates(event),
                    is_touch_event: false,
                    data_items: items,
                    identities: vec![row.id.to_string()],
                });
            }
            PointerKind::MouseMove => {
                if !self.can_display(event) {
                    return;
                }
                let Some((class, row)) = self.resolve(event, rows) else {
                    return;
                };
                let reload = self
                    .registrations
                    .iter()
                    .any(|r| r.class == class && r.reload_on_move);
                let data_items = if reload {
                    let Some(items) = tooltip_items(&class, row) else {
                        return;
                    };
                    Some(items)
                } else {
                    None
                };
                self.service.move_to(TooltipMove {
                    coordinates: coordinates(event),
                    is_touch_event: false,
                    data_items,
                    identities: vec![row.id.to_string()],
                });
            }
            PointerKind::MouseOut => {
                self.service.hide(TooltipHide {
                    is_touch_event: false,
                    immediately: false,
                });
            }
            PointerKind::TouchStart => {
                self.service.hide(TooltipHide {
                    is_touch_event: true,
                    immediately: true,
                });
                let Some((class, row)) = self.resolve(event, rows) else {
                    return;
                };
                let items = tooltip_items(&class, row).unwrap_or_default();
                self.service.show(TooltipShow {
                    coordinates: coordinates(event),
                    is_touch_event: true,
                    data_items: items,
                    identities: vec![row.id.to_string()],
                });
            }
            PointerKind::TouchEnd => {
                self.service.hide(TooltipHide {
                    is_touch_event: true,
                    immediately: false,
                });
                self.touch_guard_until = Some(event.timestamp + self.handle_touch_delay);
            }
        }
    }

    /// Mouse events are ignored while a button is held or right after a touch
    fn can_display(&self, event: &PointerEvent) -> bool {
        event.buttons == 0 && self.touch_guard_until.is_none()
    }

    /// Nearest registered ancestor of the target and the row bound to it
    fn resolve<'r>(&self, event: &PointerEvent, rows: &'r [ProjectRow]) -> Option<(String, &'r ProjectRow)> {
        let (element, class) = event.target.iter().find_map(|element| {
            element
                .classes
                .iter()
                .find(|c| self.is_registered(c))
                .map(|class| (element, class.clone()))
        })?;

        let id = element.row.as_ref()?;
        let row = rows.iter().find(|r| &r.id == id);
        if row.is_none() {
            trace!(%id, "tooltip target bound to a row that is no longer rendered");
        }
        row.map(|row| (class, row))
    }
}

fn coordinates(event: &PointerEvent) -> [f64; 2] {
    [event.coordinates.x, event.coordinates.y]
}

/// Localized short date, `6/1/2015`
pub fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Tooltip lines for an element of `class` bound to `row`
pub fn tooltip_items(class: &str, row: &ProjectRow) -> Option<Vec<TooltipItem>> {
    let end = if row.has_end_date {
        short_date(row.end_date)
    } else {
        ONGOING.to_string()
    };

    let items = match class {
        "bar" => vec![
            TooltipItem::new("Project", row.project_name.as_str()),
            TooltipItem::new("PM Assign", short_date(row.pm_assign_date)),
            TooltipItem::new("End Date", end),
        ],
        "error" => vec![TooltipItem::new("Error", row.project_name.as_str())],
        "activeProgram" => vec![TooltipItem::new(humanize(class), end)],
        "transitionToSustaining" => {
            let date = row.transition_to_sustaining.unwrap_or(row.end_date);
            vec![TooltipItem::new(humanize(class), short_date(date))]
        }
        "pensDown" => vec![TooltipItem::new(humanize(class), short_date(row.pens_down?))],
        "dealSign" => vec![TooltipItem::new(humanize(class), short_date(row.deal_sign?))],
        "dealClose" => vec![TooltipItem::new(humanize(class), short_date(row.deal_close?))],
        "day2" => vec![TooltipItem::new(humanize(class), short_date(row.day2?))],
        _ => return None,
    };
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protimeline_core::{RowId, TerminalStatus};

    #[derive(Debug, PartialEq)]
    enum Call {
        Show(TooltipShow),
        Move(TooltipMove),
        Hide(TooltipHide),
    }

    #[derive(Default)]
    struct Recorder {
        disabled: bool,
        calls: Vec<Call>,
    }

    impl TooltipService for Recorder {
        fn enabled(&self) -> bool {
            !self.disabled
        }

        fn show(&mut self, options: TooltipShow) {
            self.calls.push(Call::Show(options));
        }

        fn move_to(&mut self, options: TooltipMove) {
            self.calls.push(Call::Move(options));
        }

        fn hide(&mut self, options: TooltipHide) {
            self.calls.push(Call::Hide(options));
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn rows() -> Vec<ProjectRow> {
        let mut altera = ProjectRow::new(RowId::new("a"), "Altera", date(2015, 6, 1), date(2018, 11, 30));
        altera.deal_sign = Some(date(2015, 6, 1));
        let mut easic = ProjectRow::new(RowId::new("e"), "eASIC", date(2018, 2, 2), date(2020, 3, 15));
        easic.has_end_date = false;
        easic.active_program = true;
        easic.terminal = TerminalStatus::ActiveProgram;
        vec![altera, easic]
    }

    fn target(classes: &str, row: &str) -> Vec<ElementRef> {
        vec![
            ElementRef::new("", None),
            ElementRef::new(classes, Some(RowId::new(row))),
            ElementRef::new("gantt-chart", None),
        ]
    }

    fn event(kind: PointerKind, classes: &str, row: &str, ms: u64) -> PointerEvent {
        PointerEvent::new(kind, target(classes, row), Point::new(5.0, 7.0), Duration::from_millis(ms))
    }

    fn adapter() -> TooltipAdapter<Recorder> {
        let mut adapter = TooltipAdapter::new(Recorder::default());
        for class in ["bar", "dealSign", "activeProgram"] {
            assert!(adapter.add_tooltip(class, false));
        }
        adapter
    }

    #[test]
    fn mouse_over_shows_icon_tooltip() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::MouseOver, "dealSign icon", "a", 0), &rows());

        assert_eq!(
            adapter.service().calls,
            vec![Call::Show(TooltipShow {
                coordinates: [5.0, 7.0],
                is_touch_event: false,
                data_items: vec![TooltipItem::new("Deal Sign", "6/1/2015")],
                identities: vec!["a".into()],
            })]
        );
    }

    #[test]
    fn active_program_reads_ongoing() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::MouseOver, "activeProgram icon", "e", 0), &rows());
        match &adapter.service().calls[0] {
            Call::Show(show) => {
                assert_eq!(show.data_items, vec![TooltipItem::new("Active Program", "Ongoing")]);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn unregistered_targets_are_ignored() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::MouseOver, "label", "a", 0), &rows());
        adapter.handle(&event(PointerKind::MouseOver, "bar", "gone", 0), &rows());
        assert!(adapter.service().calls.is_empty());
    }

    #[test]
    fn move_reloads_only_when_registered_to() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::MouseMove, "bar", "a", 0), &rows());
        adapter.add_tooltip("bar", true);
        adapter.handle(&event(PointerKind::MouseMove, "bar", "a", 1), &rows());

        let calls = &adapter.service().calls;
        assert!(matches!(&calls[0], Call::Move(m) if m.data_items.is_none()));
        assert!(matches!(&calls[1], Call::Move(m) if m.data_items.as_ref().is_some_and(|i| i.len() == 3)));
    }

    #[test]
    fn pressed_button_blocks_mouse_tooltips() {
        let mut adapter = adapter();
        let mut pressed = event(PointerKind::MouseOver, "bar", "a", 0);
        pressed.buttons = 1;
        adapter.handle(&pressed, &rows());
        assert!(adapter.service().calls.is_empty());
    }

    #[test]
    fn mouse_out_hides_lazily() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::MouseOut, "bar", "a", 0), &rows());
        assert_eq!(
            adapter.service().calls,
            vec![Call::Hide(TooltipHide {
                is_touch_event: false,
                immediately: false,
            })]
        );
    }

    #[test]
    fn touch_suppresses_mouse_for_delay_window() {
        let mut adapter = adapter();
        adapter.handle(&event(PointerKind::TouchStart, "bar", "a", 0), &rows());
        adapter.handle(&event(PointerKind::TouchEnd, "bar", "a", 100), &rows());
        // Synthetic mouse event from the same tap
        adapter.handle(&event(PointerKind::MouseOver, "bar", "a", 150), &rows());
        assert_eq!(adapter.service().calls.len(), 3);

        adapter.handle(&event(PointerKind::MouseOver, "bar", "a", 1100), &rows());
        assert_eq!(adapter.service().calls.len(), 4);

        let calls = &adapter.service().calls;
        assert_eq!(
            calls[0],
            Call::Hide(TooltipHide {
                is_touch_event: true,
                immediately: true,
            })
        );
        assert!(matches!(&calls[1], Call::Show(s) if s.is_touch_event));
        assert!(matches!(&calls[2], Call::Hide(h) if h.is_touch_event && !h.immediately));
        assert!(matches!(&calls[3], Call::Show(s) if !s.is_touch_event));
    }

    #[test]
    fn disabled_service_registers_nothing() {
        let mut adapter = TooltipAdapter::new(Recorder {
            disabled: true,
            ..Recorder::default()
        });
        assert!(!adapter.add_tooltip("bar", false));
        adapter.handle(&event(PointerKind::MouseOver, "bar", "a", 0), &rows());
        assert!(adapter.service().calls.is_empty());
    }

    #[test]
    fn bar_tooltip_lists_dates() {
        let items = tooltip_items("bar", &rows()[1]).unwrap();
        assert_eq!(
            items,
            vec![
                TooltipItem::new("Project", "eASIC"),
                TooltipItem::new("PM Assign", "2/2/2018"),
                TooltipItem::new("End Date", "Ongoing"),
            ]
        );
    }

    #[test]
    fn transition_header_is_humanized() {
        let items = tooltip_items("transitionToSustaining", &rows()[0]).unwrap();
        assert_eq!(items[0].display_name, "Transition To Sustaining");
        assert_eq!(items[0].value, "11/30/2018");
    }

    #[test]
    fn missing_milestone_has_no_tooltip() {
        assert_eq!(tooltip_items("day2", &rows()[0]), None);
        assert_eq!(tooltip_items("label", &rows()[0]), None);
    }
}
