//! Retained scene for hit testing
//!
//! The renderer records every interactive primitive it emits, with its class
//! list, bound row and bounds in document coordinates. Hosts without a DOM
//! resolve pointer positions against this tree to find the element under the
//! pointer and its ancestors.

use protimeline_core::RowId;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// What a tooltip handler sees of an element: its classes and bound row
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementRef {
    pub classes: Vec<String>,
    pub row: Option<RowId>,
}

impl ElementRef {
    /// Element with whitespace-separated `classes`
    pub fn new(classes: &str, row: Option<RowId>) -> Self {
        Self {
            classes: classes.split_whitespace().map(str::to_string).collect(),
            row,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct SceneElement {
    element: ElementRef,
    /// `None` for containers, which are never hit directly
    bounds: Option<Bounds>,
    hidden: bool,
    parent: Option<usize>,
}

/// Element tree in drawing order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    elements: Vec<SceneElement>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add a container element; returns its index
    pub fn push_container(&mut self, parent: Option<usize>, classes: &str) -> usize {
        self.elements.push(SceneElement {
            element: ElementRef::new(classes, None),
            bounds: None,
            hidden: false,
            parent,
        });
        self.elements.len() - 1
    }

    /// Add a drawn primitive; returns its index
    pub fn push(
        &mut self,
        parent: usize,
        classes: &str,
        row: Option<RowId>,
        bounds: Bounds,
        hidden: bool,
    ) -> usize {
        self.elements.push(SceneElement {
            element: ElementRef::new(classes, row),
            bounds: Some(bounds),
            hidden,
            parent: Some(parent),
        });
        self.elements.len() - 1
    }

    /// Visible primitives carrying `class`
    pub fn visible_with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ElementRef> + 'a {
        self.elements
            .iter()
            .filter(move |e| !e.hidden && e.bounds.is_some() && e.element.has_class(class))
            .map(|e| &e.element)
    }

    /// Bounds of the visible primitive of `class` bound to `row`
    pub fn bounds_of(&self, class: &str, row: &RowId) -> Option<Bounds> {
        self.elements
            .iter()
            .find(|e| !e.hidden && e.element.has_class(class) && e.element.row.as_ref() == Some(row))
            .and_then(|e| e.bounds)
    }

    /// Ancestor chain, innermost first, of the topmost visible primitive
    /// under `point`; empty when nothing is hit.
    pub fn hit_test(&self, point: Point) -> Vec<ElementRef> {
        let hit = self.elements.iter().rposition(|e| {
            !e.hidden && e.bounds.is_some_and(|b| b.contains(point))
        });

        let mut chain = Vec::new();
        let mut current = hit;
        while let Some(index) = current {
            let element = &self.elements[index];
            chain.push(element.element.clone());
            current = element.parent;
        }
        chain
    }
}
