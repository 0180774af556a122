//! Drawing primitives for the board.
//!
//! Every element is stored in the flat wire shape peers exchange, so the
//! same value is used for rendering, history snapshots and broadcast.

mod text;

pub use hit_test::{HIT_TOLERANCE, is_near, point_to_polyline_dist, point_to_segment_dist};
pub use text::{approximate_extent, text_bounds};

use kurbo::{BezPath, Circle, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Length of each arrow head stroke in pixels.
pub const ARROW_HEAD_LENGTH: f64 = 15.0;

/// Angle between the shaft and each head stroke.
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// The kind of primitive an element draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementKind {
    Line,
    Rectangle,
    Circle,
    Arrow,
    Brush,
    Text,
}

impl ElementKind {
    /// Whether elements of this kind keep a fill color.
    pub fn supports_fill(self) -> bool {
        matches!(self, ElementKind::Rectangle | ElementKind::Circle)
    }

    /// Whether elements of this kind are defined by an anchor and a live endpoint.
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            ElementKind::Line | ElementKind::Rectangle | ElementKind::Circle | ElementKind::Arrow
        )
    }
}

/// Anchor `(x1, y1)` and live endpoint `(x2, y2)` of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    /// A zero-length segment at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x,
            y2: y,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Axis-aligned rectangle spanned by both points.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }
}

/// Geometry of an element, tagged by its wire `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Geometry {
    Line(Segment),
    Rectangle(Segment),
    /// Centered on the anchor; the radius reaches the live endpoint.
    Circle(Segment),
    Arrow(Segment),
    Brush { points: Vec<Point> },
    Text { x1: f64, y1: f64, text: String },
}

impl Geometry {
    /// Zero-size geometry of `kind` anchored at `(x, y)`.
    pub fn anchored(kind: ElementKind, x: f64, y: f64) -> Self {
        match kind {
            ElementKind::Line => Geometry::Line(Segment::at(x, y)),
            ElementKind::Rectangle => Geometry::Rectangle(Segment::at(x, y)),
            ElementKind::Circle => Geometry::Circle(Segment::at(x, y)),
            ElementKind::Arrow => Geometry::Arrow(Segment::at(x, y)),
            ElementKind::Brush => Geometry::Brush {
                points: vec![Point::new(x, y)],
            },
            ElementKind::Text => Geometry::Text {
                x1: x,
                y1: y,
                text: String::new(),
            },
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Geometry::Line(_) => ElementKind::Line,
            Geometry::Rectangle(_) => ElementKind::Rectangle,
            Geometry::Circle(_) => ElementKind::Circle,
            Geometry::Arrow(_) => ElementKind::Arrow,
            Geometry::Brush { .. } => ElementKind::Brush,
            Geometry::Text { .. } => ElementKind::Text,
        }
    }

    /// The anchor/endpoint pair for shape geometries.
    pub fn segment(&self) -> Option<&Segment> {
        match self {
            Geometry::Line(s)
            | Geometry::Rectangle(s)
            | Geometry::Circle(s)
            | Geometry::Arrow(s) => Some(s),
            _ => None,
        }
    }
}

/// Stroke and fill settings applied at draw-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Stroke color, in whatever notation the renderer understands.
    pub stroke: String,
    /// Fill color; only kept for rectangles and circles.
    #[serde(default)]
    pub fill: Option<String>,
    /// Stroke width, or font size for text.
    pub size: f64,
}

impl Style {
    pub fn new(stroke: impl Into<String>, fill: Option<String>, size: f64) -> Self {
        Self {
            stroke: stroke.into(),
            fill,
            size,
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new("black", None, 2.0)
    }
}

/// One drawing primitive on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingElement {
    /// Position in the element sequence when the element was created.
    pub index: usize,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub style: Style,
    /// Renderer outline, derived from geometry and style.
    #[serde(skip)]
    descriptor: Option<BezPath>,
    /// Text extent `(width, height)` measured by the renderer.
    #[serde(skip)]
    measured_extent: Option<(f64, f64)>,
}

impl PartialEq for DrawingElement {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.geometry == other.geometry && self.style == other.style
    }
}

impl DrawingElement {
    /// Build an element with its descriptor already derived.
    pub fn new(index: usize, geometry: Geometry, mut style: Style) -> Self {
        if !geometry.kind().supports_fill() {
            style.fill = None;
        }
        let mut element = Self {
            index,
            geometry,
            style,
            descriptor: None,
            measured_extent: None,
        };
        element.rebuild_descriptor();
        element
    }

    /// A zero-size element of `kind` anchored at `(x, y)`.
    pub fn anchored(index: usize, kind: ElementKind, x: f64, y: f64, style: Style) -> Self {
        Self::new(index, Geometry::anchored(kind, x, y), style)
    }

    pub fn kind(&self) -> ElementKind {
        self.geometry.kind()
    }

    /// A copy of this element with the live endpoint moved to `(x, y)`.
    ///
    /// Brushes get `(x, y)` appended to their points instead; text is
    /// returned unchanged.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        let geometry = match &self.geometry {
            Geometry::Line(s) => Geometry::Line(Segment { x2: x, y2: y, ..*s }),
            Geometry::Rectangle(s) => Geometry::Rectangle(Segment { x2: x, y2: y, ..*s }),
            Geometry::Circle(s) => Geometry::Circle(Segment { x2: x, y2: y, ..*s }),
            Geometry::Arrow(s) => Geometry::Arrow(Segment { x2: x, y2: y, ..*s }),
            Geometry::Brush { points } => {
                let mut points = points.clone();
                points.push(Point::new(x, y));
                Geometry::Brush { points }
            }
            Geometry::Text { .. } => return self.clone(),
        };
        Self::new(self.index, geometry, self.style.clone())
    }

    /// A copy of this text element carrying `content`. Other kinds are returned unchanged.
    pub fn with_text(&self, content: impl Into<String>) -> Self {
        match &self.geometry {
            Geometry::Text { x1, y1, .. } => Self::new(
                self.index,
                Geometry::Text {
                    x1: *x1,
                    y1: *y1,
                    text: content.into(),
                },
                self.style.clone(),
            ),
            _ => self.clone(),
        }
    }

    /// The text payload, for text elements.
    pub fn text(&self) -> Option<&str> {
        match &self.geometry {
            Geometry::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Renderer outline, if it has been derived.
    pub fn descriptor(&self) -> Option<&BezPath> {
        self.descriptor.as_ref()
    }

    /// Recompute the renderer outline from the stored attributes.
    pub fn rebuild_descriptor(&mut self) {
        self.descriptor = Some(self.to_path());
    }

    /// Record the text extent measured by the renderer.
    pub fn set_measured_extent(&mut self, width: f64, height: f64) {
        self.measured_extent = Some((width, height));
    }

    pub fn measured_extent(&self) -> Option<(f64, f64)> {
        self.measured_extent
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        match &self.geometry {
            Geometry::Line(s) | Geometry::Rectangle(s) | Geometry::Arrow(s) => s.rect(),
            Geometry::Circle(s) => {
                let r = s.length();
                Rect::new(s.x1 - r, s.y1 - r, s.x1 + r, s.y1 + r)
            }
            Geometry::Brush { points } => points
                .iter()
                .skip(1)
                .fold(
                    points.first().map(|p| Rect::from_points(*p, *p)).unwrap_or(Rect::ZERO),
                    |r, p| r.union_pt(*p),
                ),
            Geometry::Text { .. } => text_bounds(self),
        }
    }

    /// Path representation used as the renderer descriptor.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        match &self.geometry {
            Geometry::Line(s) => {
                path.move_to(s.start());
                path.line_to(s.end());
            }
            Geometry::Rectangle(s) => {
                let r = s.rect();
                path.move_to(Point::new(r.x0, r.y0));
                path.line_to(Point::new(r.x1, r.y0));
                path.line_to(Point::new(r.x1, r.y1));
                path.line_to(Point::new(r.x0, r.y1));
                path.close_path();
            }
            Geometry::Circle(s) => {
                path = Circle::new(s.start(), s.length()).to_path(0.1);
            }
            Geometry::Arrow(s) => {
                path.move_to(s.start());
                path.line_to(s.end());
                let [left, right] = arrow_head(s);
                path.move_to(left);
                path.line_to(s.end());
                path.line_to(right);
            }
            Geometry::Brush { points } => {
                if let Some(first) = points.first() {
                    path.move_to(*first);
                    for p in points.iter().skip(1) {
                        path.line_to(*p);
                    }
                }
            }
            Geometry::Text { .. } => {
                let b = self.bounds();
                path.move_to(Point::new(b.x0, b.y0));
                path.line_to(Point::new(b.x1, b.y0));
                path.line_to(Point::new(b.x1, b.y1));
                path.line_to(Point::new(b.x0, b.y1));
                path.close_path();
            }
        }
        path
    }
}

/// Outer ends of the two arrow head strokes.
pub fn arrow_head(segment: &Segment) -> [Point; 2] {
    let angle = (segment.y2 - segment.y1).atan2(segment.x2 - segment.x1);
    let tip = segment.end();
    let wing = |offset: f64| {
        Point::new(
            tip.x - ARROW_HEAD_LENGTH * (angle - offset).cos(),
            tip.y - ARROW_HEAD_LENGTH * (angle - offset).sin(),
        )
    };
    [wing(ARROW_HEAD_ANGLE), wing(-ARROW_HEAD_ANGLE)]
}
