#![forbid(unsafe_code)]

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(b)
}

/// One of a box's four edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Iteration order used when snapping to the nearest attachment point.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];
}

/// Axis-aligned diagram node in absolute document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DiagramBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        euclid::rect(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        point(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn center_top(&self) -> Point {
        point(self.x + self.width / 2.0, self.y)
    }

    pub fn center_bottom(&self) -> Point {
        point(self.x + self.width / 2.0, self.y + self.height)
    }

    pub fn center_left(&self) -> Point {
        point(self.x, self.y + self.height / 2.0)
    }

    pub fn center_right(&self) -> Point {
        point(self.x + self.width, self.y + self.height / 2.0)
    }

    pub fn attachment(&self, side: Side) -> Point {
        match side {
            Side::Top => self.center_top(),
            Side::Bottom => self.center_bottom(),
            Side::Left => self.center_left(),
            Side::Right => self.center_right(),
        }
    }

    /// Edge midpoints in [`Side::ALL`] order.
    pub fn attachment_points(&self) -> [Point; 4] {
        Side::ALL.map(|side| self.attachment(side))
    }

    pub fn translated(&self, offset: Vector) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}
