use std::ops::{Add, Mul, Sub};

/// An integer point in font units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x as f64, self.y as f64)
    }

    /// Applies a transformation, rounding the result back onto the integer grid.
    pub fn transform(self, matrix: &Matrix) -> Point {
        let p = matrix.as_affine() * self.to_kurbo();
        Point::new(p.x.round() as i32, p.y.round() as i32)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(
            (self.x as f64 * rhs).round() as i32,
            (self.y as f64 * rhs).round() as i32,
        )
    }
}

/// An axis-aligned rectangle given by its lower-left and upper-right corners.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Rect {
    pub ll: Point,
    pub ur: Point,
}

impl Rect {
    pub fn new(ll: Point, ur: Point) -> Self {
        Rect { ll, ur }
    }

    /// A degenerate rectangle covering just one point.
    pub fn from_point(p: Point) -> Self {
        Rect { ll: p, ur: p }
    }

    pub fn width(&self) -> i32 {
        self.ur.x - self.ll.x
    }

    pub fn height(&self) -> i32 {
        self.ur.y - self.ll.y
    }

    pub fn include(&mut self, p: Point) {
        self.ll.x = self.ll.x.min(p.x);
        self.ll.y = self.ll.y.min(p.y);
        self.ur.x = self.ur.x.max(p.x);
        self.ur.y = self.ur.y.max(p.y);
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let mut r = *self;
        r.include(other.ll);
        r.include(other.ur);
        r
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.ll.x && p.x <= self.ur.x && p.y >= self.ll.y && p.y <= self.ur.y
    }

    /// Accumulates a bounding box over points; `None` for an empty iterator.
    pub fn bounding<I: IntoIterator<Item = Point>>(points: I) -> Option<Rect> {
        let mut points = points.into_iter();
        let mut rect = Rect::from_point(points.next()?);
        for p in points {
            rect.include(p);
        }
        Some(rect)
    }

    pub fn transform(&self, matrix: &Matrix) -> Rect {
        let corners = [
            self.ll,
            self.ur,
            Point::new(self.ll.x, self.ur.y),
            Point::new(self.ur.x, self.ll.y),
        ];
        // Four corners, so never empty
        Rect::bounding(corners.iter().map(|p| p.transform(matrix))).unwrap_or_default()
    }
}

/// An affine transformation `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Matrix { a, b, c, d, e, f }
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Matrix {
            e: dx,
            f: dy,
            ..Matrix::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix {
            a: sx,
            d: sy,
            ..Matrix::IDENTITY
        }
    }

    pub fn as_affine(&self) -> kurbo::Affine {
        kurbo::Affine::new([self.a, self.b, self.c, self.d, self.e, self.f])
    }

    /// `self.then(other)` applies `self` first and `other` second.
    pub fn then(&self, other: &Matrix) -> Matrix {
        (other.as_affine() * self.as_affine()).into()
    }

    pub fn apply(&self, p: Point) -> Point {
        p.transform(self)
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }
}

impl From<kurbo::Affine> for Matrix {
    fn from(affine: kurbo::Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Matrix { a, b, c, d, e, f }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_include() {
        let mut r = Rect::from_point(Point::new(10, 10));
        r.include(Point::new(-5, 20));
        assert_eq!(r, Rect::new(Point::new(-5, 10), Point::new(10, 20)));
        assert_eq!(r.width(), 15);
        assert_eq!(r.height(), 10);
        assert!(r.contains(Point::new(0, 15)));
        assert!(!r.contains(Point::new(0, 25)));
    }

    #[test]
    fn test_bounding_empty() {
        assert_eq!(Rect::bounding(std::iter::empty()), None);
    }

    #[test]
    fn test_matrix_compose() {
        let m = Matrix::scale(2.0, 3.0).then(&Matrix::translate(10.0, -10.0));
        assert_eq!(m.apply(Point::new(5, 5)), Point::new(20, 5));
        let n = Matrix::translate(10.0, -10.0).then(&Matrix::scale(2.0, 3.0));
        assert_eq!(n.apply(Point::new(5, 5)), Point::new(30, -15));
        assert!(Matrix::default().is_identity());
    }
}
