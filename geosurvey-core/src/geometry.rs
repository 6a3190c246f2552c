//! Pure planar geometry: points, segments, and the closed-form formulas
//! the sweep needs (circumcenters, ray intersection, bounding-box clipping).

use std::{
    cmp::min,
    fmt,
    ops::{Add, Mul, Sub},
};

use ordered_float::OrderedFloat;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Point {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x.into_inner(), self.y.into_inner())
    }
}

impl Point {
    pub fn new(x: OrderedFloat<f64>, y: OrderedFloat<f64>) -> Self {
        Self { x, y }
    }

    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(OrderedFloat(x), OrderedFloat(y))
    }

    pub fn is_finite(&self) -> bool {
        self.x.into_inner().is_finite() && self.y.into_inner().is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Add<&Point> for Point {
    type Output = Self;

    fn add(self, other: &Point) -> Self::Output {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<OrderedFloat<f64>> for Point {
    type Output = Self;

    fn mul(self, rhs: OrderedFloat<f64>) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Mul<OrderedFloat<f64>> for &Point {
    type Output = Point;

    fn mul(self, rhs: OrderedFloat<f64>) -> Self::Output {
        Point {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

pub type Segment = [Point; 2];

#[derive(Copy, Clone, Debug)]
pub struct BoundingBox {
    pub x_min: OrderedFloat<f64>,
    pub x_max: OrderedFloat<f64>,
    pub y_min: OrderedFloat<f64>,
    pub y_max: OrderedFloat<f64>,
}

impl BoundingBox {
    pub fn new(
        x_min: OrderedFloat<f64>,
        x_max: OrderedFloat<f64>,
        y_min: OrderedFloat<f64>,
        y_max: OrderedFloat<f64>,
    ) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// A box covering `points` with `margin` added on every side, plus an
    /// extra `extra_below` subtracted from `y_min` — the sweep needs room
    /// below the lowest site to extrapolate unfinished breakpoints.
    pub fn around(points: &[Point], margin: f64, extra_below: f64) -> Self {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for p in points {
            x_min = x_min.min(p.x.into_inner());
            x_max = x_max.max(p.x.into_inner());
            y_min = y_min.min(p.y.into_inner());
            y_max = y_max.max(p.y.into_inner());
        }
        Self::new(
            OrderedFloat(x_min - margin),
            OrderedFloat(x_max + margin),
            OrderedFloat(y_min - margin - extra_below),
            OrderedFloat(y_max + margin),
        )
    }
}

pub fn normal_vector(point: Point) -> Point {
    Point::new(-point.y, point.x)
}

/// Circumcenter of the triangle `(a, b, c)`. Returns `None` when the three
/// points are collinear (the circle's radius would be infinite) — this is
/// the correct "no circle event" case, not an error.
pub fn circumcenter(a: &Point, b: &Point, c: &Point) -> Option<Point> {
    let x1 = a.x;
    let y1 = a.y;
    let x2 = b.x;
    let y2 = b.y;
    let x3 = c.x;
    let y3 = c.y;

    let c1 = x3 * x3 + y3 * y3 - x1 * x1 - y1 * y1;
    let c2 = x3 * x3 + y3 * y3 - x2 * x2 - y2 * y2;
    let a1 = (x1 - x3) * -2.;
    let a2 = (x2 - x3) * -2.;
    let b1 = (y1 - y3) * -2.;
    let b2 = (y2 - y3) * -2.;

    let numer = c1 * a2 - c2 * a1;
    let denom = b1 * a2 - b2 * a1;

    if denom == 0.0 {
        return None;
    }
    let y_cen = numer / denom;

    let x_cen = if a2 != 0.0 {
        (c2 - b2 * y_cen) / a2
    } else if a1 != 0.0 {
        (c1 - b1 * y_cen) / a1
    } else {
        return None;
    };

    Some(Point::new(x_cen, y_cen))
}

/// Intersection of two rays `ao + u*ad` and `bo + v*bd`, requiring both
/// `u, v >= 0` (used for beach-line edges, which only grow forward).
pub fn ray_intersection(ao: &Point, ad: &Point, bo: &Point, bd: &Point) -> Option<Point> {
    let dx = bo.x - ao.x;
    let dy = bo.y - ao.y;
    let det = bd.x * ad.y - bd.y * ad.x;
    if det == OrderedFloat(0.0) {
        return None;
    }

    let u = (dy * bd.x - dx * bd.y) / det;
    let v = (dy * ad.x - dx * ad.y) / det;
    if u.signum() != v.signum() {
        return None;
    }

    Some((ad * u) + ao)
}

pub fn distance(a: &Point, b: &Point) -> OrderedFloat<f64> {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    OrderedFloat((dx * dx + dy * dy).into_inner().max(0.0).sqrt())
}

/// The x where the arcs rooted at foci `l` and `r` cross, at sweep-line `yl`.
pub fn breakpoint_at_x(l: &Point, r: &Point, yl: OrderedFloat<f64>) -> OrderedFloat<f64> {
    let ax = l.x;
    let bx = r.x;
    let ay = l.y;
    let by = r.y;

    // shift frames so the sweep line sits at 0
    let bx_s = bx - ax;
    let ay_s = ay - yl;
    let by_s = by - yl;

    let discrim = (ay_s * by_s * ((ay_s - by_s) * (ay_s - by_s) + bx_s * bx_s))
        .into_inner()
        .max(0.0);
    let numer = ay_s * bx_s - OrderedFloat(discrim.sqrt());
    let denom = ay_s - by_s;

    let mut x_bp = if denom != 0.0 {
        numer / denom
    } else {
        bx_s / 2.
    };
    x_bp += ax; // shift back to the original frame

    x_bp
}

/// The point on the arc with focus `focus`, at sweep-line `yl`, with x
/// coordinate `x`.
pub fn point_on_arc_at_x(focus: &Point, yl: OrderedFloat<f64>, x: OrderedFloat<f64>) -> Point {
    let xf = focus.x;
    let yf = focus.y;

    let dx = x - xf;
    let dx2 = dx * dx;
    let dy = yf - yl;

    if dy == 0.0 {
        Point::new((focus.x + x) / 2.0, yl)
    } else {
        Point::new(x, dx2 / (dy * 2.0) + (yf + yl) / 2.0)
    }
}

pub fn bounded_segment(origin: &Point, direction: &Point, bounding_box: &BoundingBox) -> Segment {
    let x_min = bounding_box.x_min;
    let x_max = bounding_box.x_max;
    let y_min = bounding_box.y_min;
    let y_max = bounding_box.y_max;

    let x = origin.x;
    let y = origin.y;
    let dx = direction.x;
    let dy = direction.y;

    let cx: OrderedFloat<f64> = if dx == OrderedFloat(0.0) {
        0.0.into()
    } else if dx < OrderedFloat(0.0) {
        (x_min - x) / dx
    } else {
        (x_max - x) / dx
    };

    let cy: OrderedFloat<f64> = if dy == OrderedFloat(0.0) {
        0.0.into()
    } else if dy < OrderedFloat(0.0) {
        (y_min - y) / dy
    } else {
        (y_max - y) / dy
    };

    let c = if dx == OrderedFloat(0.0) {
        cy
    } else if dy == OrderedFloat(0.0) {
        cx
    } else {
        min(cx, cy)
    };
    let destination = Point {
        x: x + c * dx,
        y: y + c * dy,
    };

    [*origin, destination]
}

/// Closed-form segment/segment intersection with a relative safety band:
/// a crossing within `band` (relative to each segment's own length) of any
/// of the four endpoints is rejected as too close to call.
pub fn segment_intersection(a: Segment, b: Segment, band: f64) -> Option<Point> {
    let (p, r) = (a[0], a[1] - a[0]);
    let (q, s) = (b[0], b[1] - b[0]);

    let r_cross_s = (r.x * s.y - r.y * s.x).into_inner();
    if r_cross_s.abs() < f64::EPSILON {
        return None; // parallel or collinear
    }

    let qp = q - p;
    let t = (qp.x * s.y - qp.y * s.x).into_inner() / r_cross_s;
    let u = (qp.x * r.y - qp.y * r.x).into_inner() / r_cross_s;

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    if t < band || t > 1.0 - band || u < band || u > 1.0 - band {
        return None;
    }

    Some(p + r * OrderedFloat(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_vertical() {
        let bbox = BoundingBox::new(0.0.into(), 1000.0.into(), 0.0.into(), 1000.0.into());

        let origin = Point::new(500.0.into(), 500.0.into());
        let direction = Point::new(0.0.into(), 500.0.into());

        let gold = [
            Point::new(500.0.into(), 500.0.into()),
            Point::new(500.0.into(), 1000.0.into()),
        ];

        let seg = bounded_segment(&origin, &direction, &bbox);
        assert_eq!(seg[0], gold[0]);
        assert_eq!(seg[1], gold[1]);
    }

    #[test]
    fn circumcenter_collinear_is_none() {
        let a = Point::from_f64(0.0, 0.0);
        let b = Point::from_f64(1.0, 0.0);
        let c = Point::from_f64(2.0, 0.0);
        assert!(circumcenter(&a, &b, &c).is_none());
    }

    #[test]
    fn segment_intersection_basic() {
        let a: Segment = [Point::from_f64(0.0, 0.0), Point::from_f64(2.0, 2.0)];
        let b: Segment = [Point::from_f64(0.0, 2.0), Point::from_f64(2.0, 0.0)];
        let hit = segment_intersection(a, b, 0.01).expect("should cross");
        assert!((hit.x.into_inner() - 1.0).abs() < 1e-9);
        assert!((hit.y.into_inner() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn segment_intersection_rejects_near_endpoint() {
        let a: Segment = [Point::from_f64(0.0, 0.0), Point::from_f64(10.0, 0.0)];
        let b: Segment = [Point::from_f64(0.05, -1.0), Point::from_f64(0.05, 1.0)];
        assert!(segment_intersection(a, b, 0.01).is_none());
    }
}
