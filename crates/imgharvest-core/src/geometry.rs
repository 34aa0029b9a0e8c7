/// A point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current transformation matrix `[a b c d e f]`.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, as defined for the
/// `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ctm {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Build a matrix from a 6-element slice, returning `None` for any other length.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    /// Returns `self × other`: apply `self` first, then `other`.
    ///
    /// A `cm` operand `m` updates the CTM to `m.concat(&ctm)`.
    pub fn concat(&self, other: &Ctm) -> Ctm {
        Ctm {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }
}

/// Bounding box with top-left origin coordinate system.
///
/// - `x0`: left edge
/// - `top`: top edge (distance from top of page)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from top of page)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Map the unit square through `ctm` and return its bounds in top-left
/// origin coordinates.
///
/// Image XObjects are painted into `(0,0)-(1,1)`; the CTM active at the `Do`
/// operator places that square on the page. `page_height` flips the y axis.
pub fn placement_from_ctm(ctm: &Ctm, page_height: f64) -> BBox {
    let corners = [
        ctm.transform_point(Point::new(0.0, 0.0)),
        ctm.transform_point(Point::new(1.0, 0.0)),
        ctm.transform_point(Point::new(0.0, 1.0)),
        ctm.transform_point(Point::new(1.0, 1.0)),
    ];

    let x0 = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let x1 = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let y0 = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let y1 = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    BBox::new(x0, page_height - y1, x1, page_height - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BBox::new(10.0, 20.0, 50.0, 60.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_ctm_identity_transform() {
        let p = Ctm::identity().transform_point(Point::new(3.0, 4.0));
        assert_eq!(p, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_ctm_concat_scale_then_translate() {
        let scale = Ctm::new(2.0, 0.0, 0.0, 3.0, 0.0, 0.0);
        let translate = Ctm::new(1.0, 0.0, 0.0, 1.0, 10.0, 20.0);
        let combined = scale.concat(&translate);
        let p = combined.transform_point(Point::new(1.0, 1.0));
        assert_approx(p.x, 12.0);
        assert_approx(p.y, 23.0);
    }

    #[test]
    fn test_ctm_from_slice_rejects_wrong_length() {
        assert!(Ctm::from_slice(&[1.0, 0.0, 0.0, 1.0]).is_none());
        assert_eq!(
            Ctm::from_slice(&[1.0, 0.0, 0.0, 1.0, 5.0, 6.0]),
            Some(Ctm::new(1.0, 0.0, 0.0, 1.0, 5.0, 6.0))
        );
    }

    #[test]
    fn test_placement_from_ctm_flips_y() {
        // 200x150 image at (100, 500) on a 792pt page
        let ctm = Ctm::new(200.0, 0.0, 0.0, 150.0, 100.0, 500.0);
        let bbox = placement_from_ctm(&ctm, 792.0);
        assert_approx(bbox.x0, 100.0);
        assert_approx(bbox.x1, 300.0);
        assert_approx(bbox.top, 142.0);
        assert_approx(bbox.bottom, 292.0);
    }

    #[test]
    fn test_placement_from_ctm_mirrored() {
        // Negative scale still yields a normalized box
        let ctm = Ctm::new(-100.0, 0.0, 0.0, -50.0, 300.0, 400.0);
        let bbox = placement_from_ctm(&ctm, 600.0);
        assert_approx(bbox.x0, 200.0);
        assert_approx(bbox.x1, 300.0);
        assert_approx(bbox.top, 200.0);
        assert_approx(bbox.bottom, 250.0);
    }
}
