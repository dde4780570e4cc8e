//! Corner collection for the calibration rectangle.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::ImagePoint;

/// The four corners of the calibration rectangle, in pick order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerId {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl CornerId {
    /// Pick order: top-left, top-right, bottom-right, bottom-left.
    pub const ALL: [CornerId; 4] = [
        CornerId::TopLeft,
        CornerId::TopRight,
        CornerId::BottomRight,
        CornerId::BottomLeft,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            CornerId::TopLeft => 0,
            CornerId::TopRight => 1,
            CornerId::BottomRight => 2,
            CornerId::BottomLeft => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CornerId::TopLeft => "top-left",
            CornerId::TopRight => "top-right",
            CornerId::BottomRight => "bottom-right",
            CornerId::BottomLeft => "bottom-left",
        }
    }
}

/// Ordered collection of up to four corner picks.
#[derive(Clone, Debug, Default)]
pub struct CalibrationQuad {
    corners: Vec<ImagePoint>,
}

impl CalibrationQuad {
    pub fn new() -> Self {
        Self {
            corners: Vec::with_capacity(4),
        }
    }

    /// Append the next corner in pick order.
    pub fn push(&mut self, p: ImagePoint) -> Result<(), CalibrationError> {
        if self.corners.len() >= 4 {
            return Err(CalibrationError::Incomplete {
                corners: self.corners.len(),
            });
        }
        self.corners.push(p);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.corners.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.corners.len() == 4
    }

    /// Which corner the next `push` will define, `None` once complete.
    pub fn next_corner(&self) -> Option<CornerId> {
        CornerId::ALL.get(self.corners.len()).copied()
    }

    #[inline]
    pub fn corners(&self) -> &[ImagePoint] {
        &self.corners
    }

    pub fn as_array(&self) -> Option<[ImagePoint; 4]> {
        self.corners.as_slice().try_into().ok()
    }
}

/// Sort four free-order picks into the canonical top-left, top-right,
/// bottom-right, bottom-left order.
///
/// The picks are split into the two upper and the two lower points by
/// vertical position, then each pair is ordered left to right. Ties keep
/// the original pick order.
pub fn canonical_corner_order(pts: [ImagePoint; 4]) -> [ImagePoint; 4] {
    let mut by_y = pts;
    by_y.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut top = [by_y[0], by_y[1]];
    let mut bottom = [by_y[2], by_y[3]];
    top.sort_by(|a, b| a.x.total_cmp(&b.x));
    bottom.sort_by(|a, b| a.x.total_cmp(&b.x));

    [top[0], top[1], bottom[1], bottom[0]]
}

/// True when any three of the four points are collinear within `eps`,
/// measured as twice the triangle area relative to the squared span of the
/// point set. Four coincident picks count as collinear.
pub fn has_collinear_triple(pts: &[ImagePoint; 4], eps: f64) -> bool {
    let span2 = span_squared(pts);
    if span2 <= 0.0 {
        return true;
    }
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let ab = pts[j] - pts[i];
        let ac = pts[k] - pts[i];
        let cross = ab.x * ac.y - ab.y * ac.x;
        cross.abs() <= eps * span2
    })
}

/// Largest squared distance between any two of the four points.
pub(crate) fn span_squared(pts: &[ImagePoint; 4]) -> f64 {
    let mut m = 0.0_f64;
    for i in 0..4 {
        for j in i + 1..4 {
            m = m.max((pts[j] - pts[i]).norm_squared());
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> ImagePoint {
        ImagePoint::new(x, y)
    }

    #[test]
    fn picks_advance_through_the_declared_order() {
        let mut quad = CalibrationQuad::new();
        assert_eq!(quad.next_corner(), Some(CornerId::TopLeft));

        quad.push(p(0.0, 0.0)).unwrap();
        assert_eq!(quad.next_corner(), Some(CornerId::TopRight));
        quad.push(p(10.0, 0.0)).unwrap();
        assert_eq!(quad.next_corner(), Some(CornerId::BottomRight));
        quad.push(p(10.0, 5.0)).unwrap();
        assert_eq!(quad.next_corner(), Some(CornerId::BottomLeft));
        quad.push(p(0.0, 5.0)).unwrap();

        assert!(quad.is_complete());
        assert_eq!(quad.next_corner(), None);
        assert!(quad.as_array().is_some());
    }

    #[test]
    fn fifth_pick_is_rejected_until_cleared() {
        let mut quad = CalibrationQuad::new();
        for i in 0..4 {
            quad.push(p(i as f64, 0.0)).unwrap();
        }
        assert_eq!(
            quad.push(p(9.0, 9.0)),
            Err(CalibrationError::Incomplete { corners: 4 })
        );

        quad.clear();
        assert!(quad.is_empty());
        quad.push(p(1.0, 2.0)).unwrap();
        assert_eq!(quad.len(), 1);
    }

    #[test]
    fn canonical_order_untangles_shuffled_picks() {
        let tl = p(12.0, 15.0);
        let tr = p(310.0, 22.0);
        let br = p(325.0, 240.0);
        let bl = p(8.0, 230.0);

        for shuffled in [
            [br, tl, bl, tr],
            [bl, br, tr, tl],
            [tl, tr, br, bl],
            [tr, bl, tl, br],
        ] {
            assert_eq!(canonical_corner_order(shuffled), [tl, tr, br, bl]);
        }
    }

    #[test]
    fn collinear_triples_are_detected() {
        let line = [p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0), p(30.0, 40.0)];
        assert!(has_collinear_triple(&line, 1e-6));

        let coincident = [p(5.0, 5.0); 4];
        assert!(has_collinear_triple(&coincident, 1e-6));

        let square = [p(0.0, 0.0), p(100.0, 0.0), p(100.0, 100.0), p(0.0, 100.0)];
        assert!(!has_collinear_triple(&square, 1e-6));
    }

    #[test]
    fn corner_id_serializes_as_snake_case() {
        let s = serde_json::to_string(&CornerId::BottomLeft).unwrap();
        assert_eq!(s, "\"bottom_left\"");
        let back: CornerId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, CornerId::BottomLeft);
        assert_eq!(CornerId::BottomLeft.index(), 3);
    }
}
