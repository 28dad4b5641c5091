use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Minimal box covering every input box, in the same coordinate space.
    /// Returns `None` for an empty input.
    pub fn covering<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;

        let (mut left, mut top, mut right, mut bottom) =
            (first.left, first.top, first.right(), first.bottom());

        for bbox in iter {
            left = left.min(bbox.left);
            top = top.min(bbox.top);
            right = right.max(bbox.right());
            bottom = bottom.max(bbox.bottom());
        }

        Some(BoundingBox::new(left, top, right - left, bottom - top))
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}
