use glam::{vec2, Vec2};

/// A rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Rect {
    /// The position of the top-left corner
    /// of this rectangle.
    pub pos: Vec2,
    /// The side lengths of this rectangle.
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(vec2(x, y), vec2(width, height))
    }

    /// The bottom-right corner.
    pub fn max(self) -> Vec2 {
        self.pos + self.size
    }

    pub fn is_empty(self) -> bool {
        self.size.x <= 0. || self.size.y <= 0.
    }

    pub fn contains(self, pos: Vec2) -> bool {
        pos.x >= self.pos.x
            && pos.y >= self.pos.y
            && pos.x < (self.pos.x + self.size.x)
            && pos.y < (self.pos.y + self.size.y)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(self, other: Rect) -> Self {
        let min = self.pos.min(other.pos);
        let max = self.max().max(other.max());
        Self {
            pos: min,
            size: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_spans_both() {
        let a = Rect::from_xywh(2., 2., 4., 4.);
        let b = Rect::from_xywh(10., 0., 2., 3.);
        assert_eq!(a.union(b), Rect::from_xywh(2., 0., 10., 6.));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::from_xywh(0., 0., 10., 10.);
        assert!(r.contains(vec2(0., 0.)));
        assert!(!r.contains(vec2(10., 5.)));
    }
}
