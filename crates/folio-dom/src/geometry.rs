//! Geometry
//!
//! Rectangles in CSS pixels and the scrolled viewport they are tested
//! against. Rects handed out by layout providers are in document
//! coordinates; [`Viewport::to_client`] converts them to the
//! `getBoundingClientRect` frame.

/// Rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create with dimensions
    pub const fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge (same as y)
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Left edge (same as x)
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Check if rects intersect (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Get intersection rect
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Rect::from_xywh(x, y, right - x, bottom - y))
    }
}

/// The visible window onto the document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    /// Vertical scroll offset of the document
    pub scroll_y: f64,
    /// Inner width
    pub width: f64,
    /// Inner height
    pub height: f64,
}

impl Viewport {
    pub const fn new(scroll_y: f64, width: f64, height: f64) -> Self {
        Self { scroll_y, width, height }
    }

    /// Convert a document-space rect into client (viewport-relative) space
    pub fn to_client(&self, rect: Rect) -> Rect {
        Rect { y: rect.y - self.scroll_y, ..rect }
    }

    /// Client-space rect of the viewport itself
    pub fn client_rect(&self) -> Rect {
        Rect::from_xywh(0.0, 0.0, self.width, self.height)
    }

    /// Width divided by height (1.0 for degenerate viewports)
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 && self.width > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);

        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.left(), 10.0);
    }

    #[test]
    fn test_intersects() {
        let rect1 = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let rect2 = Rect::from_xywh(50.0, 50.0, 100.0, 100.0);
        let rect3 = Rect::from_xywh(200.0, 200.0, 50.0, 50.0);
        let touching = Rect::from_xywh(100.0, 0.0, 10.0, 10.0);

        assert!(rect1.intersects(&rect2));
        assert!(!rect1.intersects(&rect3));
        assert!(!rect1.intersects(&touching));
        assert_eq!(
            rect1.intersection(&rect2),
            Some(Rect::from_xywh(50.0, 50.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_viewport_to_client() {
        let vp = Viewport::new(300.0, 1280.0, 800.0);
        let rect = Rect::from_xywh(0.0, 900.0, 1280.0, 400.0);
        assert_eq!(vp.to_client(rect).top(), 600.0);
        assert!((vp.aspect_ratio() - 1.6).abs() < 1e-9);
    }
}
