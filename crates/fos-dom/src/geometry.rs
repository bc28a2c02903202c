//! Geometry APIs
//!
//! DOMRect, getBoundingClientRect and the window scroll offset.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create empty rect
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
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

    /// A rect without area produces no layout box.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    /// Same rect shifted by an offset
    pub fn translate(&self, dx: f64, dy: f64) -> DOMRect {
        DOMRect::from_xywh(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Window scroll position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

impl ScrollOffset {
    /// Scroll to position, clamped at the document origin
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.left = x.max(0.0);
        self.top = y.max(0.0);
    }

    /// Scroll by amount
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.left + dx, self.top + dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let rect = DOMRect::from_xywh(-40.0, 1200.0, 320.0, 240.0);

        assert_eq!(rect.left(), -40.0);
        assert_eq!(rect.right(), 280.0);
        assert_eq!(rect.top(), 1200.0);
        assert_eq!(rect.bottom(), 1440.0);
    }

    #[test]
    fn test_translate_keeps_size() {
        let rect = DOMRect::from_xywh(0.0, 1000.0, 10.0, 10.0).translate(0.0, -400.0);
        assert_eq!(rect, DOMRect::from_xywh(0.0, 600.0, 10.0, 10.0));
    }

    #[test]
    fn test_empty_box() {
        assert!(DOMRect::new().is_empty());
        assert!(!DOMRect::from_xywh(0.0, 0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_scroll_clamps_at_origin() {
        let mut offset = ScrollOffset::default();
        offset.scroll_by(0.0, 300.0);
        offset.scroll_by(-50.0, -500.0);
        assert_eq!(offset, ScrollOffset { left: 0.0, top: 0.0 });
    }
}
