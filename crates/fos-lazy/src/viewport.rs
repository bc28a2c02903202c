//! Viewport Oracle
//!
//! Decides whether an element's bounding box touches the loadable area:
//! the viewport grown by the threshold on every side, optionally tested on
//! one axis only.

use fos_dom::{DOMRect, Document};

use crate::ScrollDirection;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Check a viewport-relative rectangle against the loadable area.
#[inline]
pub fn is_in_loadable_area(
    rect: &DOMRect,
    viewport: ViewportSize,
    threshold: f64,
    direction: ScrollDirection,
) -> bool {
    let vertical = || viewport.height + threshold > rect.top() && -threshold < rect.bottom();
    let horizontal = || viewport.width + threshold > rect.left() && -threshold < rect.right();

    match direction {
        ScrollDirection::Vertical => vertical(),
        ScrollDirection::Horizontal => horizontal(),
        ScrollDirection::Both => vertical() && horizontal(),
    }
}

/// Remembers the viewport size between scans.
///
/// Measuring is a layout query; a scan over hundreds of candidates reads it
/// once. Resize events must call [`ViewportCache::invalidate`].
#[derive(Debug, Default)]
pub struct ViewportCache {
    size: Option<ViewportSize>,
}

impl ViewportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached size, measuring the document on a miss
    pub fn get(&mut self, document: &Document) -> ViewportSize {
        *self.size.get_or_insert_with(|| {
            let (width, height) = document.viewport_size();
            tracing::trace!("measured viewport {}x{}", width, height);
            ViewportSize::new(width, height)
        })
    }

    pub fn invalidate(&mut self) {
        self.size = None;
    }

    pub fn is_cached(&self) -> bool {
        self.size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: ViewportSize = ViewportSize::new(1024.0, 800.0);

    fn rect_at(top: f64) -> DOMRect {
        DOMRect::from_xywh(0.0, top, 100.0, 100.0)
    }

    #[test]
    fn test_below_threshold_is_not_loadable() {
        // 800 + 500 > 2000 fails
        assert!(!is_in_loadable_area(&rect_at(2000.0), VIEWPORT, 500.0, ScrollDirection::Both));
        assert!(is_in_loadable_area(&rect_at(1000.0), VIEWPORT, 500.0, ScrollDirection::Both));
    }

    #[test]
    fn test_threshold_edges_are_exclusive() {
        assert!(!is_in_loadable_area(&rect_at(1300.0), VIEWPORT, 500.0, ScrollDirection::Vertical));
        assert!(is_in_loadable_area(&rect_at(1299.0), VIEWPORT, 500.0, ScrollDirection::Vertical));

        // scrolled past: bottom = -500 is outside, -499 inside
        assert!(!is_in_loadable_area(&rect_at(-600.0), VIEWPORT, 500.0, ScrollDirection::Vertical));
        assert!(is_in_loadable_area(&rect_at(-599.0), VIEWPORT, 500.0, ScrollDirection::Vertical));
    }

    #[test]
    fn test_axis_selection() {
        let right_of_view = DOMRect::from_xywh(3000.0, 10.0, 100.0, 100.0);

        assert!(is_in_loadable_area(&right_of_view, VIEWPORT, 0.0, ScrollDirection::Vertical));
        assert!(!is_in_loadable_area(&right_of_view, VIEWPORT, 0.0, ScrollDirection::Horizontal));
        assert!(!is_in_loadable_area(&right_of_view, VIEWPORT, 0.0, ScrollDirection::Both));
    }

    #[test]
    fn test_cache_measures_once() {
        let mut doc = Document::new("about:blank");
        doc.set_viewport_size(800.0, 600.0);

        let mut cache = ViewportCache::new();
        assert_eq!(cache.get(&doc), ViewportSize::new(800.0, 600.0));

        doc.set_viewport_size(400.0, 300.0);
        assert_eq!(cache.get(&doc), ViewportSize::new(800.0, 600.0));

        cache.invalidate();
        assert!(!cache.is_cached());
        assert_eq!(cache.get(&doc), ViewportSize::new(400.0, 300.0));
    }
}
