//! Viewport ↔ PDF coordinate conversion
//!
//! The editor works in viewport space (pixels, origin top-left) while PDF
//! content is placed in PDF space (points, origin bottom-left). A single
//! uniform scale factor, derived from the page widths, converts every
//! distance between the two.

use serde::{Deserialize, Serialize};

/// Padding the editor keeps between its canvas and the surrounding container
pub const CONTAINER_PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once both dimensions have been measured
    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Rectangle in viewport space, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewportRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in PDF space, anchored at its top-left corner.
///
/// `top` is measured from the bottom of the page, so the rectangle spans
/// `top - height ..= top` vertically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PdfBox {
    pub x: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfBox {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top - self.height / 2.0
    }
}

/// True page size in points plus the size the preview rendered it at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageGeometry {
    pub true_size: Size,
    pub viewport: Size,
}

impl PageGeometry {
    pub fn new(true_size: Size, viewport: Size) -> Self {
        Self {
            true_size,
            viewport,
        }
    }

    pub fn scale(&self) -> f64 {
        resolve_scale(self.viewport.width, self.true_size.width)
    }

    /// Map a viewport rectangle onto the page
    pub fn to_pdf(&self, rect: ViewportRect) -> PdfBox {
        scale_rect(rect, self.true_size.height, self.scale())
    }
}

/// Ratio converting one viewport pixel into PDF points.
///
/// Falls back to identity while the preview has not been measured yet.
pub fn resolve_scale(viewport_width: f64, true_width: f64) -> f64 {
    if viewport_width == 0.0 {
        return 1.0;
    }
    true_width / viewport_width
}

/// Map a viewport point (top-left origin) to PDF space (bottom-left origin)
pub fn dom_to_pdf(point: Point, true_height: f64, scale: f64) -> Point {
    Point {
        x: point.x * scale,
        y: true_height - point.y * scale,
    }
}

/// Inverse of [`dom_to_pdf`]
pub fn pdf_to_dom(point: Point, true_height: f64, scale: f64) -> Point {
    Point {
        x: point.x / scale,
        y: (true_height - point.y) / scale,
    }
}

/// Convert a viewport rectangle: the corner goes through [`dom_to_pdf`],
/// the extents are only scaled.
pub fn scale_rect(rect: ViewportRect, true_height: f64, scale: f64) -> PdfBox {
    let corner = dom_to_pdf(
        Point {
            x: rect.x,
            y: rect.y,
        },
        true_height,
        scale,
    );
    PdfBox {
        x: corner.x,
        top: corner.y,
        width: rect.width * scale,
        height: rect.height * scale,
    }
}

/// Largest size with the page's aspect ratio that fits inside `container`
/// after removing [`CONTAINER_PADDING`]. Returns `None` until both the page
/// and the container have been measured.
pub fn fit_to_container(page: Size, container: Size) -> Option<Size> {
    if !page.is_measured() || !container.is_measured() {
        return None;
    }

    let avail_w = container.width - CONTAINER_PADDING;
    let avail_h = container.height - CONTAINER_PADDING;
    if avail_w <= 0.0 || avail_h <= 0.0 {
        return None;
    }

    let page_ratio = page.width / page.height;
    let avail_ratio = avail_w / avail_h;

    // Limited by height when the container is wider than the page
    let fitted = if avail_ratio > page_ratio {
        Size::new(avail_h * page_ratio, avail_h)
    } else {
        Size::new(avail_w, avail_w / page_ratio)
    };
    Some(fitted)
}
