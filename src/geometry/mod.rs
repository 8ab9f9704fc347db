//! Page box geometry.
//!
//! Boxes are read from `[x0 y0 x1 y1]` coordinate arrays in default user
//! space and divided by a caller supplied scale factor (e.g. points per
//! millimetre) to convert them to output units.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A 2D point in output units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_import::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in output units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Size {
    /// Create a new size.
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// One page box after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageBox {
    /// Lower-left corner (minimum x, minimum y)
    pub position: Point,
    /// Absolute extent along each axis
    pub size: Size,
    /// Same as `position`
    pub lower_left: Point,
    /// Maximum x, maximum y
    pub upper_right: Point,
}

impl PageBox {
    /// Build a box from two opposite corners and a scale factor.
    ///
    /// The corners do not need to be sorted: `[200 0 0 300]` and
    /// `[0 0 200 300]` describe the same box.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_import::geometry::{PageBox, Point, Size};
    ///
    /// let b = PageBox::from_corners(200.0, 0.0, 0.0, 300.0, 1.0);
    /// assert_eq!(b.position, Point::new(0.0, 0.0));
    /// assert_eq!(b.size, Size::new(200.0, 300.0));
    /// assert_eq!(b.upper_right, Point::new(200.0, 300.0));
    /// ```
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64, scale: f64) -> Self {
        let lower_left = Point::new(x0.min(x1) / scale, y0.min(y1) / scale);
        Self {
            position: lower_left,
            size: Size::new((x1 - x0).abs() / scale, (y1 - y0).abs() / scale),
            lower_left,
            upper_right: Point::new(x0.max(x1) / scale, y0.max(y1) / scale),
        }
    }

    /// Width in output units.
    pub fn width(&self) -> f64 {
        self.size.w
    }

    /// Height in output units.
    pub fn height(&self) -> f64 {
        self.size.h
    }
}

/// The five page boundary boxes.
///
/// PDF Spec: ISO 32000-1:2008, Section 14.11.2 - Page Boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BoxType {
    /// Physical medium
    MediaBox,
    /// Visible region
    CropBox,
    /// Clipping region for production output
    BleedBox,
    /// Finished page after trimming
    TrimBox,
    /// Meaningful content
    ArtBox,
}

impl BoxType {
    /// All box types in lookup order.
    pub const ALL: [BoxType; 5] = [
        BoxType::MediaBox,
        BoxType::CropBox,
        BoxType::BleedBox,
        BoxType::TrimBox,
        BoxType::ArtBox,
    ];

    /// Dictionary key of this box, with its leading slash.
    pub fn key(self) -> &'static str {
        match self {
            BoxType::MediaBox => "/MediaBox",
            BoxType::CropBox => "/CropBox",
            BoxType::BleedBox => "/BleedBox",
            BoxType::TrimBox => "/TrimBox",
            BoxType::ArtBox => "/ArtBox",
        }
    }

    /// Box name without the slash.
    pub fn name(self) -> &'static str {
        &self.key()[1..]
    }

    /// Parse a box name, with or without the leading slash.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix('/').unwrap_or(name);
        Self::ALL.into_iter().find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Box used when this one is absent.
    ///
    /// Bleed, trim and art boxes default to the crop box, which defaults to
    /// the media box.
    pub fn fallback(self) -> Option<Self> {
        match self {
            BoxType::MediaBox => None,
            BoxType::CropBox => Some(BoxType::MediaBox),
            BoxType::BleedBox | BoxType::TrimBox | BoxType::ArtBox => Some(BoxType::CropBox),
        }
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boxes found for one page, tagged with the default box name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBoxes {
    /// Default box name
    pub default_box: BoxType,
    /// Boxes present on the page or inherited from its ancestors
    pub boxes: IndexMap<BoxType, PageBox>,
}

impl PageBoxes {
    /// Create an empty set.
    pub fn new(default_box: BoxType) -> Self {
        Self {
            default_box,
            boxes: IndexMap::new(),
        }
    }

    /// Box of exactly this type.
    pub fn get(&self, box_type: BoxType) -> Option<&PageBox> {
        self.boxes.get(&box_type)
    }

    /// Box of this type, or the box it falls back to when absent.
    pub fn effective(&self, box_type: BoxType) -> Option<&PageBox> {
        let mut current = Some(box_type);
        while let Some(b) = current {
            if let Some(found) = self.boxes.get(&b) {
                return Some(found);
            }
            current = b.fallback();
        }
        None
    }

    /// Record a box.
    pub fn insert(&mut self, box_type: BoxType, page_box: PageBox) {
        self.boxes.insert(box_type, page_box);
    }

    /// Number of boxes present.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no box was found.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_sorted_corners() {
        let b = PageBox::from_corners(0.0, 0.0, 612.0, 792.0, 1.0);
        assert_eq!(b.position, Point::new(0.0, 0.0));
        assert_eq!(b.width(), 612.0);
        assert_eq!(b.height(), 792.0);
        assert_eq!(b.lower_left, b.position);
        assert_eq!(b.upper_right, Point::new(612.0, 792.0));
    }

    #[test]
    fn test_box_from_unsorted_corners() {
        let b = PageBox::from_corners(200.0, 300.0, 10.0, 20.0, 1.0);
        assert_eq!(b.position, Point::new(10.0, 20.0));
        assert_eq!(b.size, Size::new(190.0, 280.0));
        assert_eq!(b.upper_right, Point::new(200.0, 300.0));
    }

    #[test]
    fn test_box_scaling() {
        let b = PageBox::from_corners(0.0, 0.0, 200.0, 300.0, 2.0);
        assert_eq!(b.size, Size::new(100.0, 150.0));
        assert_eq!(b.upper_right, Point::new(100.0, 150.0));
    }

    #[test]
    fn test_box_type_names() {
        assert_eq!(BoxType::MediaBox.key(), "/MediaBox");
        assert_eq!(BoxType::ArtBox.name(), "ArtBox");
        assert_eq!(BoxType::from_name("/TrimBox"), Some(BoxType::TrimBox));
        assert_eq!(BoxType::from_name("cropbox"), Some(BoxType::CropBox));
        assert_eq!(BoxType::from_name("/Rotate"), None);
    }

    #[test]
    fn test_effective_fallback_chain() {
        let media = PageBox::from_corners(0.0, 0.0, 100.0, 100.0, 1.0);
        let crop = PageBox::from_corners(10.0, 10.0, 90.0, 90.0, 1.0);

        let mut boxes = PageBoxes::new(BoxType::CropBox);
        boxes.insert(BoxType::MediaBox, media);
        assert_eq!(boxes.effective(BoxType::TrimBox), Some(&media));
        assert_eq!(boxes.get(BoxType::TrimBox), None);

        boxes.insert(BoxType::CropBox, crop);
        assert_eq!(boxes.effective(BoxType::BleedBox), Some(&crop));
        assert_eq!(boxes.effective(BoxType::MediaBox), Some(&media));
    }

    #[test]
    fn test_empty_boxes() {
        let boxes = PageBoxes::new(BoxType::CropBox);
        assert!(boxes.is_empty());
        assert_eq!(boxes.effective(BoxType::ArtBox), None);
    }
}
