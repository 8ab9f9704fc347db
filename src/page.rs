//! Decoded page leaves.

use crate::geometry::PageBox;
use crate::object::{Dictionary, Value};

/// A leaf of the page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// 1-based position in the page list
    pub number: usize,
    /// Page dictionary as decoded
    pub dictionary: Dictionary,
}

impl PdfPage {
    /// Create a page.
    pub fn new(number: usize, dictionary: Dictionary) -> Self {
        Self { number, dictionary }
    }

    /// Look up a key on the page dictionary itself (no inheritance).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.dictionary.get(key)
    }

    /// `/Type` of the page dictionary.
    pub fn type_name(&self) -> Option<&str> {
        self.get("/Type").and_then(Value::as_name)
    }
}

/// Convert a `[x0 y0 x1 y1]` array into a scaled box.
///
/// Returns `None` unless the array holds exactly four numbers. Integers and
/// reals are both accepted.
pub fn box_from_array(values: &[Value], scale: f64) -> Option<PageBox> {
    let [x0, y0, x1, y1] = values else {
        return None;
    };
    Some(PageBox::from_corners(
        x0.as_number()?,
        y0.as_number()?,
        x1.as_number()?,
        y1.as_number()?,
        scale,
    ))
}

/// Normalise a `/Rotate` value to 0, 90, 180 or 270.
///
/// Values that are not multiples of 90 are rounded down to one.
pub fn normalize_rotation(degrees: i64) -> i64 {
    degrees.rem_euclid(360) / 90 * 90
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::object::Token;

    #[test]
    fn test_box_from_mixed_numbers() {
        let values = [
            Value::Numeric(0),
            Value::Real(0.5),
            Value::Numeric(100),
            Value::Real(50.5),
        ];
        let b = box_from_array(&values, 1.0).unwrap();
        assert_eq!(b.position, Point::new(0.0, 0.5));
        assert_eq!(b.size, Size::new(100.0, 50.0));
    }

    #[test]
    fn test_box_from_malformed_array() {
        assert!(box_from_array(&[Value::Numeric(0), Value::Numeric(0), Value::Numeric(1)], 1.0).is_none());
        let with_name = [
            Value::Numeric(0),
            Value::Numeric(0),
            Value::Token(Token::from("/X")),
            Value::Numeric(1),
        ];
        assert!(box_from_array(&with_name, 1.0).is_none());
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(90), 90);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(100), 90);
    }

    #[test]
    fn test_page_type() {
        let mut dict = Dictionary::new();
        dict.insert("/Type".to_string(), Value::Token(Token::from("/Page")));
        let page = PdfPage::new(1, dict);
        assert_eq!(page.type_name(), Some("/Page"));
        assert!(page.get("/MediaBox").is_none());
    }
}
