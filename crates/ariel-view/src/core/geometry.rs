//! View box geometry
//!
//! A [`ViewBox`] is the region of a graphic's intrinsic coordinate space that
//! is mapped onto the display. The `viewBox` attribute grammar is a list of
//! numbers separated by whitespace and/or commas.

use chumsky::prelude::*;
use kurbo::{Point, Rect};
use serde::Serialize;
use std::fmt;

/// A rectangle in a graphic's intrinsic coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box anchored at the origin
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when both dimensions are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Replace unusable components: non-finite origins become 0, zero,
    /// negative or non-finite dimensions become 1.
    pub fn sanitized(self) -> Self {
        let origin = |v: f64| if v.is_finite() { v } else { 0.0 };
        let extent = |v: f64| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        Self::new(
            origin(self.x),
            origin(self.y),
            extent(self.width),
            extent(self.height),
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

fn view_box_tokens<'src>() -> impl Parser<'src, &'src str, Vec<&'src str>> + Clone {
    let separator = one_of(" \t\n\r,").repeated().at_least(1);
    let token = none_of(" \t\n\r,").repeated().at_least(1).to_slice();

    token
        .separated_by(separator)
        .allow_leading()
        .allow_trailing()
        .collect::<Vec<&str>>()
        .then_ignore(end())
}

/// Parse a `viewBox` attribute value.
///
/// Returns `None` only for an empty attribute; any other value, even blank,
/// is explicit. Missing trailing entries default to `0 0 1 1`, unparsable
/// numbers become NaN, and the result is sanitized so the box is always usable.
pub fn parse_view_box(attr: &str) -> Option<ViewBox> {
    if attr.is_empty() {
        return None;
    }
    let tokens = view_box_tokens()
        .parse(attr)
        .into_result()
        .unwrap_or_default();

    let number = |index: usize, default: f64| {
        tokens
            .get(index)
            .map(|token| token.parse::<f64>().unwrap_or(f64::NAN))
            .unwrap_or(default)
    };

    Some(
        ViewBox::new(number(0, 0.0), number(1, 0.0), number(2, 1.0), number(3, 1.0)).sanitized(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_separated() {
        let vb = parse_view_box("0 0 240 120").unwrap();
        assert_eq!(vb, ViewBox::new(0.0, 0.0, 240.0, 120.0));
    }

    #[test]
    fn test_parse_comma_and_mixed_separators() {
        let vb = parse_view_box(" -8, -8 ,216.5\n98 ").unwrap();
        assert_eq!(vb, ViewBox::new(-8.0, -8.0, 216.5, 98.0));
    }

    #[test]
    fn test_parse_missing_entries_default() {
        let vb = parse_view_box("5 6").unwrap();
        assert_eq!(vb, ViewBox::new(5.0, 6.0, 1.0, 1.0));
    }

    #[test]
    fn test_parse_zero_dimensions_become_one() {
        let vb = parse_view_box("0 0 0 0").unwrap();
        assert_eq!(vb.width, 1.0);
        assert_eq!(vb.height, 1.0);
    }

    #[test]
    fn test_parse_garbage_is_neutralized() {
        let vb = parse_view_box("a b c d").unwrap();
        assert_eq!(vb, ViewBox::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_parse_empty_attribute() {
        assert!(parse_view_box("").is_none());
        assert_eq!(
            parse_view_box("   "),
            Some(ViewBox::new(0.0, 0.0, 1.0, 1.0))
        );
    }

    #[test]
    fn test_display_matches_attribute_syntax() {
        let vb = ViewBox::new(-10.0, 0.0, 100.5, 50.0);
        assert_eq!(vb.to_string(), "-10 0 100.5 50");
    }

    #[test]
    fn test_rect_conversion() {
        let vb = ViewBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(ViewBox::from_rect(vb.to_rect()), vb);
        assert_eq!(vb.center(), Point::new(25.0, 40.0));
    }
}
