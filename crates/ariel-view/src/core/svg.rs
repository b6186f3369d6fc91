//! SVG root inspection and display rewriting
//!
//! Engine output is not guaranteed to be well-formed XML (HTML labels inside
//! `foreignObject`), so the root is read and rewritten with a streaming HTML
//! rewriter. Comments, the prolog and text never count as the root. Full XML
//! parsing is used only as the fallback that measures content bounds.

use lol_html::errors::RewritingError;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use tracing::debug;

use super::error::GeometryError;
use super::geometry::{parse_view_box, ViewBox};

/// Inline style applied to the displayed root so it fills the stage
pub const DISPLAY_STYLE: &str =
    "width: 100%; height: 100%; max-width: none; max-height: none; display: block;";

/// Aspect-ratio policy added when the root does not declare one
pub const DEFAULT_ASPECT_RATIO: &str = "xMidYMid meet";

/// The opening tag of the root `<svg>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgRoot {
    /// Raw attribute values in document order
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

impl SvgRoot {
    /// Read the first `<svg>` element of the markup
    pub fn find(markup: &str) -> Result<Self, GeometryError> {
        let mut root: Option<SvgRoot> = None;

        rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![element!("svg", |el| {
                    if root.is_none() {
                        root = Some(SvgRoot {
                            attributes: el
                                .attributes()
                                .iter()
                                .map(|a| (a.name(), a.value()))
                                .collect(),
                            self_closing: el.is_self_closing(),
                        });
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )
        .map_err(malformed)?;

        root.ok_or(GeometryError::MissingRoot)
    }

    /// Attribute value by name, ignoring ASCII case
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn malformed(err: RewritingError) -> GeometryError {
    GeometryError::Malformed {
        message: err.to_string(),
    }
}

fn positive_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Resolve the intrinsic view box of rendered markup.
///
/// Order: the root `viewBox`; then positive `width`/`height` as
/// `0 0 width height`; then the measured bounds of the content.
pub fn intrinsic_view_box(markup: &str) -> Result<ViewBox, GeometryError> {
    let root = SvgRoot::find(markup)?;

    if let Some(view_box) = root.attribute("viewBox").and_then(parse_view_box) {
        return Ok(view_box);
    }

    let width = positive_number(root.attribute("width"));
    let height = positive_number(root.attribute("height"));
    if let (Some(width), Some(height)) = (width, height) {
        return Ok(ViewBox::from_size(width, height));
    }

    debug!("No viewBox or size on svg root, measuring content");
    measured_bounds(markup)
}

/// Bounding box of the rendered content
pub fn measured_bounds(markup: &str) -> Result<ViewBox, GeometryError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(markup, &options).map_err(|err| {
        GeometryError::Unmeasurable {
            message: err.to_string(),
        }
    })?;
    let bbox = tree.root().abs_bounding_box();

    Ok(ViewBox::new(
        f64::from(bbox.x()),
        f64::from(bbox.y()),
        f64::from(bbox.width()),
        f64::from(bbox.height()),
    )
    .sanitized())
}

/// Rewrite the root tag so the graphic fills its stage showing `view_box`.
///
/// Sets `viewBox`, `width="100%"`, `height="100%"`, and the fill style, and
/// adds `preserveAspectRatio="xMidYMid meet"` unless the root already has one,
/// so the graphic is never stretched non-uniformly. Nested `<svg>` elements
/// are left alone.
pub fn display_markup(markup: &str, view_box: &ViewBox) -> Result<String, GeometryError> {
    let view_box = view_box.to_string();
    let mut rewritten = false;

    let out = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("svg", |el| {
                if rewritten {
                    return Ok(());
                }
                rewritten = true;

                if !el.has_attribute("preserveAspectRatio") {
                    el.set_attribute("preserveAspectRatio", DEFAULT_ASPECT_RATIO)?;
                }
                el.set_attribute("viewBox", &view_box)?;
                el.set_attribute("width", "100%")?;
                el.set_attribute("height", "100%")?;
                el.set_attribute("style", DISPLAY_STYLE)?;
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(malformed)?;

    if rewritten {
        Ok(out)
    } else {
        Err(GeometryError::MissingRoot)
    }
}
