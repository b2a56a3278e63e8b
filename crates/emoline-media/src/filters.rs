//! FFmpeg filter graphs for overlay rendering.
//!
//! Every [`OverlayDirective`] becomes one `drawtext` filter enabled over its
//! time window; every [`BoxDirective`] becomes one `drawbox`. The filters are
//! chained with `,` into a single video filter graph, which is usually
//! written to a filter script file.

use emoline_models::{BoxDirective, OverlayAnchor, OverlayDirective};

/// Text styling for drawn overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: u32,
    pub font_color: String,
    pub border_width: u32,
    pub border_color: String,
    /// Distance from the bottom edge for bottom-anchored text
    pub bottom_margin: u32,
    /// Optional font file for systems without fontconfig
    pub font_file: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 32,
            font_color: "white".to_string(),
            border_width: 2,
            border_color: "black".to_string(),
            bottom_margin: 40,
            font_file: None,
        }
    }
}

/// Colour and thickness of face boxes.
pub const BOX_COLOR: &str = "green";
pub const BOX_THICKNESS: u32 = 2;

/// Escape a value for use inside a single-quoted filter option.
///
/// The value passes two parsers: the filtergraph, which strips the single
/// quotes, then the option list, which honours backslash escapes. A quote
/// cannot appear inside single quotes, so it closes the quote, emits an
/// escaped quote and reopens.
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'\\''")
}

/// `enable` expression for a time window.
fn enable_between(start: f64, end: f64) -> String {
    format!("enable='between(t,{:.3},{:.3})'", start, end)
}

/// Position expressions for a text anchor.
fn anchor_position(anchor: &OverlayAnchor, offset: u32, style: &TextStyle) -> (String, String) {
    match anchor {
        OverlayAnchor::BottomCenter => (
            "(w-text_w)/2".to_string(),
            format!("h-text_h-{}", style.bottom_margin + offset),
        ),
        OverlayAnchor::TopCenter => ("(w-text_w)/2".to_string(), offset.to_string()),
        OverlayAnchor::Pixel { x, y } => ((*x).max(0).to_string(), (*y + offset as i32).max(0).to_string()),
    }
}

/// Build the `drawtext` filter for one directive.
pub fn drawtext_filter(directive: &OverlayDirective, style: &TextStyle) -> String {
    let (x, y) = anchor_position(&directive.anchor, directive.vertical_offset, style);
    let font = style
        .font_file
        .as_deref()
        .map(|f| format!("fontfile='{}':", escape_filter_value(f)))
        .unwrap_or_default();

    format!(
        "drawtext={font}text='{text}':expansion=none:fontsize={size}:fontcolor={color}:\
         borderw={bw}:bordercolor={bc}:x={x}:y={y}:{enable}",
        font = font,
        text = escape_filter_value(&directive.text),
        size = style.font_size,
        color = style.font_color,
        bw = style.border_width,
        bc = style.border_color,
        x = x,
        y = y,
        enable = enable_between(directive.start_seconds, directive.end_seconds()),
    )
}

/// Build the `drawbox` filter for one face box.
pub fn drawbox_filter(directive: &BoxDirective) -> String {
    let r = &directive.region;
    format!(
        "drawbox=x={}:y={}:w={}:h={}:color={}:t={}:{}",
        r.x.max(0),
        r.y.max(0),
        r.w,
        r.h,
        BOX_COLOR,
        BOX_THICKNESS,
        enable_between(directive.start_seconds, directive.start_seconds + directive.duration_seconds),
    )
}

/// Chain all boxes and text overlays into one filter graph.
///
/// Boxes are drawn first so labels stay readable on top of them. An empty
/// input yields the `null` pass-through filter.
pub fn build_overlay_graph(overlays: &[OverlayDirective], boxes: &[BoxDirective], style: &TextStyle) -> String {
    let filters: Vec<String> = boxes
        .iter()
        .map(drawbox_filter)
        .chain(overlays.iter().map(|d| drawtext_filter(d, style)))
        .collect();

    if filters.is_empty() {
        "null".to_string()
    } else {
        filters.join(",\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emoline_models::FaceRegion;

    fn directive(text: &str, anchor: OverlayAnchor, offset: u32) -> OverlayDirective {
        OverlayDirective {
            text: text.to_string(),
            anchor,
            vertical_offset: offset,
            start_seconds: 10.0,
            duration_seconds: 2.0,
        }
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("happy: 80.0%"), "happy\\: 80.0%");
        assert_eq!(escape_filter_value("it's"), "it\\'\\''s");
        assert_eq!(escape_filter_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_drawtext_bottom_center() {
        let filter = drawtext_filter(
            &directive("happy: 80.0%", OverlayAnchor::BottomCenter, 0),
            &TextStyle::default(),
        );
        assert!(filter.starts_with("drawtext="));
        assert!(filter.contains("text='happy\\: 80.0%'"));
        assert!(filter.contains("x=(w-text_w)/2"));
        assert!(filter.contains("y=h-text_h-40"));
        assert!(filter.contains("enable='between(t,10.000,12.000)'"));
    }

    /// One level of FFmpeg token parsing: backslash escapes the next
    /// character outside quotes; single-quoted text is literal.
    fn unquote(token: &str) -> String {
        let mut out = String::new();
        let mut quoted = false;
        let mut chars = token.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => quoted = !quoted,
                '\\' if !quoted => out.extend(chars.next()),
                _ => out.push(c),
            }
        }
        assert!(!quoted, "unterminated quote in {token}");
        out
    }

    #[test]
    fn test_escaped_values_survive_both_parse_levels() {
        for label in ["don't: 50.0%", "a\\b", "it''s", "plain"] {
            let quoted = format!("'{}'", escape_filter_value(label));
            assert_eq!(unquote(&unquote(&quoted)), label);
        }
    }

    #[test]
    fn test_drawtext_label_with_apostrophe() {
        let filter = drawtext_filter(
            &directive("don't: 50.0%", OverlayAnchor::BottomCenter, 0),
            &TextStyle::default(),
        );
        assert!(filter.contains("text='don\\'\\''t\\: 50.0%'"));
    }

    #[test]
    fn test_drawtext_top_center_offset() {
        let filter = drawtext_filter(
            &directive("Sentiment: positive", OverlayAnchor::TopCenter, 90),
            &TextStyle::default(),
        );
        assert!(filter.contains(":y=90:"));
    }

    #[test]
    fn test_drawtext_pixel_anchor_clamped() {
        let filter = drawtext_filter(
            &directive("sad: 10.0%", OverlayAnchor::Pixel { x: -5, y: -10 }, 0),
            &TextStyle::default(),
        );
        assert!(filter.contains(":x=0:y=0:"));
    }

    #[test]
    fn test_font_file_included() {
        let style = TextStyle {
            font_file: Some("/fonts/DejaVuSans.ttf".to_string()),
            ..Default::default()
        };
        let filter = drawtext_filter(&directive("x", OverlayAnchor::TopCenter, 0), &style);
        assert!(filter.contains("fontfile='/fonts/DejaVuSans.ttf'"));
    }

    #[test]
    fn test_build_graph_order() {
        let boxes = vec![BoxDirective {
            region: FaceRegion { x: 10, y: 20, w: 30, h: 40 },
            start_seconds: 1.0,
            duration_seconds: 0.5,
        }];
        let overlays = vec![directive("happy: 80.0%", OverlayAnchor::BottomCenter, 0)];
        let graph = build_overlay_graph(&overlays, &boxes, &TextStyle::default());

        let box_pos = graph.find("drawbox=x=10:y=20:w=30:h=40").unwrap();
        let text_pos = graph.find("drawtext").unwrap();
        assert!(box_pos < text_pos);
        assert!(graph.contains("between(t,1.000,1.500)"));
    }

    #[test]
    fn test_empty_graph_is_passthrough() {
        assert_eq!(build_overlay_graph(&[], &[], &TextStyle::default()), "null");
    }
}
