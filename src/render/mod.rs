//! SVG document assembly
//!
//! Pure string construction: the whole document is built in memory from
//! the finished [`BarLayout`] and only then written to disk, so a failed
//! layout never leaves a half-written file behind.
//!
//! Groups mirror the classic scalebar SVG structure: `vertical` holds
//! the baseline and tick polylines, `horizontal_tick` the latitude
//! gridlines, and an anonymous text group carries the labels. Document
//! units are centimeters (the viewBox is in cm and the width/height
//! carry an explicit `cm` suffix).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::bar::layout::BarLayout;
use crate::error::{LatbarError, Result, Stage};

/// Render the layout into a complete SVG document string
pub fn to_svg(layout: &BarLayout, fontsize: f64) -> String {
    let pad = layout.padding;
    let doc_w = layout.width + 2.0 * pad;
    let doc_h = layout.height + 2.0 * pad;

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{doc_w}cm" height="{doc_h}cm" viewBox="0 0 {doc_w} {doc_h}">"#
    );

    let _ = writeln!(
        out,
        r#"  <g id="vertical" stroke="black" stroke-width="0.02" fill="none">"#
    );
    write_polyline(&mut out, &layout.baseline.points, pad);
    for tick in &layout.ticks {
        write_polyline(&mut out, &tick.points, pad);
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(
        out,
        r#"  <g id="horizontal_tick" stroke="black" stroke-width="0.01">"#
    );
    for grid in &layout.gridlines {
        let _ = writeln!(
            out,
            r#"    <line x1="{:.4}" y1="{:.4}" x2="{:.4}" y2="{:.4}"/>"#,
            grid.start.x + pad,
            grid.start.y + pad,
            grid.end.x + pad,
            grid.end.y + pad,
        );
    }
    let _ = writeln!(out, "  </g>");

    // font-size in pt scaled into cm document units (1 pt = 1/28.35 cm)
    let font_cm = fontsize / 28.35;
    let _ = writeln!(out, r#"  <g font-size="{font_cm:.4}" fill="black">"#);
    for label in &layout.labels {
        let _ = writeln!(
            out,
            r#"    <text x="{:.4}" y="{:.4}">{}</text>"#,
            label.anchor.x + pad,
            label.anchor.y + pad,
            xml_escape(&label.text),
        );
    }
    let _ = writeln!(out, "  </g>");

    out.push_str("</svg>\n");
    out
}

/// Render and persist the drawing in one step
pub fn save_svg(layout: &BarLayout, fontsize: f64, path: &Path) -> Result<()> {
    let document = to_svg(layout, fontsize);
    fs::write(path, document).map_err(|source| LatbarError::Io {
        stage: Stage::Render,
        source,
    })?;
    Ok(())
}

fn write_polyline(out: &mut String, points: &[geo::Coord], pad: f64) {
    let mut attr = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            attr.push(' ');
        }
        let _ = write!(attr, "{:.4},{:.4}", p.x + pad, p.y + pad);
    }
    let _ = writeln!(out, r#"    <polyline points="{attr}"/>"#);
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::layout::{LayoutParams, layout_ticks};
    use crate::geometry::SampleNodes;
    use crate::geometry::sampler::linspace;
    use crate::scale::scale_series;
    use crate::srs::SpatialReference;

    fn sample_layout() -> BarLayout {
        let srs =
            SpatialReference::from_proj4("+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200")
                .unwrap();
        let lats = linspace(0.0, 40.0, 5);
        let nodes = SampleNodes {
            ys: lats.clone(),
            mask: vec![true; lats.len()],
            latitudes: lats,
        };
        let series = scale_series(&srs, nodes, 0.0).unwrap();
        let params = LayoutParams {
            mapscale_denominator: 1e6,
            symmetrical: true,
            height: 4.0,
            lat_tick_interval: 5.0,
            padding: 1.0,
        };
        layout_ticks(&series, &[25.0, 50.0], &[12.5], &params).unwrap()
    }

    #[test]
    fn test_svg_structure() {
        let svg = to_svg(&sample_layout(), 12.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"id="vertical""#));
        assert!(svg.contains(r#"id="horizontal_tick""#));
        assert!(svg.contains("km</text>"));
        assert!(svg.contains("\u{00b0}</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_svg_document_size_includes_padding() {
        let layout = sample_layout();
        let svg = to_svg(&layout, 12.0);
        let expected = format!(
            r#"width="{}cm" height="{}cm""#,
            layout.width + 2.0,
            layout.height + 2.0
        );
        assert!(svg.contains(&expected));
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.svg");
        save_svg(&sample_layout(), 12.0, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("</svg>"));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b&c>\"d\""), "a&lt;b&amp;c&gt;&quot;d&quot;");
    }
}
