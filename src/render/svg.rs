//! SVG serialization of a [`QrGraphic`].
//!
//! Output is a single line, deterministic for a given graphic. Fills are
//! written in canonical `#rrggbb` form with a separate `fill-opacity` when
//! the color is translucent; the root `style` keeps the user's color text.

use std::fmt::Write;

use super::{QrGraphic, Shape};
use crate::design::Color;

/// Serialize a graphic to SVG text.
pub fn to_svg(graphic: &QrGraphic) -> String {
    let mut out = String::with_capacity(4096);
    let vb = graphic.view_box();

    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {vb} {vb}" role="img" style="{style}">"#,
        w = graphic.width(),
        h = graphic.height(),
        vb = vb,
        style = escape(graphic.style()),
    );

    for shape in graphic.shapes() {
        match shape {
            Shape::Background { fill, extent } => {
                let _ = write!(
                    out,
                    r#"<path{} d="M0,0 h{e}v{e}H0z" shape-rendering="crispEdges"/>"#,
                    fill_attrs(fill),
                    e = extent
                );
            }
            Shape::ModulePath { fill, d } => {
                let _ = write!(
                    out,
                    r#"<path{} d="{}" shape-rendering="crispEdges"/>"#,
                    fill_attrs(fill),
                    d
                );
            }
            Shape::ModuleRect { fill, x, y, rx } => {
                let _ = write!(
                    out,
                    r#"<rect{} x="{}" y="{}" width="1" height="1" rx="{}" ry="{}"/>"#,
                    fill_attrs(fill),
                    x,
                    y,
                    rx,
                    rx
                );
            }
            Shape::Logo { href, x, y, size } => {
                let _ = write!(
                    out,
                    r#"<image href="{}" x="{}" y="{}" width="{s}" height="{s}" preserveAspectRatio="none"/>"#,
                    escape(href),
                    x,
                    y,
                    s = size
                );
            }
        }
    }

    out.push_str("</svg>");
    out
}

fn fill_attrs(color: &Color) -> String {
    if color.is_opaque() {
        format!(r#" fill="{}""#, color.to_hex())
    } else {
        format!(
            r#" fill="{}" fill-opacity="{:.3}""#,
            color.to_hex(),
            color.opacity()
        )
    }
}

/// Escape text for use inside a double-quoted XML attribute.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
