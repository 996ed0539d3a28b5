//! # Rendering Module
//!
//! Turns a URL and a [`QrCodeDesign`] into an in-memory vector graphic, and
//! converts that graphic into the byte formats the exporter hands out.
//!
//! ## Modules
//!
//! - [`svg`]: vector graphic → SVG text
//! - [`raster`]: SVG text → RGBA canvas → PNG bytes
//! - [`pdf`]: RGBA canvas → printable single-page PDF
//!
//! ## Rendering surfaces
//!
//! Every render works on a [`RenderSurface`], a scratch module grid checked
//! out from a [`SurfaceRegistry`]. The surface is released when it is
//! dropped, so it is returned on every exit path, including errors.
//!
//! ```
//! use menufacil::design::QrCodeDesign;
//! use menufacil::render::Renderer;
//!
//! let renderer = Renderer::default();
//! let graphic = renderer
//!     .render("https://menufacil.app/menu/42", 256, &QrCodeDesign::default())
//!     .unwrap();
//!
//! assert_eq!(graphic.width(), 256);
//! assert_eq!(graphic.height(), 256);
//! assert_eq!(renderer.surfaces().live(), 0);
//! ```

pub mod pdf;
pub mod raster;
pub mod svg;

use qrcode::{Color as ModuleColor, EcLevel, QrCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::design::{Color, MAX_MARGIN, QrCodeDesign};
use crate::error::{MenuFacilError, Result};

/// Fraction of the code's width covered by a center logo.
pub const LOGO_FRACTION: f32 = 0.2;

// ============================================================================
// RENDERING SURFACES
// ============================================================================

/// Hands out rendering surfaces and tracks how many are checked out.
#[derive(Debug)]
pub struct SurfaceRegistry {
    live: AtomicUsize,
    capacity: usize,
}

impl SurfaceRegistry {
    /// A registry with no limit on concurrent surfaces.
    pub fn new() -> Self {
        Self::bounded(usize::MAX)
    }

    /// A registry that refuses to hand out more than `capacity` surfaces.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            live: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Number of surfaces currently checked out.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Check out a surface. Fails when the registry is at capacity.
    pub fn acquire(&self) -> Result<RenderSurface<'_>> {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map_err(|n| {
                MenuFacilError::Render(format!(
                    "No rendering surface available ({} of {} in use)",
                    n, self.capacity
                ))
            })?;

        tracing::trace!(live = self.live(), "rendering surface acquired");
        Ok(RenderSurface {
            registry: self,
            modules: Vec::new(),
            width: 0,
        })
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Scratch module grid used while a graphic is being built.
///
/// Released back to its registry on drop.
pub struct RenderSurface<'a> {
    registry: &'a SurfaceRegistry,
    modules: Vec<bool>,
    width: usize,
}

impl RenderSurface<'_> {
    fn load(&mut self, code: &QrCode) {
        self.width = code.width();
        self.modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == ModuleColor::Dark)
            .collect();
    }

    #[inline]
    fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }

    /// Clear every module inside `[x0, x1) × [y0, y1)`.
    fn excavate(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) {
        for y in y0..y1.min(self.width) {
            for x in x0..x1.min(self.width) {
                self.modules[y * self.width + x] = false;
            }
        }
    }
}

impl Drop for RenderSurface<'_> {
    fn drop(&mut self) {
        self.registry.live.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(live = self.registry.live(), "rendering surface released");
    }
}

// ============================================================================
// VECTOR GRAPHIC
// ============================================================================

/// A drawable element of a [`QrGraphic`], in view-box units (one unit per
/// module).
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Full-bleed background square
    Background { fill: Color, extent: u32 },
    /// All dark modules merged into horizontal runs
    ModulePath { fill: Color, d: String },
    /// One rounded dark module
    ModuleRect { fill: Color, x: u32, y: u32, rx: f32 },
    /// Center logo
    Logo {
        href: String,
        x: f32,
        y: f32,
        size: f32,
    },
}

/// In-memory vector representation of a rendered QR code.
#[derive(Debug, Clone, PartialEq)]
pub struct QrGraphic {
    size: u32,
    view_box: u32,
    style: String,
    background: Color,
    shapes: Vec<Shape>,
}

impl QrGraphic {
    /// Rendered width in pixels.
    pub fn width(&self) -> u32 {
        self.size
    }

    /// Rendered height in pixels.
    pub fn height(&self) -> u32 {
        self.size
    }

    /// Side of the square view box, in modules (code + both margins).
    pub fn view_box(&self) -> u32 {
        self.view_box
    }

    /// Inline CSS of the root element.
    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn background(&self) -> &Color {
        &self.background
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of dark modules drawn.
    pub fn dark_module_count(&self) -> usize {
        self.shapes
            .iter()
            .map(|shape| match shape {
                Shape::ModuleRect { .. } => 1,
                Shape::ModulePath { d, .. } => run_lengths(d),
                _ => 0,
            })
            .sum()
    }
}

/// Sum of the `h` run lengths in a module path.
fn run_lengths(d: &str) -> usize {
    d.split('h')
        .skip(1)
        .filter_map(|seg| seg.split('v').next())
        .filter_map(|n| n.parse::<usize>().ok())
        .sum()
}

// ============================================================================
// RENDERER
// ============================================================================

/// Builds [`QrGraphic`]s.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    surfaces: Arc<SurfaceRegistry>,
}

impl Renderer {
    pub fn with_surfaces(surfaces: Arc<SurfaceRegistry>) -> Self {
        Self { surfaces }
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    /// Render on a freshly acquired surface, released before returning.
    pub fn render(&self, url: &str, size: u32, design: &QrCodeDesign) -> Result<QrGraphic> {
        let mut surface = self.surfaces.acquire()?;
        self.render_on(&mut surface, url, size, design)
    }

    /// Render on a surface the caller already holds.
    pub fn render_on(
        &self,
        surface: &mut RenderSurface<'_>,
        url: &str,
        size: u32,
        design: &QrCodeDesign,
    ) -> Result<QrGraphic> {
        if url.trim().is_empty() {
            return Err(MenuFacilError::Render("URL cannot be empty".to_string()));
        }
        if size == 0 {
            return Err(MenuFacilError::Render(
                "Size must be a positive number of pixels".to_string(),
            ));
        }
        if design.margin > MAX_MARGIN {
            return Err(MenuFacilError::Render(format!(
                "Margin of {} modules exceeds the maximum of {}",
                design.margin, MAX_MARGIN
            )));
        }

        let logo = design.logo();
        let level = if logo.is_some() { EcLevel::H } else { EcLevel::M };
        let code = QrCode::with_error_correction_level(url.as_bytes(), level)
            .map_err(|e| MenuFacilError::Render(format!("Failed to encode '{}': {}", url, e)))?;
        surface.load(&code);

        let modules = surface.width;
        let margin = design.margin;
        let view_box = modules as u32 + 2 * margin;
        let offset = margin as f32;

        let mut shapes = vec![Shape::Background {
            fill: design.background_color.clone(),
            extent: view_box,
        }];

        let logo_shape = logo.map(|href| {
            let logo_size = (modules as f32 * LOGO_FRACTION).round();
            let origin = (modules as f32 - logo_size) / 2.0;
            let start = origin.floor() as usize;
            let end = (origin + logo_size).ceil() as usize;
            surface.excavate(start, start, end, end);
            Shape::Logo {
                href: href.to_string(),
                x: origin + offset,
                y: origin + offset,
                size: logo_size,
            }
        });

        let radius = design.effective_corner_radius();
        if radius > 0.0 {
            for y in 0..modules {
                for x in 0..modules {
                    if surface.is_dark(x, y) {
                        shapes.push(Shape::ModuleRect {
                            fill: design.foreground_color.clone(),
                            x: x as u32 + margin,
                            y: y as u32 + margin,
                            rx: radius,
                        });
                    }
                }
            }
        } else {
            shapes.push(Shape::ModulePath {
                fill: design.foreground_color.clone(),
                d: module_path(surface, margin as usize),
            });
        }

        shapes.extend(logo_shape);

        Ok(QrGraphic {
            size,
            view_box,
            style: format!("background-color: {}", design.background_color.as_css()),
            background: design.background_color.clone(),
            shapes,
        })
    }
}

/// Path data covering every dark module, one subpath per horizontal run.
fn module_path(surface: &RenderSurface<'_>, margin: usize) -> String {
    let mut d = String::new();
    for y in 0..surface.width {
        let mut x = 0;
        while x < surface.width {
            if !surface.is_dark(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            while x < surface.width && surface.is_dark(x, y) {
                x += 1;
            }
            d.push_str(&format!(
                "M{},{}h{}v1H{}z",
                start + margin,
                y + margin,
                x - start,
                start + margin
            ));
        }
    }
    d
}
