//! Ticket QR rendering and PNG export.
//!
//! A ticket's scan code is drawn as a black-on-white QR code at error
//! correction level M, scaled to a fixed square size. Export adds a
//! uniform white border and encodes the result as PNG.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::config::{QR_PADDING_PX_RANGE, QR_SIZE_PX_RANGE};
use crate::error::TixlyError;

const WHITE: Luma<u8> = Luma([255]);
const DARK: Luma<u8> = Luma([0]);

/// Prefix of every exported ticket file name.
pub const FILE_NAME_PREFIX: &str = "Tixly-Ticket";

/// Renders ticket codes as QR images.
#[derive(Debug, Clone, Copy)]
pub struct TicketRenderer {
    size_px: u32,
    padding_px: u32,
}

impl TicketRenderer {
    /// Creates a renderer producing `size_px` square codes with
    /// `padding_px` of white border on export. Both are clamped to the
    /// ranges accepted by the configuration.
    #[must_use]
    pub fn new(size_px: u32, padding_px: u32) -> Self {
        Self {
            size_px: size_px.clamp(*QR_SIZE_PX_RANGE.start(), *QR_SIZE_PX_RANGE.end()),
            padding_px: padding_px.min(*QR_PADDING_PX_RANGE.end()),
        }
    }

    /// Side length of the QR code without padding.
    #[must_use]
    pub const fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Side length of an exported image.
    #[must_use]
    pub const fn exported_size_px(&self) -> u32 {
        self.size_px.saturating_add(self.padding_px.saturating_mul(2))
    }

    /// Draws `code` as a QR code exactly `size_px` wide and high.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::Render`] if the code is too long to encode.
    pub fn render(&self, code: &str) -> Result<GrayImage, TixlyError> {
        let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::M)
            .map_err(|e| TixlyError::Render(e.to_string()))?;
        let modules = qr
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .dark_color(DARK)
            .light_color(WHITE)
            .min_dimensions(self.size_px, self.size_px)
            .build();
        Ok(imageops::resize(
            &modules,
            self.size_px,
            self.size_px,
            FilterType::Nearest,
        ))
    }

    /// Renders `code` onto a white canvas with uniform padding and
    /// encodes it as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::Render`] if encoding fails.
    pub fn export_png(&self, code: &str) -> Result<Vec<u8>, TixlyError> {
        let qr = self.render(code)?;
        let side = self.exported_size_px();
        let mut canvas = GrayImage::from_pixel(side, side, WHITE);
        let offset = i64::from(self.padding_px);
        imageops::overlay(&mut canvas, &qr, offset, offset);

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| TixlyError::Render(e.to_string()))?;
        Ok(bytes)
    }
}

/// Download name for a ticket of the named event: whitespace runs become
/// a single `_`.
#[must_use]
pub fn download_file_name(event_name: Option<&str>) -> String {
    match event_name {
        Some(name) if !name.trim().is_empty() => {
            let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
            let mut slug = String::with_capacity(joined.len());
            if name.starts_with(char::is_whitespace) {
                slug.push('_');
            }
            slug.push_str(&joined);
            if name.ends_with(char::is_whitespace) {
                slug.push('_');
            }
            format!("{FILE_NAME_PREFIX}-{slug}.png")
        }
        _ => format!("{FILE_NAME_PREFIX}.png"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn render_has_fixed_size() {
        let renderer = TicketRenderer::new(180, 20);
        let Ok(img) = renderer.render("0b8a3c5e-2f7d-4a8e-9b1f-3c6d2e7a9f10") else {
            panic!("render failed");
        };
        assert_eq!(img.dimensions(), (180, 180));
    }

    #[test]
    fn render_is_deterministic() {
        let renderer = TicketRenderer::new(180, 20);
        let (Ok(a), Ok(b)) = (renderer.render("abc"), renderer.render("abc")) else {
            panic!("render failed");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn export_adds_white_border() {
        let renderer = TicketRenderer::new(180, 20);
        let Ok(png) = renderer.export_png("abc") else {
            panic!("export failed");
        };
        assert_eq!(png.get(..8), Some(&b"\x89PNG\r\n\x1a\n"[..]));

        let Ok(decoded) = image::load_from_memory_with_format(&png, ImageFormat::Png) else {
            panic!("png should decode");
        };
        let gray = decoded.to_luma8();
        assert_eq!(gray.dimensions(), (220, 220));
        for (x, y) in [(0, 0), (19, 19), (219, 0), (0, 219), (219, 219), (110, 5)] {
            assert_eq!(gray.get_pixel(x, y), &WHITE);
        }
        // The finder pattern starts dark right at the padding edge.
        assert_eq!(gray.get_pixel(20, 20), &DARK);
    }

    #[test]
    fn oversized_dimensions_are_clamped() {
        let renderer = TicketRenderer::new(u32::MAX, u32::MAX);
        assert_eq!(renderer.size_px(), *QR_SIZE_PX_RANGE.end());
        assert_eq!(
            renderer.exported_size_px(),
            QR_SIZE_PX_RANGE.end() + 2 * QR_PADDING_PX_RANGE.end()
        );
        assert_eq!(TicketRenderer::new(0, 0).size_px(), *QR_SIZE_PX_RANGE.start());
    }

    #[test]
    fn file_name_replaces_whitespace_runs() {
        assert_eq!(
            download_file_name(Some("Jazz   Night\tBandung")),
            "Tixly-Ticket-Jazz_Night_Bandung.png"
        );
        assert_eq!(download_file_name(Some("Gig")), "Tixly-Ticket-Gig.png");
        assert_eq!(download_file_name(None), "Tixly-Ticket.png");
    }
}
