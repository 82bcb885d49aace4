//! Header logo processing for DOCX documents

use std::io::Cursor;

use docx_rs::*;
use image::GenericImageView;

use crate::request::{Logo, is_file};

use super::styles::alignment;

/// English metric units per centimeter.
pub const EMU_PER_CM: f32 = 360_000.;

/// Computes the logo extent in EMU: `width_cm` wide, height following the
/// aspect ratio of a `(px_w, px_h)` image.
pub fn logo_extent((px_w, px_h): (u32, u32), width_cm: f32) -> (u32, u32) {
    let width = (width_cm * EMU_PER_CM).round();
    let height = if px_w == 0 {
        width
    } else {
        (width * px_h as f32 / px_w as f32).round()
    };
    (width as u32, height as u32)
}

/// Image processor for the header logo
pub(super) struct DocxImageProcessor;

impl DocxImageProcessor {
    /// Builds the header holding `logo`.
    ///
    /// Returns `None` when the image is missing or cannot be decoded; the
    /// document is then produced without a logo.
    pub fn logo_header(logo: &Logo) -> Option<Header> {
        if !is_file(&logo.path) {
            log::warn!("logo: {} does not exist, skipped", logo.path.display());
            return None;
        }

        let data = match std::fs::read(&logo.path) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("logo: cannot read {}: {err}", logo.path.display());
                return None;
            }
        };

        let pic = Self::process_image_data(&data, logo.width_cm)?;
        let para = Paragraph::new()
            .align(alignment(logo.position))
            .add_run(Run::new().add_image(pic));
        log::debug!("logo: placed {} in the header", logo.path.display());
        Some(Header::new().add_paragraph(para))
    }

    /// Decodes image data, converting formats other than PNG and JPEG to
    /// PNG.
    fn process_image_data(data: &[u8], width_cm: f32) -> Option<Pic> {
        let format = match image::guess_format(data) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("logo: unknown image format: {err}");
                return None;
            }
        };
        let img = match image::load_from_memory_with_format(data, format) {
            Ok(img) => img,
            Err(err) => {
                log::warn!("logo: unable to load image: {err}");
                return None;
            }
        };
        let (width, height) = logo_extent(img.dimensions(), width_cm);

        match format {
            image::ImageFormat::Png | image::ImageFormat::Jpeg => {
                Some(Pic::new(data).size(width, height))
            }
            _ => {
                let mut buffer = Vec::new();
                if let Err(err) = img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
                {
                    log::warn!("logo: unable to convert to PNG: {err}");
                    return None;
                }
                Some(Pic::new(&buffer).size(width, height))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::HAlign;

    #[test]
    fn extent_keeps_aspect_ratio() {
        assert_eq!(logo_extent((200, 100), 3.), (1_080_000, 540_000));
        assert_eq!(logo_extent((100, 100), 1.5), (540_000, 540_000));
        assert_eq!(logo_extent((0, 0), 1.), (360_000, 360_000));
    }

    #[test]
    fn missing_logo_is_skipped() {
        let logo = Logo {
            path: "definitely/not/here.png".into(),
            position: HAlign::Center,
            width_cm: 3.,
        };
        assert!(DocxImageProcessor::logo_header(&logo).is_none());
    }

    #[test]
    fn garbage_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"not an image").unwrap();
        let logo = Logo {
            path,
            position: HAlign::Left,
            width_cm: 3.,
        };
        assert!(DocxImageProcessor::logo_header(&logo).is_none());
    }

    #[test]
    fn png_logo_makes_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbImage::new(4, 2).save(&path).unwrap();
        let logo = Logo {
            path,
            position: HAlign::Right,
            width_cm: 2.,
        };
        assert!(DocxImageProcessor::logo_header(&logo).is_some());
    }
}
