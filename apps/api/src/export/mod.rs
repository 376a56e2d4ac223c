//! Export Collaborator: assembles rendered page surfaces into one PDF.
//!
//! The client rasterizes each `.resume-page` of the HTML preview and uploads the images in
//! page order. Each image becomes a Flate-compressed RGB XObject stretched over a full page
//! of the chosen size. Pages are decoded and embedded strictly one at a time so only one
//! decoded bitmap is alive at once.

use std::fmt;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const IMAGE_NAME: Name<'static> = Name(b"Im1");
const DEFAULT_FILE_STEM: &str = "resume";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    #[default]
    #[serde(alias = "Letter")]
    Letter,
    #[serde(alias = "A4")]
    A4,
}

impl PageSize {
    /// Width and height in PostScript points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Letter => write!(f, "Letter"),
            PageSize::A4 => write!(f, "A4"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("missing render target: there are no pages to export")]
    NoPages,

    #[error("page {page} is not a readable PNG or JPEG image: {source}")]
    Decode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("page {page} has an empty surface")]
    EmptySurface { page: usize },
}

/// One decoded page image as packed 8-bit RGB.
pub struct PageSurface {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
}

impl PageSurface {
    /// Decodes a PNG or JPEG. `page` is 1-based and only used in errors.
    pub fn decode(page: usize, bytes: &[u8]) -> Result<Self, ExportError> {
        let image =
            image::load_from_memory(bytes).map_err(|source| ExportError::Decode { page, source })?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::EmptySurface { page });
        }
        Ok(Self {
            width,
            height,
            rgb: rgb.into_raw(),
        })
    }
}

/// Builds a PDF with one page per encoded surface, in order.
pub fn export_pdf<'a, I>(surfaces: I, size: PageSize) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let (page_width, page_height) = size.dimensions_pt();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let mut page_ids: Vec<Ref> = Vec::new();

    for (index, bytes) in surfaces.into_iter().enumerate() {
        let surface = PageSurface::decode(index + 1, bytes)?;

        let page_id = alloc();
        let content_id = alloc();
        let image_id = alloc();

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&surface.rgb, 6);
        {
            let mut xobj = pdf.image_xobject(image_id, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(clamp_dimension(surface.width));
            xobj.height(clamp_dimension(surface.height));
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }

        let mut content = Content::new();
        content.save_state();
        content.transform([page_width, 0.0, 0.0, page_height, 0.0, 0.0]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        let raw = content.finish();
        pdf.stream(content_id, &raw);

        {
            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, page_width, page_height))
                .parent(pages_id)
                .contents(content_id);
            page.resources().x_objects().pair(IMAGE_NAME, image_id);
        }

        debug!(
            "Embedded page {} ({}x{} px, {} bytes compressed)",
            index + 1,
            surface.width,
            surface.height,
            compressed.len()
        );
        page_ids.push(page_id);
    }

    if page_ids.is_empty() {
        return Err(ExportError::NoPages);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    Ok(pdf.finish())
}

fn clamp_dimension(px: u32) -> i32 {
    i32::try_from(px).unwrap_or(i32::MAX)
}

/// `<name>-formatted.pdf`, or `resume-formatted.pdf` when the name is blank.
/// Characters that are unsafe in file names are replaced with `_`.
pub fn export_file_name(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = if stem.is_empty() {
        DEFAULT_FILE_STEM
    } else {
        &stem
    };
    format!("{stem}-formatted.pdf")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::{Cursor, Write};

    pub(crate) fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([240, 240, 250]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_exports_one_page_per_surface() {
        let pages = [encode_png(8, 10), encode_png(8, 10), encode_png(8, 10)];
        let pdf = export_pdf(pages.iter().map(Vec::as_slice), PageSize::Letter).unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        assert!(contains(&pdf, "/Count 3"));
        assert!(contains(&pdf, "/FlateDecode"));
    }

    #[test]
    fn test_exported_pdf_writes_to_disk() {
        let pdf = export_pdf([encode_png(4, 4).as_slice()], PageSize::A4).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&pdf).unwrap();
        let written = std::fs::read(file.path()).unwrap();
        assert_eq!(written, pdf);
        assert!(contains(&written, "/Count 1"));
    }

    #[test]
    fn test_no_surfaces_is_missing_target() {
        let err = export_pdf(std::iter::empty::<&[u8]>(), PageSize::Letter).unwrap_err();
        assert!(matches!(err, ExportError::NoPages));
    }

    #[test]
    fn test_undecodable_surface_reports_page_number() {
        let good = encode_png(4, 4);
        let err = export_pdf([good.as_slice(), b"not an image".as_slice()], PageSize::Letter)
            .unwrap_err();
        assert!(matches!(err, ExportError::Decode { page: 2, .. }));
    }

    #[test]
    fn test_page_sizes() {
        assert_eq!(PageSize::Letter.dimensions_pt(), (612.0, 792.0));
        assert_eq!(PageSize::A4.dimensions_pt(), (595.28, 841.89));
        assert_eq!(PageSize::default(), PageSize::Letter);
        let parsed: PageSize = serde_json::from_str("\"A4\"").unwrap();
        assert_eq!(parsed, PageSize::A4);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Ada Lovelace"), "Ada Lovelace-formatted.pdf");
        assert_eq!(export_file_name("   "), "resume-formatted.pdf");
        assert_eq!(export_file_name("A/B: C"), "A_B_ C-formatted.pdf");
        assert_eq!(export_file_name("Zoë"), "Zoë-formatted.pdf");
    }
}
