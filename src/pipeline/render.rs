//! PDF rasterisation: render every page to a PNG file via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a thread
//! designed for blocking operations, keeping the Tokio worker threads
//! responsive during CPU-heavy rendering.
//!
//! ## Why files instead of in-memory images?
//!
//! The OCR stage wants paths: Tesseract is an external process, and a
//! rerun that resumes from the raw-text artifact should not have to hold
//! (or re-render) hundreds of page bitmaps. Pages land in the configured
//! image directory as `page_NNN.png`, 1-based, zero-padded so shell
//! globbing lists them in reading order.

use crate::config::RunConfig;
use crate::error::ShuddhiError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rasterise all pages of `document` into `config.image_dir`.
///
/// Per-page failures are logged and skipped; only a run that renders zero
/// pages is fatal. Returns `(page_index_0based, image_path)` tuples in
/// page order.
pub async fn render_pages(
    document: &Path,
    config: &RunConfig,
) -> Result<Vec<(usize, PathBuf)>, ShuddhiError> {
    let path = document.to_path_buf();
    let image_dir = config.image_dir.clone();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;

    let rendered = tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, &image_dir, dpi, max_pixels)
    })
    .await
    .map_err(|e| ShuddhiError::Internal(format!("render task panicked: {e}")))??;

    if rendered.is_empty() {
        return Err(ShuddhiError::NoPages {
            path: document.to_path_buf(),
        });
    }
    Ok(rendered)
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    document: &Path,
    image_dir: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<(usize, PathBuf)>, ShuddhiError> {
    std::fs::create_dir_all(image_dir).map_err(|e| ShuddhiError::ImageDirFailed {
        dir: image_dir.to_path_buf(),
        source: e,
    })?;

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| ShuddhiError::PdfiumBindingFailed(format!("{e:?}")))?;
    let pdfium = Pdfium::new(bindings);

    let pdf = pdfium
        .load_pdf_from_file(document, None)
        .map_err(|e| ShuddhiError::CorruptPdf {
            path: document.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = pdf.pages();
    let total_pages = pages.len() as usize;
    info!("document loaded: {} pages", total_pages);

    // PDF points are 1/72 inch, so the scale factor is dpi/72; the pixel
    // caps keep an outsized folio page from exhausting memory.
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = match pages.get(idx as u16) {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping page {}: {:?}", idx + 1, e);
                continue;
            }
        };

        let bitmap = match page.render_with_config(&render_config) {
            Ok(b) => b,
            Err(e) => {
                warn!("rasterisation failed for page {}: {:?}", idx + 1, e);
                continue;
            }
        };

        let image = bitmap.as_image();
        let image_path = image_dir.join(format!("page_{:03}.png", idx + 1));
        if let Err(e) = image.save(&image_path) {
            warn!("failed to save page {} image: {}", idx + 1, e);
            continue;
        }

        debug!(
            "rendered page {} → {} ({}x{} px)",
            idx + 1,
            image_path.display(),
            image.width(),
            image.height()
        );
        results.push((idx, image_path));
    }

    Ok(results)
}
