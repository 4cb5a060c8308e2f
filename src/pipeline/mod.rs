//! Pipeline stages for scanned-document transcription.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (a different OCR engine, a different correction
//! provider) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ extract ──▶ [batch] ──▶ correct
//! (path)   (pdfium)    (OCR)      (pure fn)   (LLM + retries)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied document path
//! 2. [`render`]  — rasterise pages to PNG files; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`extract`] — drive the OCR backend page by page; assemble and
//!    persist the raw-text artifact
//! 4. [`crate::batch`] — split the raw text into size-bounded batches
//!    (pure, so it lives at the crate root rather than here)
//! 5. [`correct`] — drive the correction service batch by batch with
//!    bounded retries; the only stage that appends to the output artifact
//! 6. [`postprocess`] — deterministic cleanup of each model response
//!    before it is accepted

pub mod correct;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod render;
