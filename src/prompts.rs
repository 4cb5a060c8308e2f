//! The fixed correction instruction sent with every batch.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the output rules requires
//!    editing exactly one place, not two provider clients.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompt without
//!    a live correction service, so a regression that drops the batch text
//!    or the Devanagari-only rule is caught immediately.
//!
//! Callers can override the instruction via
//! [`crate::config::RunConfigBuilder::instruction`]; the constant here is
//! used only when no override is provided.

/// Default instruction for correcting one batch of raw OCR text.
///
/// The corrected output is evaluated by character-error-rate against a
/// ground-truth transcript, so the rules insist on bare Devanagari with the
/// original line structure: any preamble, translation, or Latin commentary
/// in the response would count as errors in that comparison.
pub const CORRECTION_INSTRUCTION: &str = r#"You are an expert editor of Pali, Sanskrit, and Hindi texts in Devanagari script. The text below was extracted by OCR from a scanned book page and contains recognition errors.

Follow these rules precisely:

1. Correct misrecognised letters, conjuncts, vowel signs, and punctuation so the text reads as the source language intended.
2. Keep the page breaks and line breaks exactly as they are.
3. Do not translate, transliterate, summarise, or reorder anything.
4. Do not add headings, notes, or any words of your own.
5. Output ONLY the corrected Devanagari text. No English, no introductions like "Here is the text", no code fences."#;

/// Assemble the full prompt for one batch.
///
/// The instruction (default or caller override) is followed by a blank line
/// and the batch text verbatim.
pub fn correction_prompt(instruction: &str, batch: &str) -> String {
    format!("{instruction}\n\n{batch}")
}
