//! Post-processing: deterministic cleanup of each correction response.
//!
//! Even well-prompted models occasionally disobey the output rules:
//!
//! - wrapping the corrected text in ` ``` ` fences despite the prompt
//!   saying not to
//! - answering with Windows-style `\r\n` line endings
//! - padding the text with runs of blank lines that would read as phantom
//!   page boundaries after reassembly
//!
//! These are fixed here with cheap, deterministic rules rather than prompt
//! tweaks, so the prompt stays focused on the script correction itself and
//! each rule is independently testable. The cleaned text is what the
//! acceptance check sees: a response that is nothing but a fence comes out
//! empty and is rejected for retry.
//!
//! ## Rule Order
//!
//! Fences are stripped before line-ending normalisation so the fence regex
//! only has to know `\n`; blank-run collapsing runs last-but-one so it
//! sees the final line structure; the outer trim is last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to one correction response.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence, with or without a language tag
/// 2. Normalise line endings (CRLF → LF)
/// 3. Collapse 3+ consecutive newlines down to 2
/// 4. Trim leading/trailing whitespace
pub fn sanitize_correction(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = collapse_blank_runs(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Collapse excessive blank runs ────────────────────────────────

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_runs(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").to_string()
}
