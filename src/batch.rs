//! Batching: split raw OCR text into size-bounded correction units.
//!
//! The raw-text artifact holds one section per page, pages separated by a
//! blank line. Correction services charge per request and degrade on very
//! long inputs, so paragraphs are greedily packed into batches of at most
//! [`max_chars`](batch) characters before submission.
//!
//! Two invariants govern the packing:
//!
//! * every paragraph appears in exactly one batch, in original order;
//! * the size cap is a soft target — a single paragraph longer than
//!   `max_chars` is emitted whole in its own batch, never truncated or
//!   split, because cutting mid-paragraph would hand the model a fragment
//!   with no sentence boundary to anchor corrections on.
//!
//! This module is a pure function of its inputs: no network, no
//! filesystem, same input always yields the same batch sequence.

/// Separator between pages in the raw-text artifact, between paragraphs
/// within a batch, and between corrected batches in the output artifact.
///
/// One delimiter end to end means concatenating the per-batch corrections
/// reproduces the paragraph structure of the source document.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// Split `raw_text` into an ordered sequence of size-bounded batches.
///
/// Paragraphs (delimiter-separated segments) are accumulated greedily:
/// while the buffer's character count plus the next paragraph's stays below
/// `max_chars`, the paragraph is appended; otherwise the buffer closes as a
/// batch and the paragraph starts the next one. The trailing buffer is
/// flushed at end of input. Batches that trim to nothing are not emitted,
/// so empty input (or input of only blank lines) yields an empty sequence.
///
/// Lengths are measured in Unicode scalar values, not bytes. Devanagari is
/// three bytes per character in UTF-8; counting bytes would cut batch
/// payloads to a third of the intended size.
pub fn batch(raw_text: &str, max_chars: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for paragraph in raw_text.split(PARAGRAPH_DELIMITER) {
        let paragraph_chars = paragraph.chars().count();
        if buffer_chars + paragraph_chars < max_chars {
            buffer.push_str(paragraph);
            buffer.push_str(PARAGRAPH_DELIMITER);
            buffer_chars += paragraph_chars + 2;
        } else {
            flush(&mut batches, &buffer);
            buffer.clear();
            buffer.push_str(paragraph);
            buffer.push_str(PARAGRAPH_DELIMITER);
            buffer_chars = paragraph_chars + 2;
        }
    }
    flush(&mut batches, &buffer);

    batches
}

/// Close `buffer` as a batch unless it trims to nothing.
fn flush(batches: &mut Vec<String>, buffer: &str) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(batch("", 1500).is_empty());
    }

    #[test]
    fn whitespace_only_input_yields_no_batches() {
        assert!(batch("\n\n\n\n   \n\n", 1500).is_empty());
    }

    #[test]
    fn single_short_paragraph_is_one_batch() {
        let batches = batch("Short paragraph.", 1500);
        assert_eq!(batches, vec!["Short paragraph."]);
    }

    #[test]
    fn small_paragraphs_merge_under_the_cap() {
        let batches = batch("one\n\ntwo\n\nthree", 1500);
        assert_eq!(batches, vec!["one\n\ntwo\n\nthree"]);
    }

    // Each paragraph alone exceeds or nears the 20-char cap, so no merging
    // occurs and the oversized final paragraph is still emitted whole.
    #[test]
    fn near_cap_paragraphs_do_not_merge() {
        let raw = "Alpha text.\n\nBeta text.\n\nGamma text that is very long (exceeds threshold alone).";
        let batches = batch(raw, 20);
        assert_eq!(
            batches,
            vec![
                "Alpha text.",
                "Beta text.",
                "Gamma text that is very long (exceeds threshold alone).",
            ]
        );
    }

    #[test]
    fn oversized_paragraph_is_emitted_whole_and_alone() {
        let long = "x".repeat(5000);
        let raw = format!("small\n\n{long}\n\ntail");
        let batches = batch(&raw, 100);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0], "small");
        assert_eq!(batches[1], long);
        assert_eq!(batches[2], "tail");
    }

    #[test]
    fn every_batch_is_under_cap_or_a_lone_oversized_paragraph() {
        let raw = "aaaa\n\nbbbb\n\ncccccccccccccccccccccccccccccc\n\ndddd\n\neeee\n\nffff";
        let max = 12;
        for b in batch(raw, max) {
            let within = b.chars().count() < max;
            let lone_oversized = !b.contains(PARAGRAPH_DELIMITER) && b.chars().count() >= max;
            assert!(within || lone_oversized, "batch violates size invariant: {b:?}");
        }
    }

    #[test]
    fn rejoined_batches_reproduce_content_in_order() {
        let raw = "पठमं\n\nदुतियं\n\n\n\nततियं\n\nचतुत्थं";
        let rejoined = batch(raw, 10).join(PARAGRAPH_DELIMITER);
        // Identical to the source minus the empty segment, which never
        // starts a batch of its own.
        assert_eq!(rejoined, "पठमं\n\nदुतियं\n\nततियं\n\nचतुत्थं");
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        // Paragraphs of 8 and 9 Devanagari chars (24 and 27 UTF-8 bytes).
        // A 24-char cap must merge them (19 chars total with delimiter); a
        // byte count would overflow on the first paragraph alone.
        let raw = "धम्मपदम्\n\nसुत्तन्तो";
        let merged = batch(raw, 24);
        assert_eq!(merged.len(), 1);

        let batches = batch(raw, 19);
        assert_eq!(batches.len(), 2, "19-char cap closes before the second paragraph");
    }

    #[test]
    fn deterministic_across_calls() {
        let raw = "एकं\n\nद्वे\n\nत्रीणि\n\nचत्वारि\n\nपञ्च";
        assert_eq!(batch(raw, 15), batch(raw, 15));
    }
}
