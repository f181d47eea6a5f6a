// src/utils/text.rs

//! Text normalization for the marketplace's legacy Shift_JIS files.
//!
//! [`sanitize`] reduces arbitrary scraped text to characters that survive a
//! Shift_JIS round trip. The passes run in order:
//!
//! 1. strip control characters (tab, newline and carriage return survive)
//! 2. map typographic punctuation to ASCII
//! 3. strip symbols the marketplace rejects (marks, foreign currency,
//!    Greek, super/subscripts, circled digits, unit glyphs, pictographs,
//!    anything outside the BMP)
//! 4. collapse whitespace and trim
//! 5. keep only the allow-listed blocks that also encode cleanly
//!
//! Dropping characters in pass 5 can leave doubled spaces behind, so
//! whitespace is collapsed once more at the end.

use encoding_rs::SHIFT_JIS;

/// Sanitize text for a legacy-encoded cell. Never fails; output is a
/// single line.
pub fn sanitize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());

    for ch in text.chars() {
        if is_stripped_control(ch) {
            continue;
        }
        if let Some(replacement) = ascii_replacement(ch) {
            normalized.push_str(replacement);
            continue;
        }
        if is_stripped_symbol(ch) {
            continue;
        }
        normalized.push(ch);
    }

    let collapsed = collapse_whitespace(&normalized);
    let allowed: String = collapsed.chars().filter(|&c| is_allowed(c)).collect();
    collapse_whitespace(&allowed)
}

/// Sanitize text destined for a single grid cell, flattening line breaks
/// to spaces first.
pub fn sanitize_cell(text: &str) -> String {
    sanitize(&text.replace("\r\n", " ").replace(['\n', '\r'], " "))
}

/// Whether every character of `text` encodes to Shift_JIS unchanged.
pub fn is_legacy_encodable(text: &str) -> bool {
    let (_, _, had_errors) = SHIFT_JIS.encode(text);
    !had_errors
}

/// Whether a character is inside the allow-list and encodes cleanly.
pub fn is_allowed(ch: char) -> bool {
    if (' '..='~').contains(&ch) {
        return true;
    }
    let in_block = matches!(ch,
        '\u{3000}'..='\u{303F}'      // CJK symbols and punctuation
        | '\u{3040}'..='\u{309F}'    // Hiragana
        | '\u{30A0}'..='\u{30FF}'    // Katakana
        | '\u{4E00}'..='\u{9FAF}'    // CJK unified ideographs
        | '\u{FF01}'..='\u{FF5E}'    // Full-width ASCII
    );
    in_block && encodes(ch)
}

fn encodes(ch: char) -> bool {
    let mut buf = [0u8; 4];
    is_legacy_encodable(ch.encode_utf8(&mut buf))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_stripped_control(ch: char) -> bool {
    match ch {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1F}' | '\u{7F}' => true,
        // C1 controls, including the stray 0x97 that breaks the encoder
        '\u{80}'..='\u{9F}' => true,
        _ => false,
    }
}

fn ascii_replacement(ch: char) -> Option<&'static str> {
    let replacement = match ch {
        '\u{2013}' | '\u{2014}' => "-",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        '\u{2026}' => "...",
        '\u{2022}' => "・",
        _ => return None,
    };
    Some(replacement)
}

fn is_stripped_symbol(ch: char) -> bool {
    matches!(ch,
        // Trademark, copyright, registered
        '\u{2122}' | '\u{00A9}' | '\u{00AE}'
        // Currency other than yen
        | '\u{00A2}' | '\u{00A3}' | '\u{00A4}' | '\u{20A0}'..='\u{20CF}'
        | '\u{FFE0}' | '\u{FFE1}' | '\u{FFE6}'
        // Greek
        | '\u{0370}'..='\u{03FF}'
        // Superscript and subscript digits
        | '\u{00B2}' | '\u{00B3}' | '\u{00B9}' | '\u{2070}'..='\u{209F}'
        // Circled and enclosed digits
        | '\u{2460}'..='\u{24FF}' | '\u{2776}'..='\u{2793}'
        // CJK compatibility unit glyphs
        | '\u{3300}'..='\u{33FF}'
        // Miscellaneous symbols, dingbats
        | '\u{2600}'..='\u{27BF}'
        // Pictographs and everything else outside the BMP
        | '\u{10000}'..='\u{10FFFF}'
    )
}
