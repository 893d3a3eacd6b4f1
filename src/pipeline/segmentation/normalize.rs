/// Normalize OCR text without moving any byte offset.
///
/// Each character is replaced by a character of the same UTF-8 width, so
/// char boundaries (and therefore every position computed on the result)
/// are identical to the input. Control characters become plain spaces and
/// invisible separators become visible whitespace. Date punctuation
/// (`.` `-` `/` `년` `월` `일` and their full-width forms) is kept as is.
pub fn normalize_preserving_offsets(raw: &str) -> String {
    raw.chars().map(normalize_char).collect()
}

fn normalize_char(c: char) -> char {
    match c {
        '\n' => '\n',
        '\r' | '\t' => ' ',
        // C0 controls and DEL (1 byte)
        c if (c as u32) < 0x20 || c == '\u{7f}' => ' ',
        // C1 controls (2 bytes) -> no-break space (2 bytes)
        c if ('\u{80}'..='\u{9f}').contains(&c) => '\u{a0}',
        // zero-width space, word joiner, BOM (3 bytes) -> en space (3 bytes)
        '\u{200b}' | '\u{2060}' | '\u{feff}' => '\u{2002}',
        c => c,
    }
}

/// Fold full-width digits to ASCII so numeric captures parse.
pub fn fold_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            c => c,
        })
        .collect()
}
