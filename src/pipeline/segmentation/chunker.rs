use crate::pipeline::text::{char_len, forward_chars};

/// Split `[start, end)` of `text` into pieces of at most `max_chars`
/// characters. A piece prefers to end at a line break, or else after a
/// sentence terminator (". "), found within its last 20%.
pub fn chunk_span(text: &str, start: usize, end: usize, max_chars: usize) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    if max_chars == 0 || start >= end {
        return pieces;
    }
    let mut cursor = start;
    while cursor < end {
        let limit = forward_chars(text, cursor, max_chars).min(end);
        if limit >= end {
            pieces.push((cursor, end));
            break;
        }
        let search_from = forward_chars(text, cursor, max_chars * 4 / 5).min(limit);
        let tail = &text[search_from..limit];
        let break_at = tail
            .rfind('\n')
            .map(|pos| search_from + pos + 1)
            .or_else(|| tail.rfind(". ").map(|pos| search_from + pos + 2))
            .unwrap_or(limit);
        pieces.push((cursor, break_at));
        cursor = break_at;
    }
    pieces
}

/// Whether `[start, end)` exceeds `max_chars` characters.
pub fn is_oversized(text: &str, start: usize, end: usize, max_chars: usize) -> bool {
    char_len(&text[start..end]) > max_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_span_is_single_piece() {
        let text = "짧은 문서";
        assert_eq!(chunk_span(text, 0, text.len(), 100), vec![(0, text.len())]);
    }

    #[test]
    fn pieces_cover_span_without_gaps() {
        let text = "가".repeat(250);
        let pieces = chunk_span(&text, 0, text.len(), 100);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].0, 0);
        assert_eq!(pieces.last().unwrap().1, text.len());
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        for (s, e) in &pieces {
            assert!(char_len(&text[*s..*e]) <= 100);
        }
    }

    #[test]
    fn prefers_line_break_in_last_fifth() {
        let mut text = "a".repeat(90);
        text.push('\n');
        text.push_str(&"b".repeat(100));
        let pieces = chunk_span(&text, 0, text.len(), 100);
        assert_eq!(pieces[0], (0, 91));
    }

    #[test]
    fn falls_back_to_sentence_break() {
        let mut text = "a".repeat(85);
        text.push_str(". ");
        text.push_str(&"b".repeat(100));
        let pieces = chunk_span(&text, 0, text.len(), 100);
        assert_eq!(pieces[0], (0, 87));
    }

    #[test]
    fn oversized_counts_characters() {
        let text = "가".repeat(10);
        assert!(!is_oversized(&text, 0, text.len(), 10));
        assert!(is_oversized(&text, 0, text.len(), 9));
    }
}
