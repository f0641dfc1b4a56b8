//! Newest-first ordering of chapter records.

use std::cmp::Reverse;

use crate::model::ChapterRecord;

/// Integer prefix of `s`: leading whitespace, optional sign, then digits (`"12abc"` is 12).
///
/// Input with no leading digits, or outside the `i64` range, is 0.
pub fn parse_order_key(s: &str) -> i64 {
    let t = s.trim_start();
    let (negative, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let digits_end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

/// Stable sort by order key, largest first. Equal keys keep their document order.
pub fn sort_newest_first(chapters: &mut [ChapterRecord]) {
    chapters.sort_by_key(|c| Reverse(parse_order_key(&c.order_number)));
}
