//! Natural, version-aware string ordering.
//!
//! Version directories and index entries are sorted with [`compare`], which
//! understands numeric segments ("1.9" < "1.10") without requiring strict
//! semver input.

use std::cmp::Ordering;

/// Compare two version strings segment by segment.
///
/// Strings are split into runs of digits and runs of other characters
/// (separators `.`, `-`, `_` and `+` only delimit). Numeric runs compare by
/// value, other runs lexically, and numeric runs order before alphabetic
/// ones. A string that is a prefix of another orders first, so
/// "1.2" < "1.2.1".
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Segment::Number(l), Segment::Number(r)) => l.cmp(r),
            (Segment::Text(l), Segment::Text(r)) => l.cmp(r),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Number(u64),
    Text(&'a str),
}

fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut rest = s;

    while !rest.is_empty() {
        let trimmed = rest.trim_start_matches(['.', '-', '_', '+']);
        if trimmed.is_empty() {
            break;
        }

        let end = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            trimmed
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(trimmed.len())
        } else {
            trimmed
                .find(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '_' | '+'))
                .unwrap_or(trimmed.len())
        };

        let (run, tail) = trimmed.split_at(end);
        result.push(match run.parse::<u64>() {
            Ok(n) => Segment::Number(n),
            Err(_) => Segment::Text(run),
        });
        rest = tail;
    }

    result
}
