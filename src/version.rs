//! Ordering of fix-version labels.
//!
//! Labels are usually dotted release numbers ("6.15", "6.15.2") but branch
//! names ("main") show up too, so comparison coerces into a numeric triple
//! where possible and falls back to plain string ordering otherwise.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").unwrap();
}

/// Coerce a version label into a (major, minor, patch) triple.
///
/// Takes the first run of digits and up to two dotted continuations, so
/// "6.15" becomes (6, 15, 0) and "v6.15.2" becomes (6, 15, 2). Returns
/// `None` when the label contains no digits at all.
fn coerce(label: &str) -> Option<(u64, u64, u64)> {
    let caps = DIGITS.captures(label)?;

    let part = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    Some((part(1), part(2), part(3)))
}

/// Compare two version labels.
///
/// Both coercible: numeric comparison of the triples. Either one not
/// coercible: byte-wise comparison of the original strings. Never panics.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (coerce(a), coerce(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => a.cmp(b),
    }
}

/// True when `a` orders strictly after `b`.
pub fn is_higher(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Greater
}
