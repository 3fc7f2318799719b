use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A 1-based, inclusive page range as supplied by a caller.
///
/// Bounds are not validated on construction: out-of-range or inverted
/// ranges are legal and simply normalize to fewer (or zero) pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub from: i64,
    pub to: i64,
}

impl PageRange {
    pub fn new(from: i64, to: i64) -> Self {
        PageRange { from, to }
    }

    /// Parse a page range specification like "1-5" or "7"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        if let Some(dash_pos) = s.find('-') {
            // "-5" is not a range
            if dash_pos == 0 {
                return Err(anyhow!("Invalid page range: {}", s));
            }

            let from = parse_page_number(&s[..dash_pos])?;
            let to = parse_page_number(&s[dash_pos + 1..])?;
            Ok(PageRange { from, to })
        } else {
            let page = parse_page_number(s)?;
            Ok(PageRange {
                from: page,
                to: page,
            })
        }
    }

    /// Clamp this range against `page_count` and return the zero-based
    /// indices it covers, in ascending order. Never fails: a range that
    /// lies outside the document or is inverted yields no indices.
    pub fn normalize(&self, page_count: usize) -> Vec<usize> {
        let page_count = i64::try_from(page_count).unwrap_or(i64::MAX);
        let start = self.from.saturating_sub(1).max(0);
        let end = self.to.min(page_count);

        if end <= start {
            return Vec::new();
        }

        (start as usize..end as usize).collect()
    }
}

fn parse_page_number(s: &str) -> Result<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .map_err(|_| anyhow!("Invalid page number: {}", s))
}

/// Parse a comma-separated list of page ranges like "1-5,10,15-20"
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>> {
    s.split(',').map(PageRange::parse).collect()
}

/// Parse a comma-separated list of page numbers like "3,1,1".
/// Order and duplicates are kept as written.
pub fn parse_page_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return Err(anyhow!("Empty page number"));
            }
            parse_page_number(part)
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: length is max(0, min(count, to) - max(0, from - 1))
        #[test]
        fn normalize_length_law(from in -50i64..150, to in -50i64..150, count in 0usize..100) {
            let indices = PageRange::new(from, to).normalize(count);
            let expected = (to.min(count as i64) - (from - 1).max(0)).max(0);
            prop_assert_eq!(indices.len() as i64, expected);
        }

        /// Property: indices are contiguous, ascending, start at max(0, from - 1)
        #[test]
        fn normalize_is_contiguous(from in -50i64..150, to in -50i64..150, count in 0usize..100) {
            let indices = PageRange::new(from, to).normalize(count);
            let start = (from - 1).max(0) as usize;
            for (offset, index) in indices.iter().enumerate() {
                prop_assert_eq!(*index, start + offset);
                prop_assert!(*index < count);
            }
        }
    }
}
