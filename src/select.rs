//! Page selection for the split operation
//!
//! Turns a split request into an ordered list of units (page index lists)
//! and the policy deciding whether those units become one output or many.

use crate::page_range::PageRange;
use std::fmt;

/// How a split request picks its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// One unit per supplied range, in supplied order.
    Range { ranges: Vec<PageRange>, merge: bool },
    /// Explicit 1-based page numbers, in supplied order.
    Extract { pages: Vec<i64>, merge: bool },
}

/// Names what an output document holds; part of its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLabel {
    Range { from: i64, to: i64 },
    Page(usize),
    Merged,
    ExtractedMerged,
}

impl fmt::Display for UnitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitLabel::Range { from, to } => write!(f, "range-{}-{}", from, to),
            UnitLabel::Page(page) => write!(f, "page-{}", page),
            UnitLabel::Merged => f.write_str("merged"),
            UnitLabel::ExtractedMerged => f.write_str("extracted-merged"),
        }
    }
}

/// Zero-based page indices destined for one potential output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub indices: Vec<usize>,
    pub label: UnitLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fanout {
    /// Every unit becomes its own output.
    Separate,
    /// All units collapse into one output with this label.
    Merged(UnitLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub units: Vec<Unit>,
    pub fanout: Fanout,
}

/// Resolve a split request against a document of `page_count` pages.
/// Units that cover no pages are dropped; never fails.
pub fn select(mode: &SplitMode, page_count: usize) -> Selection {
    match mode {
        SplitMode::Range { ranges, merge } => {
            let units = ranges
                .iter()
                .filter_map(|range| {
                    let indices = range.normalize(page_count);
                    (!indices.is_empty()).then(|| Unit {
                        indices,
                        label: UnitLabel::Range {
                            from: range.from,
                            to: range.to,
                        },
                    })
                })
                .collect();
            let fanout = if *merge {
                Fanout::Merged(UnitLabel::Merged)
            } else {
                Fanout::Separate
            };
            Selection { units, fanout }
        }
        SplitMode::Extract { pages, merge } => {
            let indices: Vec<usize> = pages
                .iter()
                .filter(|&&page| page >= 1)
                .map(|&page| (page - 1) as usize)
                .filter(|&index| index < page_count)
                .collect();

            if *merge {
                let units = if indices.is_empty() {
                    Vec::new()
                } else {
                    vec![Unit {
                        indices,
                        label: UnitLabel::ExtractedMerged,
                    }]
                };
                Selection {
                    units,
                    fanout: Fanout::Merged(UnitLabel::ExtractedMerged),
                }
            } else {
                let units = indices
                    .into_iter()
                    .map(|index| Unit {
                        indices: vec![index],
                        label: UnitLabel::Page(index + 1),
                    })
                    .collect();
                Selection {
                    units,
                    fanout: Fanout::Separate,
                }
            }
        }
    }
}
