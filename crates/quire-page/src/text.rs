#![forbid(unsafe_code)]

//! Text-flow chunking for long-text controls.
//!
//! A text control holds a flat sequence of [`TextRun`]s (plain text or
//! links). The chunker cuts the flow into per-page slices under the
//! pager's weight budget:
//!
//! - a page boundary falls on the last whitespace or punctuation grapheme
//!   at or before the budget offset inside the run being scanned;
//! - a run with no such break point is cut exactly at the budget offset
//!   (grapheme clusters are never split);
//! - a link run is atomic: the boundary falls immediately before or after
//!   the whole run, and a link wider than a page gets a page to itself;
//! - the scan is monotonic: runs consumed by earlier pages are never
//!   revisited;
//! - once the remaining text fits the page budget, the final slice runs
//!   to the absolute end of the flow.
//!
//! Every non-final slice accounts for its page's full remaining budget,
//! so a page never hosts two slices of the same control; the final slice
//! leaves whatever room is left for the controls that follow.

use quire_core::{CHARS_PER_WEIGHT_UNIT, TextRun};
use unicode_segmentation::UnicodeSegmentation;

use crate::pager::{ControlPager, PageSpan};

/// A position in a run sequence: run index plus byte offset into that
/// run's text. The end of the flow is `(runs.len(), 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    /// Run index.
    pub run: usize,
    /// Byte offset inside the run's text, always on a grapheme boundary.
    pub byte: usize,
}

impl TextPosition {
    /// Start of the flow.
    pub const START: Self = Self { run: 0, byte: 0 };
}

/// One page's worth of a text flow: `start..end`, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSlice {
    /// Page the slice is shown on.
    pub page: u32,
    /// First grapheme of the slice.
    pub start: TextPosition,
    /// One past the last grapheme of the slice.
    pub end: TextPosition,
}

impl TextSlice {
    /// Materialize the slice's text from the run sequence.
    #[must_use]
    pub fn extract(&self, runs: &[TextRun]) -> String {
        let mut out = String::new();
        for (index, run) in runs.iter().enumerate() {
            if index < self.start.run || index > self.end.run {
                continue;
            }
            let from = if index == self.start.run { self.start.byte } else { 0 };
            let to = if index == self.end.run {
                self.end.byte
            } else {
                run.text.len()
            };
            out.push_str(&run.text[from..to]);
        }
        out
    }
}

/// Result of chunking one text flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    slices: Vec<TextSlice>,
    span: PageSpan,
}

impl TextLayout {
    /// Pages the owning control occupies.
    #[must_use]
    pub fn span(&self) -> PageSpan {
        self.span
    }

    /// All slices, in page order.
    #[must_use]
    pub fn slices(&self) -> &[TextSlice] {
        &self.slices
    }

    /// The slice shown on `page`, if the control appears there.
    #[must_use]
    pub fn slice_for_page(&self, page: u32) -> Option<&TextSlice> {
        self.slices.iter().find(|s| s.page == page)
    }
}

fn is_break(grapheme: &str) -> bool {
    grapheme
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c.is_ascii_punctuation())
}

/// Skip past exhausted (or empty) runs.
fn normalize(runs: &[TextRun], mut pos: TextPosition) -> TextPosition {
    while pos.run < runs.len() && pos.byte >= runs[pos.run].text.len() {
        pos.run += 1;
        pos.byte = 0;
    }
    pos
}

/// Find the end of one page-sized slice starting at `start`.
///
/// Returns the end position and the number of graphemes consumed, which
/// is less than `char_budget` when the slice ends at a break candidate.
fn page_slice(runs: &[TextRun], start: TextPosition, char_budget: usize) -> (TextPosition, usize) {
    debug_assert!(char_budget > 0);
    let mut pos = normalize(runs, start);
    let mut consumed = 0usize;

    while pos.run < runs.len() {
        let run = &runs[pos.run];
        if run.is_link() {
            let len = run.grapheme_len();
            if consumed + len > char_budget {
                if consumed == 0 {
                    // Link alone exceeds the page: it gets the page to
                    // itself rather than being split.
                    return (normalize(runs, TextPosition { run: pos.run + 1, byte: 0 }), len);
                }
                return (pos, consumed);
            }
            consumed += len;
            pos = normalize(runs, TextPosition { run: pos.run + 1, byte: 0 });
            continue;
        }

        // Last break seen in this run, with the consumption count that
        // ends the page there. The break search is scoped to the run
        // the budget lands in; earlier runs are not revisited.
        let mut candidate: Option<(TextPosition, usize)> = None;
        let base = pos.byte;
        for (offset, grapheme) in run.text[base..].grapheme_indices(true) {
            if consumed == char_budget {
                let here = TextPosition {
                    run: pos.run,
                    byte: base + offset,
                };
                return candidate.unwrap_or((here, consumed));
            }
            consumed += 1;
            if is_break(grapheme) {
                let after = normalize(
                    runs,
                    TextPosition {
                        run: pos.run,
                        byte: base + offset + grapheme.len(),
                    },
                );
                candidate = Some((after, consumed));
            }
        }
        pos = normalize(runs, TextPosition { run: pos.run + 1, byte: 0 });
    }
    (pos, consumed)
}

/// Chunk a text flow against the shared pager.
///
/// Consumes pager weight slice by slice; the first slice fills whatever
/// is left of the current page, later slices take whole pages, and the
/// final slice extends to the end of the flow once the remainder fits.
pub fn paginate_text(runs: &[TextRun], pager: &mut ControlPager) -> TextLayout {
    let chars_per_unit = CHARS_PER_WEIGHT_UNIT as usize;
    let total: usize = runs.iter().map(TextRun::grapheme_len).sum();
    if total == 0 {
        let page = pager.get_page(0);
        let end = normalize(runs, TextPosition::START);
        return TextLayout {
            slices: vec![TextSlice {
                page,
                start: end,
                end,
            }],
            span: PageSpan::single(page),
        };
    }

    let full_budget = pager.budget() as usize * chars_per_unit;
    let mut pos = normalize(runs, TextPosition::START);
    let mut remaining = total;
    let mut slices = Vec::new();
    let mut first = None;
    let mut last = 1;

    while remaining > 0 {
        let available = pager.remaining() as usize * chars_per_unit;
        let char_budget = if available > 0 { available } else { full_budget };
        let (end, consumed) = if remaining <= char_budget {
            // Final slice: everything left, regardless of break points.
            (
                normalize(
                    runs,
                    TextPosition {
                        run: runs.len(),
                        byte: 0,
                    },
                ),
                remaining,
            )
        } else {
            page_slice(runs, pos, char_budget)
        };
        debug_assert!(consumed > 0, "a slice must always make progress");
        let final_slice = consumed == remaining;
        // Non-final slices own the rest of their page; the chosen break
        // ends the page even when it lands short of the budget.
        let weight_chars = if final_slice {
            consumed
        } else {
            consumed.max(char_budget)
        };
        let weight = weight_chars.div_ceil(chars_per_unit) as u32;
        let page = pager.get_page(weight);
        tracing::trace!(page, consumed, remaining, "text slice placed");
        slices.push(TextSlice {
            page,
            start: pos,
            end,
        });
        first.get_or_insert(page);
        last = page;
        pos = end;
        remaining -= consumed;
    }

    TextLayout {
        span: PageSpan::Range {
            first: first.unwrap_or(last),
            last,
        },
        slices,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_runs() -> impl Strategy<Value = Vec<TextRun>> {
        proptest::collection::vec(
            prop_oneof![
                "[a-z ]{0,20}".prop_map(TextRun::text),
                "[a-z]{1,12}".prop_map(|t| TextRun::link(t, "#x")),
            ],
            0..6,
        )
    }

    proptest! {
        // Slices reconstruct the flow exactly, in order, with no page
        // ever left empty while content remains.
        #[test]
        fn slices_reconstruct_flow(runs in arb_runs(), budget in 1u32..40) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let layout = paginate_text(&runs, &mut pager);
            let rebuilt: String = layout
                .slices()
                .iter()
                .map(|s| s.extract(&runs))
                .collect();
            let original: String = runs.iter().map(|r| r.text.as_str()).collect();
            prop_assert_eq!(rebuilt, original.clone());
            if !original.is_empty() {
                for slice in layout.slices() {
                    prop_assert!(
                        !slice.extract(&runs).is_empty(),
                        "empty slice on page {}",
                        slice.page
                    );
                }
            }
        }

        // Links are atomic: every link run lands wholly inside one slice.
        #[test]
        fn links_never_split(runs in arb_runs(), budget in 1u32..40) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let layout = paginate_text(&runs, &mut pager);
            for (index, run) in runs.iter().enumerate() {
                if !run.is_link() || run.text.is_empty() {
                    continue;
                }
                let holders = layout
                    .slices()
                    .iter()
                    .filter(|s| {
                        (s.start.run < index || (s.start.run == index && s.start.byte == 0))
                            && (s.end.run > index
                                || (s.end.run == index && s.end.byte >= run.text.len()))
                    })
                    .count();
                prop_assert!(holders >= 1, "link run {} split across slices", index);
            }
        }

        // Page numbers on slices are strictly increasing.
        #[test]
        fn slice_pages_increase(runs in arb_runs(), budget in 1u32..40) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let layout = paginate_text(&runs, &mut pager);
            let pages: Vec<u32> = layout.slices().iter().map(|s| s.page).collect();
            for pair in pages.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
