#![forbid(unsafe_code)]

//! Weight-budget pager.
//!
//! [`ControlPager`] hands out page numbers for a stream of weights: each
//! call to [`ControlPager::get_page`] consumes weight from the current
//! page and closes the page first when the addition would overflow a page
//! that already holds something. A single weight larger than the whole
//! budget therefore lands alone on its own page rather than starving the
//! pass.
//!
//! [`ItemPager`] is the per-control companion for list-style controls
//! that page their own item collections, either in fixed chunks or item
//! by item under the weight budget.

use smallvec::SmallVec;

use crate::error::{PaginateError, PaginateResult};

/// Page assignment for one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSpan {
    /// Visible on every page (pagination disabled or outside the
    /// paginated region).
    All,
    /// Visible on pages `first..=last`, 1-based.
    Range {
        /// First page the control appears on.
        first: u32,
        /// Last page the control appears on.
        last: u32,
    },
}

impl PageSpan {
    /// Span covering exactly one page.
    #[must_use]
    pub fn single(page: u32) -> Self {
        Self::Range {
            first: page,
            last: page,
        }
    }

    /// First page, `None` for [`PageSpan::All`].
    #[must_use]
    pub fn first(&self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Range { first, .. } => Some(*first),
        }
    }

    /// Last page, `None` for [`PageSpan::All`].
    #[must_use]
    pub fn last(&self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Range { last, .. } => Some(*last),
        }
    }

    /// Whether the control is visible on `page`.
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        match self {
            Self::All => true,
            Self::Range { first, last } => (*first..=*last).contains(&page),
        }
    }

    /// Smallest span covering both operands.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (
                Self::Range { first: a, last: b },
                Self::Range { first: c, last: d },
            ) => Self::Range {
                first: a.min(c),
                last: b.max(d),
            },
        }
    }
}

/// Fallback divisor applied to the raw device capacity when chrome
/// swallows the whole page budget.
const DEGENERATE_BUDGET_DIVISOR: u32 = 2;

/// Greedy weight packer for one pagination pass.
#[derive(Debug, Clone)]
pub struct ControlPager {
    budget: u32,
    page_weight: u32,
    page: u32,
}

impl ControlPager {
    /// Build a pager for one pass.
    ///
    /// `optimum_page_weight` is the device's per-page capacity;
    /// `chrome_weight` is what headers and footers already consume on
    /// every page. When the chrome alone exceeds the capacity the budget
    /// falls back to half the raw capacity instead of failing the pass.
    pub fn new(optimum_page_weight: u32, chrome_weight: u32) -> PaginateResult<Self> {
        if optimum_page_weight == 0 {
            return Err(PaginateError::InvalidArgument {
                argument: "optimum_page_weight",
                message: "must be positive".into(),
            });
        }
        let mut budget = optimum_page_weight.saturating_sub(chrome_weight);
        if budget == 0 {
            budget = (optimum_page_weight / DEGENERATE_BUDGET_DIVISOR).max(1);
        }
        Ok(Self {
            budget,
            page_weight: 0,
            page: 1,
        })
    }

    /// Per-page weight budget for this pass.
    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Current page number, 1-based.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Total pages opened so far. Equal to [`Self::current_page`]; pages
    /// are only ever opened by consuming weight.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page
    }

    /// Weight still available on the current page.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.page_weight)
    }

    /// Consume `weight` and return the page it landed on.
    ///
    /// Closes the current page first when the addition would overflow a
    /// nonempty page; a weight at exactly the budget boundary stays on
    /// the current page. Zero weight never advances the page.
    pub fn get_page(&mut self, weight: u32) -> u32 {
        if self.page_weight > 0 && self.page_weight.saturating_add(weight) > self.budget {
            tracing::trace!(page = self.page, filled = self.page_weight, "page closed");
            self.page += 1;
            self.page_weight = 0;
        }
        self.page_weight = self.page_weight.saturating_add(weight);
        self.page
    }

    /// Build an [`ItemPager`] for a control that pages its own items.
    ///
    /// `per_page > 0` chunks the collection into fixed slices of that many
    /// items; `per_page == 0` places items one by one under the weight
    /// budget. An empty collection yields a pager reporting zero items.
    pub fn item_pager(&mut self, count: u32, per_page: u32, item_weight: u32) -> ItemPager {
        let mut pager = ItemPager {
            first_page: 0,
            last_page: 0,
            starts: SmallVec::new(),
            count,
        };
        if count == 0 {
            let page = self.get_page(0);
            pager.record(page, 0);
            return pager;
        }
        if per_page > 0 {
            let mut start = 0u32;
            while start < count {
                let len = per_page.min(count - start);
                let page = self.get_page(len.saturating_mul(item_weight));
                pager.record(page, start);
                start += len;
            }
        } else {
            for item in 0..count {
                let page = self.get_page(item_weight);
                pager.record(page, item);
            }
        }
        pager
    }
}

/// Item slice bookkeeping for one self-paginating control.
///
/// Built eagerly by [`ControlPager::item_pager`]; per-page slices are
/// derived lazily from the recorded boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPager {
    first_page: u32,
    last_page: u32,
    // First item index on each page of the span, in page order.
    starts: SmallVec<[u32; 8]>,
    count: u32,
}

impl ItemPager {
    fn record(&mut self, page: u32, start: u32) {
        if self.starts.is_empty() {
            self.first_page = page;
            self.last_page = page;
            self.starts.push(start);
            return;
        }
        if page == self.last_page {
            return;
        }
        debug_assert_eq!(page, self.last_page + 1);
        self.last_page = page;
        self.starts.push(start);
    }

    /// Pages the owning control occupies.
    #[must_use]
    pub fn span(&self) -> PageSpan {
        PageSpan::Range {
            first: self.first_page,
            last: self.last_page,
        }
    }

    /// Total items in the collection.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.count
    }

    /// `(first_index, count)` of the items shown on `page`; `(0, 0)` off
    /// the owner's span.
    #[must_use]
    pub fn item_range(&self, page: u32) -> (u32, u32) {
        if self.count == 0 || page < self.first_page || page > self.last_page {
            return (0, 0);
        }
        let offset = (page - self.first_page) as usize;
        let start = self.starts[offset];
        let end = match self.starts.get(offset + 1) {
            Some(&next) => next,
            None => self.count,
        };
        (start, end - start)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Greedy packing never overfills a page unless a single weight
        // alone exceeds the budget, in which case it sits alone.
        #[test]
        fn pages_never_exceed_budget(
            weights in proptest::collection::vec(0u32..200, 1..60),
            budget in 1u32..150,
        ) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let mut fill: std::collections::BTreeMap<u32, Vec<u32>> = Default::default();
            for &w in &weights {
                let page = pager.get_page(w);
                fill.entry(page).or_default().push(w);
            }
            for contents in fill.values() {
                let total: u64 = contents.iter().map(|&w| u64::from(w)).sum();
                if total > u64::from(budget) {
                    prop_assert_eq!(contents.len(), 1, "overfull page must be a singleton");
                    prop_assert!(contents[0] > budget);
                }
            }
        }

        // Page numbers from a pager are monotone and gap-free.
        #[test]
        fn pages_are_monotone_and_dense(
            weights in proptest::collection::vec(0u32..200, 1..60),
            budget in 1u32..150,
        ) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let mut last = 1u32;
            for &w in &weights {
                let page = pager.get_page(w);
                prop_assert!(page == last || page == last + 1);
                last = page;
            }
            prop_assert_eq!(pager.page_count(), last);
        }

        // Item ranges partition the collection exactly.
        #[test]
        fn item_ranges_partition(
            count in 0u32..40,
            per_page in 0u32..6,
            item_weight in 1u32..80,
            budget in 1u32..200,
        ) {
            let mut pager = ControlPager::new(budget, 0).unwrap();
            let items = pager.item_pager(count, per_page, item_weight);
            let PageSpan::Range { first, last } = items.span() else {
                prop_assert!(false, "item pager span must be a range");
                return Ok(());
            };
            let mut next = 0u32;
            for page in first..=last {
                let (start, len) = items.item_range(page);
                if count == 0 {
                    prop_assert_eq!((start, len), (0, 0));
                    continue;
                }
                prop_assert_eq!(start, next, "slices must be contiguous");
                if page < last {
                    prop_assert!(len > 0, "interior pages must show items");
                }
                next += len;
            }
            prop_assert_eq!(next, count);
        }
    }
}
