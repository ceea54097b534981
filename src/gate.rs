use std::borrow::Borrow;

use tracing::info;

use crate::config::FREE_PREVIEW_ROWS;
use crate::types::{FeedRow, Fixture, Prediction};

/// Premium flag for the session. Starts locked; only a verified payment
/// unlocks it, and nothing locks it again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entitlement {
    premium: bool,
}

impl Entitlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_premium(&self) -> bool {
        self.premium
    }

    /// Returns true only on the call that actually flipped the flag.
    pub(crate) fn grant(&mut self) -> bool {
        if self.premium {
            return false;
        }
        self.premium = true;
        info!("premium entitlement granted");
        true
    }
}

/// `row_index` is the position within the filtered, displayed sequence, so
/// re-filtering can move different fixtures into the free slots.
pub fn is_visible(entitlement: &Entitlement, row_index: usize) -> bool {
    entitlement.is_premium() || row_index < FREE_PREVIEW_ROWS
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowContent<'a> {
    /// Prediction content may be shown (it may still be absent).
    Unlocked(Option<&'a Prediction>),
    /// Show the lock affordance in place of prediction content.
    Locked,
}

/// A displayed row: fixture identity is always public.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedRow<'a> {
    pub index: usize,
    pub fixture: &'a Fixture,
    pub content: RowContent<'a>,
}

impl GatedRow<'_> {
    pub fn is_locked(&self) -> bool {
        matches!(self.content, RowContent::Locked)
    }
}

/// Gate an already filtered and ordered list.
pub fn gate<'a, R: Borrow<FeedRow>>(rows: &'a [R], entitlement: &Entitlement) -> Vec<GatedRow<'a>> {
    rows.iter()
        .map(<R as Borrow<FeedRow>>::borrow)
        .enumerate()
        .map(|(index, row)| GatedRow {
            index,
            fixture: &row.fixture,
            content: if is_visible(entitlement, index) {
                RowContent::Unlocked(row.prediction.as_ref())
            } else {
                RowContent::Locked
            },
        })
        .collect()
}
