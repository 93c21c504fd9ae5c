//! Shared dashboard selection: which company/farm is active and over which dates.
//!
//! The orchestrator reads the date range from here on every request; the
//! caller owns the state and may change it between requests.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::DateRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub company_id: Option<u64>,
    pub farm_id: Option<u64>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    inner: Arc<RwLock<Selection>>,
}

impl SelectionState {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Selection {
                company_id: None,
                farm_id: None,
                date_range,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Selection> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Selection> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Selection {
        self.read().clone()
    }

    pub fn date_range(&self) -> DateRange {
        self.read().date_range
    }

    pub fn set_date_range(&self, range: DateRange) {
        self.write().date_range = range;
    }

    /// Switching company clears the farm selection.
    pub fn select_company(&self, company_id: u64) {
        let mut sel = self.write();
        if sel.company_id != Some(company_id) {
            sel.farm_id = None;
        }
        sel.company_id = Some(company_id);
    }

    pub fn select_farm(&self, farm_id: u64) {
        self.write().farm_id = Some(farm_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn range(day: u32) -> DateRange {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        DateRange::new(d(1), d(day)).unwrap()
    }

    #[test]
    fn clones_share_state() {
        let state = SelectionState::new(range(5));
        let other = state.clone();
        other.set_date_range(range(9));
        assert_eq!(state.date_range(), range(9));
    }

    #[test]
    fn changing_company_resets_farm() {
        let state = SelectionState::new(range(5));
        state.select_company(1);
        state.select_farm(10);
        state.select_company(1);
        assert_eq!(state.snapshot().farm_id, Some(10));

        state.select_company(2);
        let sel = state.snapshot();
        assert_eq!(sel.company_id, Some(2));
        assert_eq!(sel.farm_id, None);
    }
}
