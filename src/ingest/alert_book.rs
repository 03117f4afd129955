use std::sync::{PoisonError, RwLock};

use dashmap::DashSet;

use crate::elements::{Alert, SeriesKey, Timestamp};

/// Which series entries were judged regressions, and every alert raised so far.
#[derive(Debug, Default)]
pub struct AlertBook {
    flagged: DashSet<(SeriesKey, u64)>,
    alerts: RwLock<Vec<Alert>>,
}

impl AlertBook {
    pub fn flag(&self, key: &SeriesKey, sequence: u64) {
        self.flagged.insert((key.clone(), sequence));
    }

    pub fn is_flagged(&self, key: &SeriesKey, sequence: u64) -> bool {
        self.flagged.contains(&(key.clone(), sequence))
    }

    pub fn record(&self, alert: Alert) {
        self.alerts.write().unwrap_or_else(PoisonError::into_inner).push(alert);
    }

    /// Alerts raised at or after `since`, ordered by when they were raised.
    pub fn alerts(&self, since: Option<Timestamp>) -> Vec<Alert> {
        let alerts = self.alerts.read().unwrap_or_else(PoisonError::into_inner);
        let mut selected: Vec<Alert> = alerts
            .iter()
            .filter(|a| since.map_or(true, |since| since <= a.raised_at))
            .cloned()
            .collect();
        selected.sort_by_key(|a| a.raised_at);
        selected
    }

    pub fn len(&self) -> usize {
        self.alerts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
