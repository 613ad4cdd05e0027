use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The time window in which a credential must be shown to be unrevoked
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevokedInterval {
    /// Earliest accepted status list timestamp
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from: Option<u64>,
    /// Latest accepted status list timestamp
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    /// Create a new interval
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    /// Neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Narrow to the strictest of both intervals: the latest `from`, the earliest `to`
    pub fn compare_and_set(&mut self, other: &NonRevokedInterval) {
        self.from = match (self.from, other.from) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.to = match (self.to, other.to) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    /// Replace `from` with an earlier timestamp the verifier accepts.
    /// `overrides` maps a requested `from` to the accepted one
    pub fn update_with_override(&mut self, overrides: &HashMap<u64, u64>) {
        if let Some(from) = self.from {
            if let Some(accepted) = overrides.get(&from) {
                self.from = Some(*accepted);
            }
        }
    }

    /// `timestamp` lies within the interval
    pub fn is_valid(&self, timestamp: u64) -> bool {
        self.from.map_or(true, |f| f <= timestamp) && self.to.map_or(true, |t| timestamp <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn strictest_interval() {
        let mut a = NonRevokedInterval::new(Some(5), Some(20));
        a.compare_and_set(&NonRevokedInterval::new(Some(8), None));
        assert_eq!(a, NonRevokedInterval::new(Some(8), Some(20)));
        a.compare_and_set(&NonRevokedInterval::new(None, Some(12)));
        assert_eq!(a, NonRevokedInterval::new(Some(8), Some(12)));

        let mut empty = NonRevokedInterval::default();
        empty.compare_and_set(&a);
        assert_eq!(empty, a);
    }

    #[test]
    fn validity() {
        let i = NonRevokedInterval::new(Some(10), Some(20));
        assert!(i.is_valid(10));
        assert!(i.is_valid(20));
        assert!(!i.is_valid(9));
        assert!(!i.is_valid(21));
        assert!(NonRevokedInterval::new(None, Some(5)).is_valid(0));
    }

    #[test]
    fn override_from() {
        let mut i = NonRevokedInterval::new(Some(10), Some(20));
        i.update_with_override(&hashmap! {10 => 5});
        assert_eq!(i.from, Some(5));
        i.update_with_override(&hashmap! {10 => 1});
        assert_eq!(i.from, Some(5));
    }
}
