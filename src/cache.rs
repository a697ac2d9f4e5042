//! Memoization and uniqueness state shared by every pipeline run of one loaded cashbook.
//!
//! These live in an explicit `Caches` value owned by the `Cashbook` rather than in globals. They
//! only grow while a ledger is loaded and are emptied by `Caches::reset` on a full reload.

use crate::model::{parse_decimal, Amount, AmountError};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::trace;
use uuid::Uuid;

/// How many candidate ids are tried before id generation is considered broken.
const MAX_ID_ATTEMPTS: usize = 64;

/// Length of a generated bill id.
const ID_LEN: usize = 12;

/// Memoized exact decimal parses keyed by their text.
#[derive(Debug, Clone, Default)]
pub struct DecimalCache {
    values: HashMap<String, Decimal>,
}

impl DecimalCache {
    /// Returns the decimal for `key`, parsing and remembering it the first time it is seen.
    pub fn get(&mut self, key: impl AsRef<str>) -> Result<Decimal, AmountError> {
        let key = key.as_ref();
        if let Some(value) = self.values.get(key) {
            return Ok(*value);
        }
        let value = parse_decimal(key)?;
        self.values.insert(key.to_string(), value);
        Ok(value)
    }

    /// Remembers an amount that was parsed elsewhere, keyed by its text.
    pub fn remember(&mut self, amount: Amount) {
        self.values
            .entry(amount.to_string())
            .or_insert_with(|| amount.value());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Memoized conversions of epoch-millisecond text into `YYYY-MM` month strings.
#[derive(Debug, Clone)]
pub struct MonthCache {
    offset: FixedOffset,
    months: HashMap<String, Option<String>>,
}

impl MonthCache {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            months: HashMap::new(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The month that `millis` falls in, or `None` when the text is not a valid timestamp.
    pub fn month(&mut self, millis: &str) -> Option<&str> {
        if !self.months.contains_key(millis) {
            let month = format_month(millis, self.offset);
            if month.is_none() {
                trace!("'{millis}' is not an epoch millisecond timestamp");
            }
            self.months.insert(millis.to_string(), month);
        }
        self.months.get(millis).and_then(|m| m.as_deref())
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    fn clear(&mut self) {
        self.months.clear();
    }
}

fn format_month(millis: &str, offset: FixedOffset) -> Option<String> {
    let millis: i64 = millis.trim().parse().ok()?;
    let time = DateTime::from_timestamp_millis(millis)?.with_timezone(&offset);
    Some(time.format("%Y-%m").to_string())
}

/// Every bill id issued or claimed while the ledger has been loaded.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    issued: HashSet<String>,
}

impl IdRegistry {
    /// Records `id` as in use. Returns `false` if it already was.
    pub fn claim(&mut self, id: impl Into<String>) -> bool {
        self.issued.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.issued.contains(id)
    }

    /// Produces an id that has never been issued or claimed, and claims it.
    ///
    /// # Panics
    /// Panics if no unused id is found after a bounded number of attempts, since that means the
    /// generator itself is broken.
    pub fn generate(&mut self) -> String {
        for _ in 0..MAX_ID_ATTEMPTS {
            let mut id = Uuid::new_v4().simple().to_string();
            id.truncate(ID_LEN);
            if self.claim(id.clone()) {
                return id;
            }
            trace!("Generated id {id} collided, trying again");
        }
        panic!("Unable to generate a unique bill id after {MAX_ID_ATTEMPTS} attempts");
    }

    /// Keeps `id` when it is non-empty and unused, otherwise returns a freshly generated one.
    pub fn assign(&mut self, id: &str) -> String {
        if !id.is_empty() && self.claim(id) {
            id.to_string()
        } else {
            self.generate()
        }
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn clear(&mut self) {
        self.issued.clear();
    }
}

/// The process-wide caches of one loaded cashbook.
#[derive(Debug, Clone)]
pub struct Caches {
    decimals: DecimalCache,
    months: MonthCache,
    ids: IdRegistry,
}

impl Caches {
    /// Creates empty caches. Months are computed in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            decimals: DecimalCache::default(),
            months: MonthCache::new(offset),
            ids: IdRegistry::default(),
        }
    }

    /// Forgets everything. Called when a ledger is loaded from scratch or torn down.
    pub fn reset(&mut self) {
        self.decimals.clear();
        self.months.clear();
        self.ids.clear();
    }

    pub fn decimals(&mut self) -> &mut DecimalCache {
        &mut self.decimals
    }

    pub fn months(&mut self) -> &mut MonthCache {
        &mut self.months
    }

    pub fn ids(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    pub fn offset(&self) -> FixedOffset {
        self.months.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beijing() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_decimal_cache_memoizes() {
        let mut cache = DecimalCache::default();
        let a = cache.get("5400").unwrap();
        let b = cache.get("5400").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Decimal::from(5400));
        assert_eq!(cache.len(), 1);
        cache.get("0.1").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_decimal_cache_exact_arithmetic() {
        let mut cache = DecimalCache::default();
        let sum = cache.get("0.1").unwrap() + cache.get("0.2").unwrap();
        assert_eq!(sum, cache.get("0.3").unwrap());
        assert_eq!(sum - cache.get("0.1").unwrap(), cache.get("0.2").unwrap());
    }

    #[test]
    fn test_decimal_cache_rejects_garbage() {
        let mut cache = DecimalCache::default();
        assert!(cache.get("abc").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_month_in_offset() {
        let mut months = MonthCache::new(beijing());
        // 2019-06-30T16:00:00Z is already July in UTC+8
        assert_eq!(months.month("1561910400000"), Some("2019-07"));
        assert_eq!(months.month("1577345303191"), Some("2019-12"));
        assert_eq!(months.len(), 2);
    }

    #[test]
    fn test_month_in_utc() {
        let mut months = MonthCache::new(FixedOffset::east_opt(0).unwrap());
        assert_eq!(months.month("1561910400000"), Some("2019-06"));
    }

    #[test]
    fn test_month_of_garbage() {
        let mut months = MonthCache::new(beijing());
        assert_eq!(months.month("yesterday"), None);
        assert_eq!(months.month(""), None);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut ids = IdRegistry::default();
        let generated: HashSet<String> = (0..1000).map(|_| ids.generate()).collect();
        assert_eq!(generated.len(), 1000);
        assert!(generated.iter().all(|id| id.len() == ID_LEN));
    }

    #[test]
    fn test_assign_keeps_unused_id() {
        let mut ids = IdRegistry::default();
        assert_eq!(ids.assign("foo"), "foo");
        assert!(ids.contains("foo"));
    }

    #[test]
    fn test_assign_replaces_taken_or_empty_id() {
        let mut ids = IdRegistry::default();
        ids.claim("foo");
        let replaced = ids.assign("foo");
        assert_ne!(replaced, "foo");
        let fresh = ids.assign("");
        assert!(!fresh.is_empty());
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_remember_keeps_scale_in_key() {
        let mut decimals = DecimalCache::default();
        decimals.remember(Amount::new(Decimal::new(1250, 2)));
        decimals.remember(Amount::new(Decimal::new(1250, 2)));
        assert_eq!(decimals.len(), 1);
        assert_eq!(decimals.get("12.50").unwrap(), Decimal::new(1250, 2));
        assert_eq!(decimals.len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut caches = Caches::new(beijing());
        caches.decimals().get("1").unwrap();
        caches.months().month("0");
        caches.ids().generate();
        caches.reset();
        assert!(caches.decimals().is_empty());
        assert!(caches.months().is_empty());
        assert!(caches.ids().is_empty());
        assert_eq!(caches.offset(), beijing());
    }
}
