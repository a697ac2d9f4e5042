//! Synthetic bills for load testing.

use crate::model::{Amount, Bill, Category, EntryType};
use rand::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// 2019-01-01T00:00:00+08:00
const DEFAULT_START: i64 = 1_546_272_000_000;

/// Used when the ledger has no categories to draw from.
const FALLBACK_CATEGORY_COUNT: usize = 8;

/// Configuration for the bill generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Number of bills to produce
    pub count: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Earliest bill time in epoch milliseconds
    pub start: i64,
    /// Bills are spread over this many days after `start`
    pub span_days: u32,
    /// Share of bills that are revenue (0.0 - 1.0)
    pub revenue_ratio: f64,
    /// Largest amount in cents
    pub max_cents: i64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            count: 1000,
            seed: None,
            start: DEFAULT_START,
            span_days: 365,
            revenue_ratio: 0.1,
            max_cents: 500_000,
        }
    }
}

impl GenerateOptions {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Produces `options.count` bills without ids, filed under `categories` of the matching type
/// where possible.
pub fn bills(categories: &[Category], options: &GenerateOptions) -> Vec<Bill> {
    let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    debug!("Generating {} bills with seed {seed}", options.count);

    let pool = CategoryPool::new(categories, &mut rng);
    let span = i64::from(options.span_days.max(1)) * DAY_MILLIS;
    let revenue_ratio = options.revenue_ratio.clamp(0.0, 1.0);
    let max_cents = options.max_cents.max(1);

    (0..options.count)
        .map(|_| {
            let r#type = if rng.gen_bool(revenue_ratio) {
                EntryType::Revenue
            } else {
                EntryType::Expenditure
            };
            let time = options.start + rng.gen_range(0..span);
            let category = pool.pick(r#type, &mut rng);
            let amount = Decimal::new(rng.gen_range(1..=max_cents), 2);
            Bill::new(r#type, time.to_string(), category, Amount::new(amount))
        })
        .collect()
}

/// Category ids split by type.
struct CategoryPool {
    by_type: [Vec<String>; 2],
}

impl CategoryPool {
    fn new(categories: &[Category], rng: &mut StdRng) -> Self {
        let mut by_type: [Vec<String>; 2] = [Vec::new(), Vec::new()];
        for category in categories {
            by_type[category.r#type().index()].push(category.id().to_string());
        }
        if by_type.iter().all(|ids| ids.is_empty()) {
            by_type[EntryType::Expenditure.index()] = (0..FALLBACK_CATEGORY_COUNT)
                .map(|_| format!("{:010x}", rng.gen::<u64>() & 0xff_ffff_ffff))
                .collect();
        }
        Self { by_type }
    }

    fn pick(&self, r#type: EntryType, rng: &mut StdRng) -> String {
        let ids = match &self.by_type[r#type.index()] {
            ids if ids.is_empty() => &self.by_type[1 - r#type.index()],
            ids => ids,
        };
        ids.choose(rng).cloned().unwrap_or_default()
    }
}
