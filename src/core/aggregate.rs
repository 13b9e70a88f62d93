//! Whole-collection reductions for dashboards
//!
//! Aggregates always run over the full collection (or any iterator of
//! records the caller picks), never over the current page. Maps keep
//! first-seen order so ties resolve to whichever key appeared first.

use crate::core::entity::Data;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub fn count<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> usize {
    records.into_iter().count()
}

/// Sum of [`Data::measure`], ignoring units
pub fn sum_measure<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> f64 {
    records.into_iter().map(Data::measure).sum()
}

/// Sum of measures converted into `base`, rounded to cents.
///
/// `convert(amount, from, to)` is only called for records whose unit differs
/// from `base`; records without a unit are taken to already be in `base`.
pub fn sum_in_unit<'a, T, F>(records: impl IntoIterator<Item = &'a T>, base: &str, convert: F) -> f64
where
    T: Data,
    F: Fn(f64, &str, &str) -> f64,
{
    let total: f64 = records
        .into_iter()
        .map(|r| match r.unit() {
            Some(unit) if !unit.eq_ignore_ascii_case(base) => convert(r.measure(), unit, base),
            _ => r.measure(),
        })
        .sum();
    round_cents(total)
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Categories in first-seen order
pub fn distinct_categories<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    let set: IndexSet<&str> = records.into_iter().filter_map(Data::category).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Tags in first-seen order
pub fn distinct_tags<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    let set: IndexSet<&str> = records
        .into_iter()
        .flat_map(|r| r.tags().iter().map(String::as_str))
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Number of records carrying each tag; a tag repeated within one record counts once
pub fn tag_frequency<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        let unique: IndexSet<&String> = record.tags().iter().collect();
        for tag in unique {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of records per category
pub fn category_counts<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for category in records.into_iter().filter_map(Data::category) {
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Sum of measures per category; records without a category are left out
pub fn category_totals<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> IndexMap<String, f64> {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for record in records {
        if let Some(category) = record.category() {
            *totals.entry(category.to_string()).or_insert(0.0) += record.measure();
        }
    }
    totals
}

/// The `n` most frequent keys, descending; ties keep first-seen order
pub fn top_n_by_frequency(counts: &IndexMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}

/// The `n` records with the highest measure; ties keep collection order
pub fn top_n_by_measure<'a, T: Data>(records: impl IntoIterator<Item = &'a T>, n: usize) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.measure().total_cmp(&a.measure()));
    sorted.truncate(n);
    sorted
}

/// How a timestamp maps to a bucket label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    /// "Monday", "Tuesday", ...
    Weekday,
    /// "2024-03"
    YearMonth,
    /// "2024-03-15"
    Day,
}

impl BucketKey {
    pub fn label(&self, at: DateTime<Utc>) -> String {
        match self {
            BucketKey::Weekday => at.format("%A").to_string(),
            BucketKey::YearMonth => at.format("%Y-%m").to_string(),
            BucketKey::Day => at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Records per bucket of [`Data::occurred_at`], in first-seen order
pub fn bucket_counts<'a, T: Data>(
    records: impl IntoIterator<Item = &'a T>,
    key: BucketKey,
) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        *counts.entry(key.label(record.occurred_at())).or_insert(0) += 1;
    }
    counts
}

/// The bucket with the highest count; the first maximum wins
pub fn busiest_bucket(counts: &IndexMap<String, usize>) -> Option<(String, usize)> {
    let mut best: Option<(&String, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, top)| *count > top) {
            best = Some((label, *count));
        }
    }
    best.map(|(label, count)| (label.clone(), count))
}

/// Records per calendar month, averaged over the months spanned from the
/// earliest to the latest record (both inclusive). Zero for no records.
pub fn average_per_month<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> f64 {
    let mut total = 0usize;
    let mut first: Option<i32> = None;
    let mut last: Option<i32> = None;
    for record in records {
        let at = record.occurred_at();
        let index = at.year() * 12 + at.month0() as i32;
        first = Some(first.map_or(index, |f| f.min(index)));
        last = Some(last.map_or(index, |l| l.max(index)));
        total += 1;
    }
    match (first, last) {
        (Some(first), Some(last)) => total as f64 / (last - first + 1) as f64,
        _ => 0.0,
    }
}

fn active_days<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> BTreeSet<NaiveDate> {
    records.into_iter().map(|r| r.occurred_at().date_naive()).collect()
}

/// Consecutive days with at least one record, ending today.
///
/// A day without records yet does not break the streak: counting starts from
/// yesterday when today is empty.
pub fn current_streak<'a, T: Data>(records: impl IntoIterator<Item = &'a T>, today: NaiveDate) -> u32 {
    let days = active_days(records);
    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive active days
pub fn longest_streak<'a, T: Data>(records: impl IntoIterator<Item = &'a T>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in active_days(records) {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
