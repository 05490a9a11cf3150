//! Pure view derivations over a fetched circular snapshot.
//!
//! Everything here is side-effect free and operates on whatever list the
//! feed cache last fetched; no function reaches back to the network.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::model::{Circular, Priority};

/// Number of circulars the local consumer has not read yet.
pub fn unread_count(circulars: &[Circular], read_ids: &HashSet<String>) -> usize {
    circulars
        .iter()
        .filter(|c| !read_ids.contains(&c.id))
        .count()
}

/// Share of addressed recipients that have read `c`, as a rounded percent.
///
/// The denominator is clamped to 1, so an unaddressed circular yields 0
/// instead of dividing by zero. The read log is never reconciled against
/// the recipient count, so values above 100 are possible with stale data.
pub fn read_percentage(c: &Circular) -> u32 {
    let denom = c.total_recipients.max(1) as f64;
    ((c.read_by.len() as f64 / denom) * 100.0).round() as u32
}

/// Aggregate reach: total read events over total addressed recipients
/// across all circulars, as a rounded percent. 0 when nobody is addressed.
pub fn reach(circulars: &[Circular]) -> u32 {
    let recipients: u64 = circulars.iter().map(|c| c.total_recipients as u64).sum();
    if recipients == 0 {
        return 0;
    }
    let readers: u64 = circulars.iter().map(|c| c.read_by.len() as u64).sum();
    ((readers as f64 / recipients as f64) * 100.0).round() as u32
}

/// Mean per-circular read rate as a rounded percent.
pub fn avg_read_rate(circulars: &[Circular]) -> u32 {
    if circulars.is_empty() {
        return 0;
    }
    let sum: f64 = circulars
        .iter()
        .map(|c| c.read_by.len() as f64 / c.total_recipients.max(1) as f64)
        .sum();
    (sum / circulars.len() as f64 * 100.0).round() as u32
}

/// Case-insensitive substring match over title or content.
pub fn matches_search(c: &Circular, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    c.title.to_lowercase().contains(&term) || c.content.to_lowercase().contains(&term)
}

/// Department facet: `None` means "all", otherwise exact match.
pub fn matches_department(c: &Circular, filter: Option<&str>) -> bool {
    filter.map_or(true, |d| c.department == d)
}

/// Priority facet: `None` means "all", otherwise exact match.
pub fn matches_priority(c: &Circular, filter: Option<Priority>) -> bool {
    filter.map_or(true, |p| c.priority == p)
}

/// Filter state driving the dashboard and archive views.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub search: String,
    pub department: Option<String>,
    pub priority: Option<Priority>,
}

impl ViewFilter {
    fn matches(&self, c: &Circular) -> bool {
        matches_search(c, &self.search)
            && matches_department(c, self.department.as_deref())
            && matches_priority(c, self.priority)
    }
}

/// Dashboard view: circulars matching the search term and facets,
/// preserving the fetched order.
pub fn filter<'a>(circulars: &'a [Circular], f: &ViewFilter) -> Vec<&'a Circular> {
    circulars.iter().filter(|c| f.matches(c)).collect()
}

/// Archive view: matching circulars that are read locally or were
/// published more than seven days before `now`.
pub fn archive<'a>(
    circulars: &'a [Circular],
    f: &ViewFilter,
    read_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> Vec<&'a Circular> {
    let cutoff = now - Duration::days(7);
    circulars
        .iter()
        .filter(|c| (read_ids.contains(&c.id) || c.published_at < cutoff) && f.matches(c))
        .collect()
}

/// Circular counts per department, ordered by department name.
pub fn department_counts(circulars: &[Circular]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for c in circulars {
        *counts.entry(c.department.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(dept, n)| (dept.to_string(), n))
        .collect()
}

/// Circular counts per priority, in fixed enum order.
pub fn priority_counts(circulars: &[Circular]) -> Vec<(Priority, usize)> {
    [
        Priority::Urgent,
        Priority::Informational,
        Priority::ActionRequired,
    ]
    .into_iter()
    .map(|p| (p, circulars.iter().filter(|c| c.priority == p).count()))
    .collect()
}
