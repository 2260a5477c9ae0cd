//! Process-wide registry of every active wrapper's stats recorder.
//!
//! Wrapper constructors register their recorder here (unless `disabled`);
//! there is no removal API, so a recorder stays visible until process
//! teardown. Reports are pure read-side views computed from the live
//! counters at call time.

use std::fmt::Write as _;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::MemoStats;

static REGISTRY: Lazy<DashMap<String, Arc<MemoStats>>> = Lazy::new(DashMap::new);

/// Registers a wrapper's stats recorder under `name`.
///
/// Called by the wrapper constructors. Re-registering a name replaces the
/// previous recorder, so the report always reflects the newest wrapper with
/// that name.
pub fn register(name: &str, stats: Arc<MemoStats>) {
    REGISTRY.insert(name.to_string(), stats);
}

/// The recorder registered under `name`, if any.
pub fn get(name: &str) -> Option<Arc<MemoStats>> {
    REGISTRY.get(name).map(|entry| Arc::clone(entry.value()))
}

/// All registered wrapper names, sorted.
pub fn list() -> Vec<String> {
    let mut names: Vec<String> = REGISTRY.iter().map(|entry| entry.key().clone()).collect();
    names.sort();
    names
}

/// Empties the registry. Test support; recorders held by live wrappers keep
/// counting.
pub fn clear() {
    REGISTRY.clear();
}

/// Live counter snapshot of every registered wrapper, sorted by name.
fn snapshot() -> Vec<(String, u64, u64, u64, f64)> {
    let mut rows: Vec<_> = REGISTRY
        .iter()
        .map(|entry| {
            let stats = entry.value();
            (
                entry.key().clone(),
                stats.calls(),
                stats.misses(),
                stats.hits(),
                stats.hit_rate(),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Formats a tabular report: one aligned row per registered wrapper.
///
/// ```text
/// name        calls  misses    hits  hit_rate
/// fetch_user     10       3       7     70.00%
/// ```
pub fn format_table() -> String {
    let rows = snapshot();
    let name_width = rows
        .iter()
        .map(|row| row.0.len())
        .chain(std::iter::once("name".len()))
        .max()
        .unwrap_or(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>10}  {:>10}  {:>10}  {:>9}",
        "name",
        "calls",
        "misses",
        "hits",
        "hit_rate",
        width = name_width
    );
    for (name, calls, misses, hits, hit_rate) in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:>10}  {:>10}  {:>10}  {:>8.2}%",
            name,
            calls,
            misses,
            hits,
            hit_rate * 100.0,
            width = name_width
        );
    }
    out
}

/// Formats a comma-separated report with a header row, suitable for
/// external ingestion.
pub fn format_csv() -> String {
    let mut out = String::from("name,calls,misses,hits,hit_rate\n");
    for (name, calls, misses, hits, hit_rate) in snapshot() {
        let _ = writeln!(
            out,
            "{},{},{},{},{:.4}",
            name, calls, misses, hits, hit_rate
        );
    }
    out
}
