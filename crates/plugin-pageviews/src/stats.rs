//! Counters shared by the tracker's hooks and its stats route.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

/// Prefix of JSON API routes.
pub const API_PREFIX: &str = "/@/";

thread_local! {
    /// Start of the dispatch running on this thread.
    static STARTED: Cell<Option<Instant>> = const { Cell::new(None) };
}

/// Starts the dispatch timer for this thread.
pub fn start_timer() {
    STARTED.with(|started| started.set(Some(Instant::now())));
}

/// Stops the dispatch timer, returning the elapsed time if it was running.
pub fn stop_timer() -> Option<Duration> {
    STARTED.with(|started| started.take()).map(|at| at.elapsed())
}

/// Counters for one route pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternStats {
    /// Matched requests.
    pub views: u64,
    /// Completed requests with a timing.
    pub timed: u64,
    /// Sum of dispatch times in microseconds.
    pub total_us: u64,
    /// Slowest dispatch in microseconds.
    pub max_us: u64,
}

impl PatternStats {
    /// Mean dispatch time in microseconds.
    pub fn avg_us(&self) -> u64 {
        self.total_us.checked_div(self.timed).unwrap_or(0)
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Page views per pattern, sorted.
    pub pages: BTreeMap<String, PatternStats>,
    /// API calls per pattern, sorted.
    pub api: BTreeMap<String, PatternStats>,
    /// Total page views.
    pub page_views: u64,
    /// Total API calls.
    pub api_calls: u64,
    /// Unmatched requests.
    pub not_found: u64,
}

/// Live counters.
#[derive(Debug, Default)]
pub struct PageViewStats {
    /// Pattern → counters.
    patterns: DashMap<String, PatternStats>,
    page_views: AtomicU64,
    api_calls: AtomicU64,
    not_found: AtomicU64,
}

/// Whether a pattern belongs to the JSON API.
pub fn is_api(pattern: &str) -> bool {
    pattern.starts_with(API_PREFIX)
}

impl PageViewStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a matched request.
    pub fn record_match(&self, pattern: &str) {
        if is_api(pattern) {
            self.api_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.page_views.fetch_add(1, Ordering::Relaxed);
        }
        self.patterns.entry(pattern.to_string()).or_default().views += 1;
    }

    /// Records the dispatch time of a completed request.
    pub fn record_timing(&self, pattern: &str, elapsed: Duration) {
        let micros = elapsed.as_micros() as u64;
        let mut entry = self.patterns.entry(pattern.to_string()).or_default();
        entry.timed += 1;
        entry.total_us += micros;
        entry.max_us = entry.max_us.max(micros);
    }

    /// Counts an unmatched request.
    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Counters for one pattern.
    pub fn pattern(&self, pattern: &str) -> Option<PatternStats> {
        self.patterns.get(pattern).map(|s| s.value().clone())
    }

    /// Copies every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut pages = BTreeMap::new();
        let mut api = BTreeMap::new();
        for entry in self.patterns.iter() {
            let target = if is_api(entry.key()) { &mut api } else { &mut pages };
            target.insert(entry.key().clone(), entry.value().clone());
        }
        StatsSnapshot {
            pages,
            api,
            page_views: self.page_views.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }
}
