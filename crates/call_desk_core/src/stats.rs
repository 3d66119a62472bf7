//! crates/call_desk_core/src/stats.rs
//!
//! KPI and chart aggregates for the dashboard header.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::domain::{Call, CallOutcome, CallStatus};

const WEEKDAY_LABELS: [&str; 7] = ["Lun", "Mar", "Mie", "Jue", "Vie", "Sab", "Dom"];

/// Calls placed on one weekday of the trailing week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    pub name: &'static str,
    pub calls: usize,
    pub answered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCount {
    pub outcome: CallOutcome,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_calls: usize,
    /// Calls whose status is `completed`.
    pub answered_calls: usize,
    /// Sum of call costs in euros, rounded to cents.
    pub total_cost: f64,
    /// Monday-first buckets for the seven calendar days ending with the reference day.
    pub weekly: Vec<WeekdayBucket>,
    /// Only outcomes that occur at least once, in declaration order.
    pub outcomes: Vec<OutcomeCount>,
}

impl DashboardStats {
    pub fn compute(calls: &[Call], now: DateTime<Utc>) -> Self {
        let answered_calls = calls
            .iter()
            .filter(|c| c.status == CallStatus::Completed)
            .count();
        let total_cost = (calls.iter().map(|c| c.cost).sum::<f64>() * 100.0).round() / 100.0;

        let mut weekly: Vec<WeekdayBucket> = WEEKDAY_LABELS
            .iter()
            .map(|&name| WeekdayBucket {
                name,
                calls: 0,
                answered: 0,
            })
            .collect();
        // Seven whole calendar days, today included, so no weekday is counted twice.
        let window_start = (now.date_naive() - Duration::days(6))
            .and_time(NaiveTime::MIN)
            .and_utc();
        for call in calls
            .iter()
            .filter(|c| c.created_at >= window_start && c.created_at <= now)
        {
            let bucket = &mut weekly[call.created_at.weekday().num_days_from_monday() as usize];
            bucket.calls += 1;
            if call.status == CallStatus::Completed {
                bucket.answered += 1;
            }
        }

        let outcomes = CallOutcome::ALL
            .into_iter()
            .map(|outcome| OutcomeCount {
                outcome,
                count: calls.iter().filter(|c| c.outcome == Some(outcome)).count(),
            })
            .filter(|oc| oc.count > 0)
            .collect();

        Self {
            total_calls: calls.len(),
            answered_calls,
            total_cost,
            weekly,
            outcomes,
        }
    }
}
