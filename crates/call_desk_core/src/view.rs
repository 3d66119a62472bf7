//! crates/call_desk_core/src/view.rs
//!
//! In-memory view state for the dashboard screens: call filtering and
//! pagination, and the per-category task board.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Call, CallOutcome, CallStatus, Task, TaskCategory, TaskFilter};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Filters and pagination window for the call history table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallQuery {
    pub status: Option<CallStatus>,
    pub outcome: Option<CallOutcome>,
    pub agent_id: Option<String>,
    /// Case-insensitive search over call id, phone number and summary.
    pub q: Option<String>,
    /// Inclusive lower bound on the UTC creation date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the UTC creation date.
    pub to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl CallQuery {
    pub fn matches(&self, call: &Call) -> bool {
        if let Some(status) = self.status {
            if call.status != status {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if call.outcome != Some(outcome) {
                return false;
            }
        }
        if let Some(agent_id) = self.agent_id.as_deref().filter(|a| !a.is_empty()) {
            if call.agent_id.as_deref() != Some(agent_id) {
                return false;
            }
        }
        let day = call.created_at.date_naive();
        if self.from.is_some_and(|from| day < from) || self.to.is_some_and(|to| day > to) {
            return false;
        }
        match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    Some(call.id.as_str()),
                    call.phone_number.as_deref(),
                    call.summary.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// The 1-based page number, never below 1.
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// One window of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Applies the query's filters to `calls`, sorts newest first and cuts out the requested page.
pub fn query_calls(calls: &[Call], query: &CallQuery) -> Page<Call> {
    let mut matching: Vec<&Call> = calls.iter().filter(|c| query.matches(c)).collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let per_page = query.per_page();
    let page = query.page();
    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect();

    Page {
        items,
        total,
        page,
        per_page,
        total_pages: total.div_ceil(per_page),
    }
}

/// Tasks split into the two category columns shown side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskBoard {
    pub mc2: Vec<Task>,
    pub telvia: Vec<Task>,
}

impl TaskBoard {
    /// Completed tasks are ordered by completion time, pending ones by creation time, newest first.
    pub fn build(tasks: &[Task], filter: TaskFilter) -> Self {
        let mut selected: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
        selected.sort_by(|a, b| {
            let key_a = a.completed_at.unwrap_or(a.created_at);
            let key_b = b.completed_at.unwrap_or(b.created_at);
            key_b.cmp(&key_a)
        });

        let mut board = TaskBoard::default();
        for task in selected {
            match task.category {
                TaskCategory::Mc2 => board.mc2.push(task.clone()),
                TaskCategory::Telvia => board.telvia.push(task.clone()),
            }
        }
        board
    }
}
