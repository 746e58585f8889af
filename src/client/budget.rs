//! Process-wide request budget
//!
//! Every remote call is charged against a single [`RequestBudget`] before it
//! is transmitted, so failed and retried sends count too. Phases consult
//! [`RequestBudget::is_exhausted`] before issuing their next request and end
//! gracefully once the safety margin is crossed.

use crate::config::BudgetConfig;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared ceiling on remote calls for one run
#[derive(Debug)]
pub struct RequestBudget {
    /// Requests charged so far; never decreases and never exceeds `ceiling`
    issued: AtomicU64,

    /// Hard ceiling on requests for the run
    ceiling: u64,

    /// Headroom kept below the ceiling when deciding to stop a phase
    safety_margin: u64,
}

impl RequestBudget {
    /// Creates a budget with nothing issued yet
    pub fn new(ceiling: u64, safety_margin: u64) -> Self {
        Self {
            issued: AtomicU64::new(0),
            ceiling,
            safety_margin,
        }
    }

    /// Creates a budget from the `[budget]` configuration section
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.ceiling, config.safety_margin)
    }

    /// Charges one request against the budget
    ///
    /// Returns `false` without charging if the hard ceiling has been reached.
    /// The compare-and-swap loop keeps `issued <= ceiling` even when several
    /// tasks charge concurrently.
    pub fn try_issue(&self) -> bool {
        self.issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |issued| {
                if issued < self.ceiling {
                    Some(issued + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Returns the number of requests charged so far
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    /// Returns the hard ceiling
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Returns the number of requests left before the hard ceiling
    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.issued())
    }

    /// Returns true once phases should stop issuing requests
    pub fn is_exhausted(&self) -> bool {
        self.issued() >= self.ceiling.saturating_sub(self.safety_margin)
    }
}
