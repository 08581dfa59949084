use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronStatus {
    Started,
    Completed,
    Failed,
}

impl CronStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CronStatus::Started => "started",
            CronStatus::Completed => "completed",
            CronStatus::Failed => "failed",
        }
    }
}

/// What started a balance refresh; recorded in the run log details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTrigger {
    Manual,
    Cron,
    Scheduler,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Manual => "manual",
            RefreshTrigger::Cron => "cron",
            RefreshTrigger::Scheduler => "scheduler",
        }
    }
}

/// Result of one refresh run, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub success: bool,
    pub updated: usize,
    pub failed: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub account_id: i32,
    pub account_name: Option<String>,
    pub starting_balance: f64,
    pub current_balance: f64,
    pub profit: f64,
    pub percentage_change: f64,
    pub is_active: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Percentage gain from `starting` to `current`; 0 when there is no positive baseline.
pub fn percentage_change(starting: f64, current: f64) -> f64 {
    if starting > 0.0 {
        (current - starting) / starting * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(1000.0, 1100.0), 10.0);
        assert_eq!(percentage_change(1000.0, 900.0), -10.0);
        assert_eq!(percentage_change(0.0, 500.0), 0.0);
        assert_eq!(percentage_change(-5.0, 500.0), 0.0);
    }

    #[test]
    fn test_summary_omits_empty_errors() {
        let summary = RefreshSummary {
            success: true,
            updated: 0,
            failed: 0,
            total: 0,
            errors: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["success"], true);
    }
}
