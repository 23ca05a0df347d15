//! Whether a batch of filtered posts is worth texting subscribers about.

use serde::{Deserialize, Serialize};

/// Thresholds that gate a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Fewest valid posts a cycle needs before it can notify.
    #[serde(default = "default_minimum_tweets")]
    pub minimum_tweets: usize,

    /// Lowest delayed share, in whole percent, that triggers a notification.
    #[serde(default = "default_delay_percentage")]
    pub delay_percentage: u32,

    /// Name of the line as it appears in the message body.
    #[serde(default = "default_line_name")]
    pub line_name: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            minimum_tweets: default_minimum_tweets(),
            delay_percentage: default_delay_percentage(),
            line_name: default_line_name(),
        }
    }
}

fn default_minimum_tweets() -> usize {
    5
}
fn default_delay_percentage() -> u32 {
    40
}
fn default_line_name() -> String {
    "caltrain".into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No valid posts this cycle, so there is no percentage to compare.
    NoData,
    Quiet {
        valid: usize,
        delayed: usize,
        percentage: u32,
    },
    Notify {
        valid: usize,
        delayed: usize,
        percentage: u32,
        message: String,
    },
}

impl Decision {
    pub fn should_notify(&self) -> bool {
        matches!(self, Decision::Notify { .. })
    }
}

/// `floor(100 * delayed / valid)`, or `None` when there are no valid posts.
pub fn delayed_percentage(valid: usize, delayed: usize) -> Option<u32> {
    if valid == 0 {
        return None;
    }
    let pct = (delayed as u64 * 100) / valid as u64;
    Some(u32::try_from(pct).unwrap_or(u32::MAX))
}

pub fn notification_message(line_name: &str, valid: usize, percentage: u32) -> String {
    format!(
        "There have been {} {} tweets in the past half hour, and {}% are about delays.",
        valid, line_name, percentage
    )
}

pub fn decide(valid: usize, delayed: usize, policy: &AlertPolicy) -> Decision {
    let Some(percentage) = delayed_percentage(valid, delayed) else {
        return Decision::NoData;
    };

    if valid >= policy.minimum_tweets && percentage >= policy.delay_percentage {
        Decision::Notify {
            valid,
            delayed,
            percentage,
            message: notification_message(&policy.line_name, valid, percentage),
        }
    } else {
        Decision::Quiet {
            valid,
            delayed,
            percentage,
        }
    }
}
