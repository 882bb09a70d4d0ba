//! Engine configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::types::{CommissionType, Paise};

/// Longest batch window accepted, one day
pub const MAX_BATCH_WINDOW_SECS: u64 = 86_400;

/// Settlement queue tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Pending rows for one merchant that make a group eligible immediately
    pub batch_size: usize,
    /// Age of the oldest pending row that makes a group eligible
    pub batch_window_secs: u64,
    /// Interval between polling cycles
    pub poll_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_window_secs: 300,
            poll_interval_secs: 120,
        }
    }
}

impl QueueConfig {
    /// Batch window, capped at [`MAX_BATCH_WINDOW_SECS`]
    pub fn batch_window(&self) -> chrono::Duration {
        let secs = self.batch_window_secs.min(MAX_BATCH_WINDOW_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }

    /// Poll interval, at least one second
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Commission applied when a merchant has no usable configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultCommission {
    pub value: BigDecimal,
    pub commission_type: CommissionType,
    pub gst_percentage: BigDecimal,
}

impl Default for DefaultCommission {
    fn default() -> Self {
        Self {
            value: BigDecimal::from(2),
            commission_type: CommissionType::Percentage,
            gst_percentage: BigDecimal::from(18),
        }
    }
}

/// Reconciliation job limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Oldest cycle date a job accepts, in days before today
    pub max_lookback_days: i64,
    /// Log lines kept per job
    pub job_log_capacity: usize,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            max_lookback_days: 90,
            job_log_capacity: 500,
        }
    }
}

/// Settlement engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub queue: QueueConfig,
    /// Net amounts at or above this need manual approval (₹1,00,000)
    pub approval_threshold_paise: Paise,
    /// Net amounts at or above this go over RTGS (₹2,00,000)
    pub rtgs_threshold_paise: Paise,
    pub default_commission: DefaultCommission,
    pub recon: ReconConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            approval_threshold_paise: 10_000_000,
            rtgs_threshold_paise: 20_000_000,
            default_commission: DefaultCommission::default(),
            recon: ReconConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from `SETTLEMENT_*` environment variables, falling back
    /// to defaults for anything unset, unparsable or out of range
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let percentage = |v: &BigDecimal| *v >= BigDecimal::from(0) && *v <= BigDecimal::from(100);
        Self {
            queue: QueueConfig {
                batch_size: env_where("SETTLEMENT_BATCH_SIZE", defaults.queue.batch_size, |v| *v > 0),
                batch_window_secs: env_where(
                    "SETTLEMENT_BATCH_WINDOW_SECS",
                    defaults.queue.batch_window_secs,
                    |v| *v <= MAX_BATCH_WINDOW_SECS,
                ),
                poll_interval_secs: env_where(
                    "SETTLEMENT_POLL_INTERVAL_SECS",
                    defaults.queue.poll_interval_secs,
                    |v| *v > 0,
                ),
            },
            approval_threshold_paise: env_where(
                "SETTLEMENT_APPROVAL_THRESHOLD_PAISE",
                defaults.approval_threshold_paise,
                |v| *v > 0,
            ),
            rtgs_threshold_paise: env_where(
                "SETTLEMENT_RTGS_THRESHOLD_PAISE",
                defaults.rtgs_threshold_paise,
                |v| *v > 0,
            ),
            default_commission: DefaultCommission {
                value: env_where(
                    "SETTLEMENT_DEFAULT_COMMISSION",
                    defaults.default_commission.value,
                    percentage,
                ),
                commission_type: defaults.default_commission.commission_type,
                gst_percentage: env_where(
                    "SETTLEMENT_DEFAULT_GST",
                    defaults.default_commission.gst_percentage,
                    percentage,
                ),
            },
            recon: ReconConfig {
                max_lookback_days: env_where(
                    "SETTLEMENT_RECON_MAX_LOOKBACK_DAYS",
                    defaults.recon.max_lookback_days,
                    |v| (0..=3650).contains(v),
                ),
                job_log_capacity: env_where(
                    "SETTLEMENT_RECON_JOB_LOG_CAPACITY",
                    defaults.recon.job_log_capacity,
                    |v| *v > 0,
                ),
            },
        }
    }
}

/// Parse `key`, keeping `default` when it is unset, unparsable or fails `valid`
fn env_where<T, F>(key: &str, default: T, valid: F) -> T
where
    T: FromStr + std::fmt::Display,
    F: Fn(&T) -> bool,
{
    let Some(value) = std::env::var(key).ok().and_then(|s| s.parse::<T>().ok()) else {
        return default;
    };
    if valid(&value) {
        value
    } else {
        warn!(key, %value, default = %default, "Config value out of range, using default");
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.queue.batch_size, 100);
        assert_eq!(config.queue.batch_window(), chrono::Duration::minutes(5));
        assert_eq!(config.queue.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.approval_threshold_paise, 10_000_000);
        assert_eq!(config.rtgs_threshold_paise, 20_000_000);
        assert_eq!(config.default_commission.value, BigDecimal::from(2));
        assert_eq!(config.recon.max_lookback_days, 90);
    }

    #[test]
    fn test_env_falls_back_on_garbage() {
        std::env::set_var("SETTLEMENT_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_where("SETTLEMENT_TEST_GARBAGE", 42usize, |_| true), 42);
        std::env::set_var("SETTLEMENT_TEST_NUMBER", "7");
        assert_eq!(env_where("SETTLEMENT_TEST_NUMBER", 42usize, |_| true), 7);
    }

    #[test]
    fn test_env_where_rejects_out_of_range() {
        std::env::set_var("SETTLEMENT_TEST_ZERO", "0");
        assert_eq!(env_where("SETTLEMENT_TEST_ZERO", 120u64, |v| *v > 0), 120);
        std::env::set_var("SETTLEMENT_TEST_HUGE", u64::MAX.to_string());
        assert_eq!(
            env_where("SETTLEMENT_TEST_HUGE", 300u64, |v| *v <= MAX_BATCH_WINDOW_SECS),
            300
        );
        std::env::set_var("SETTLEMENT_TEST_OK", "60");
        assert_eq!(env_where("SETTLEMENT_TEST_OK", 120u64, |v| *v > 0), 60);
    }

    #[test]
    fn test_from_env_replaces_unusable_queue_values() {
        std::env::set_var("SETTLEMENT_POLL_INTERVAL_SECS", "0");
        std::env::set_var("SETTLEMENT_BATCH_WINDOW_SECS", u64::MAX.to_string());
        std::env::set_var("SETTLEMENT_BATCH_SIZE", "0");
        let config = EngineConfig::from_env();
        std::env::remove_var("SETTLEMENT_POLL_INTERVAL_SECS");
        std::env::remove_var("SETTLEMENT_BATCH_WINDOW_SECS");
        std::env::remove_var("SETTLEMENT_BATCH_SIZE");

        assert_eq!(config.queue, QueueConfig::default());
    }

    #[test]
    fn test_accessors_clamp_hand_built_values() {
        let config = QueueConfig {
            batch_size: 1,
            batch_window_secs: u64::MAX,
            poll_interval_secs: 0,
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(
            config.batch_window(),
            chrono::Duration::seconds(MAX_BATCH_WINDOW_SECS as i64)
        );
        assert!(config.batch_window() > chrono::Duration::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_still_ticks() {
        let config = QueueConfig {
            poll_interval_secs: 0,
            ..QueueConfig::default()
        };
        let mut ticker = tokio::time::interval(config.poll_interval());
        ticker.tick().await;
        ticker.tick().await;
    }
}
