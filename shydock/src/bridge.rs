use std::time::Duration;

use thiserror::Error;

use crate::platform::DockAutomation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The automation target has not finished starting. Retryable.
    #[error("automation service is not running")]
    Unavailable,
    #[error("automation command failed: {message}")]
    Rejected { message: String },
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },
    #[error("automation command timed out")]
    TimedOut,
}

impl BridgeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Result of one bridge invocation, retries included.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationOutcome {
    pub success: bool,
    /// Auto-hide value read back by a query
    pub value: Option<bool>,
    pub error: Option<BridgeError>,
    pub attempts: u32,
}

impl AutomationOutcome {
    fn from_result(result: Result<Option<bool>, BridgeError>, attempts: u32) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                value,
                error: None,
                attempts,
            },
            Err(error) => Self {
                success: false,
                value: None,
                error: Some(error),
                attempts,
            },
        }
    }

    pub fn failed(error: BridgeError) -> Self {
        Self::from_result(Err(error), 0)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Blocking front for a [`DockAutomation`] that absorbs "not running" errors.
/// Call it from a worker thread; a single call may sleep for several retry delays.
pub struct AutomationBridge<A> {
    automation: A,
    policy: RetryPolicy,
}

impl<A: DockAutomation> AutomationBridge<A> {
    pub fn new(automation: A, policy: RetryPolicy) -> Self {
        Self { automation, policy }
    }

    pub fn apply(&self, hide: bool) -> AutomationOutcome {
        let (result, attempts) =
            self.with_retry(|| self.automation.set_autohide(hide).map(|_| None));
        match &result {
            Ok(_) => tracing::info!("Set dock autohide={} (attempts={})", hide, attempts),
            Err(e) => tracing::warn!(
                "Failed to set dock autohide={} after {} attempts: {}",
                hide,
                attempts,
                e
            ),
        }
        AutomationOutcome::from_result(result, attempts)
    }

    pub fn query(&self) -> AutomationOutcome {
        let (result, attempts) = self.with_retry(|| self.automation.autohide().map(Some));
        if let Err(e) = &result {
            tracing::warn!("Failed to read dock autohide after {} attempts: {}", attempts, e);
        }
        AutomationOutcome::from_result(result, attempts)
    }

    fn with_retry<T>(
        &self,
        mut op: impl FnMut() -> Result<T, BridgeError>,
    ) -> (Result<T, BridgeError>, u32) {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::debug!(
                        "Automation target not ready (attempt {}/{}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        self.policy.retry_delay
                    );
                    std::thread::sleep(self.policy.retry_delay);
                    attempt += 1;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockDockAutomation;
    use std::time::Instant;

    fn policy(delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(delay_ms),
        }
    }

    #[test]
    fn test_apply_success_first_attempt() {
        let automation = MockDockAutomation::new(false);
        let bridge = AutomationBridge::new(automation.clone(), policy(1));

        let outcome = bridge.apply(true);
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.value, None);
        assert!(automation.autohide_value());
    }

    #[test]
    fn test_unavailable_twice_then_success() {
        let automation = MockDockAutomation::new(false);
        automation.push_errors(vec![BridgeError::Unavailable, BridgeError::Unavailable]);
        let bridge = AutomationBridge::new(automation.clone(), policy(20));

        let start = Instant::now();
        let outcome = bridge.apply(true);
        let elapsed = start.elapsed();

        assert!(outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(automation.calls(), 3);
        assert!(elapsed >= Duration::from_millis(40));
        assert!(automation.autohide_value());
    }

    #[test]
    fn test_never_more_than_three_attempts() {
        let automation = MockDockAutomation::new(false);
        automation.push_errors(vec![BridgeError::Unavailable; 5]);
        let bridge = AutomationBridge::new(automation.clone(), policy(10));

        let outcome = bridge.query();

        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(BridgeError::Unavailable));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(automation.calls(), 3);
        assert_eq!(automation.pending_errors(), 2);
    }

    #[test]
    fn test_rejected_is_not_retried() {
        let automation = MockDockAutomation::new(true);
        automation.push_errors(vec![BridgeError::Rejected {
            message: "syntax error".to_string(),
        }]);
        let bridge = AutomationBridge::new(automation.clone(), policy(10));

        let outcome = bridge.query();
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(automation.calls(), 1);
        assert!(matches!(outcome.error, Some(BridgeError::Rejected { .. })));
    }

    #[test]
    fn test_permission_denied_is_not_retried() {
        let automation = MockDockAutomation::new(true);
        automation.push_errors(vec![BridgeError::PermissionDenied {
            message: "not authorized".to_string(),
        }]);
        let bridge = AutomationBridge::new(automation.clone(), policy(10));

        let outcome = bridge.apply(false);
        assert!(!outcome.success);
        assert_eq!(automation.calls(), 1);
        // Failed apply leaves system state untouched
        assert!(automation.autohide_value());
    }

    #[test]
    fn test_query_returns_value() {
        let automation = MockDockAutomation::new(true);
        let bridge = AutomationBridge::new(automation, policy(1));

        let outcome = bridge.query();
        assert!(outcome.success);
        assert_eq!(outcome.value, Some(true));
    }
}
