//! Sequential, human-readable booking codes such as `Funny-1046`.
//!
//! Allocation reads the highest stored suffix, proposes the next one and lets
//! the unique constraint on insert arbitrate between concurrent writers. A
//! losing writer retries with a fresh read, a bounded number of times.

use service_core::error::AppError;
use service_core::retry::{retry_with_backoff, RetryConfig};
use std::future::Future;
use thiserror::Error;
use tracing::warn;

use crate::config::BookingCodeConfig;
use crate::services::metrics::CODE_ALLOCATION_RETRIES_TOTAL;

/// A proposed code and its numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCode {
    pub code: String,
    pub number: i64,
}

/// Outcome of one allocation attempt that did not succeed.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Another writer stored this code first; worth another attempt.
    #[error("booking code {0} is already taken")]
    CodeTaken(String),
    #[error(transparent)]
    Fatal(#[from] AppError),
}

#[derive(Debug, Clone)]
pub struct BookingCodeGenerator {
    prefix: String,
    floor: i64,
    retry: RetryConfig,
}

impl BookingCodeGenerator {
    pub fn new(prefix: impl Into<String>, floor: i64, max_attempts: u32) -> Self {
        Self {
            prefix: prefix.into(),
            floor,
            retry: RetryConfig::contention(max_attempts.saturating_sub(1)),
        }
    }

    pub fn from_config(config: &BookingCodeConfig) -> Self {
        Self::new(config.prefix.clone(), config.floor, config.max_attempts)
    }

    /// Replace the backoff schedule and attempt budget.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry.max_retries + 1
    }

    pub fn format(&self, number: i64) -> String {
        format!("{}-{}", self.prefix, number)
    }

    /// The code following `current_max`, never at or below the floor.
    pub fn next_after(&self, current_max: Option<i64>) -> BookingCode {
        let number = current_max.unwrap_or(self.floor).max(self.floor) + 1;
        BookingCode {
            code: self.format(number),
            number,
        }
    }

    /// Run `attempt` until it stores a code. `attempt` receives the zero-based
    /// attempt number and must read the current maximum itself each time.
    pub async fn allocate<F, Fut, T>(&self, mut attempt: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AllocationError>>,
    {
        let result = retry_with_backoff(
            &self.retry,
            "allocate_booking_code",
            |e: &AllocationError| matches!(e, AllocationError::CodeTaken(_)),
            |n| {
                if n > 0 {
                    CODE_ALLOCATION_RETRIES_TOTAL.inc();
                }
                attempt(n)
            },
        )
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(AllocationError::CodeTaken(code)) => {
                warn!(
                    last_code = %code,
                    attempts = self.max_attempts(),
                    "Booking code allocation exhausted"
                );
                Err(AppError::CodeAllocationFailed(format!(
                    "Could not allocate a unique booking code after {} attempts",
                    self.max_attempts()
                )))
            }
            Err(AllocationError::Fatal(e)) => Err(e),
        }
    }
}
