//! Time bounds for recognition runs.
//!
//! View type probes and constructors are plugin code and may be slow on
//! pathological inputs. These helpers run recognition on the blocking pool
//! and give up waiting once the configured duration elapses. The abandoned
//! work is not cancelled; its result is discarded.

use crate::config::TimeoutOptions;
use crate::core::view::BinaryView;
use crate::error::{BinviewError, Result};
use crate::recognition::{Recognition, RecognitionEngine};
use crate::viewtype::ConstructionMode;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

/// Default timeout duration in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Fast operation timeout in seconds (for probing a single buffer)
pub const FAST_TIMEOUT_SECONDS: u64 = 10;

/// Timeout configuration for an operation
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum duration for the operation
    pub duration: Duration,
    /// Whether to log timeout errors
    pub log_warnings: bool,
    /// Operation name for logging
    pub operation_name: String,
}

impl TimeoutConfig {
    pub fn new(seconds: u64, operation: impl Into<String>) -> Self {
        Self {
            duration: Duration::from_secs(seconds),
            log_warnings: true,
            operation_name: operation.into(),
        }
    }

    pub fn from_millis(millis: u64, operation: impl Into<String>) -> Self {
        Self {
            duration: Duration::from_millis(millis),
            log_warnings: true,
            operation_name: operation.into(),
        }
    }

    /// 10 second bound.
    pub fn fast(operation: impl Into<String>) -> Self {
        Self::new(FAST_TIMEOUT_SECONDS, operation)
    }

    /// 60 second bound.
    pub fn default_timeout(operation: impl Into<String>) -> Self {
        Self::new(DEFAULT_TIMEOUT_SECONDS, operation)
    }

    pub fn from_options(options: &TimeoutOptions, operation: impl Into<String>) -> Self {
        Self::new(options.recognition_seconds, operation)
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(config: TimeoutConfig, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(
        operation = %config.operation_name,
        timeout_ms = config.duration.as_millis() as u64,
        "Starting bounded operation"
    );

    match timeout(config.duration, future).await {
        Ok(result) => {
            debug!(operation = %config.operation_name, "Bounded operation completed");
            result
        }
        Err(_) => {
            if config.log_warnings {
                error!(
                    operation = %config.operation_name,
                    timeout_ms = config.duration.as_millis() as u64,
                    "Operation timed out"
                );
            }
            Err(BinviewError::Timeout {
                millis: config.duration.as_millis() as u64,
            })
        }
    }
}

/// Run `engine.recognize` on the blocking pool, bounded by `config`.
pub async fn recognize_with_timeout(
    engine: Arc<RecognitionEngine>,
    data: Arc<BinaryView>,
    mode: ConstructionMode,
    config: TimeoutConfig,
) -> Result<Recognition> {
    with_timeout(config, async move {
        let handle = tokio::task::spawn_blocking(move || engine.recognize(&data, mode));
        match handle.await {
            Ok(outcome) => Ok(outcome?),
            Err(join_error) => Err(crate::log_error!(BinviewError::Internal(format!(
                "recognition task failed: {}",
                join_error
            )))),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::io::ByteSource;
    use crate::recognition::RecognitionError;
    use crate::viewtype::{ViewTypePlugin, ViewTypeRegistry};

    struct Slow(Duration);
    impl ViewTypePlugin for Slow {
        fn is_valid_for_data(&self, _data: &BinaryView) -> bool {
            std::thread::sleep(self.0);
            true
        }
        fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
            Some(BinaryView::builder("Slow", data).build())
        }
    }

    fn engine(delay: Duration) -> Arc<RecognitionEngine> {
        let registry = Arc::new(ViewTypeRegistry::new());
        registry.register("Slow", "Slow", Slow(delay)).unwrap();
        Arc::new(RecognitionEngine::new(registry, Arc::new(EventBus::new())))
    }

    fn data() -> Arc<BinaryView> {
        BinaryView::raw(Arc::new(ByteSource::new(&b"data"[..])))
    }

    #[tokio::test]
    async fn test_async_timeout_success() {
        let config = TimeoutConfig::new(1, "test_operation");
        let result = with_timeout(config, async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_async_timeout_failure() {
        let config = TimeoutConfig::new(1, "test_operation");
        let result: Result<i32> = with_timeout(config, async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(42)
        })
        .await;
        assert!(matches!(result, Err(BinviewError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_recognize_within_bound() {
        let r = recognize_with_timeout(
            engine(Duration::from_millis(0)),
            data(),
            ConstructionMode::Create,
            TimeoutConfig::fast("recognize"),
        )
        .await
        .unwrap();
        assert_eq!(r.view_type.name(), "Slow");
    }

    #[tokio::test]
    async fn test_recognize_times_out() {
        let result = recognize_with_timeout(
            engine(Duration::from_millis(1500)),
            data(),
            ConstructionMode::Create,
            TimeoutConfig::from_millis(100, "recognize"),
        )
        .await;
        assert!(matches!(result, Err(BinviewError::Timeout { millis: 100 })));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Operation timeout after 100ms"
        );
    }

    #[tokio::test]
    async fn test_recognition_error_propagates() {
        let empty = Arc::new(RecognitionEngine::new(
            Arc::new(ViewTypeRegistry::new()),
            Arc::new(EventBus::new()),
        ));
        let result =
            recognize_with_timeout(empty, data(), ConstructionMode::Parse, TimeoutConfig::fast("r"))
                .await;
        assert!(matches!(
            result,
            Err(BinviewError::Recognition(RecognitionError::NoApplicableType))
        ));
    }

    #[test]
    fn test_config_from_options() {
        let config = TimeoutConfig::from_options(&TimeoutOptions::default(), "recognize");
        assert_eq!(config.duration, Duration::from_secs(60));
        assert_eq!(config.operation_name, "recognize");
    }
}
