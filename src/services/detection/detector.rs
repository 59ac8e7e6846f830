// Dedicated Detector
// Optional detection service whose average probability is averaged 1:1 with the blended score

use crate::models::DetectorResult;
use crate::services::providers::{with_timeout, ProviderClient, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[async_trait]
pub trait DedicatedDetector: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, text: &str) -> Result<DetectorResult, ProviderError>;
}

pub struct GptZeroDetector {
    client: Arc<ProviderClient>,
    api_key: String,
    timeout: Duration,
}

impl GptZeroDetector {
    pub fn new(client: Arc<ProviderClient>, api_key: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl DedicatedDetector for GptZeroDetector {
    fn name(&self) -> &str {
        "gptzero"
    }

    async fn analyze(&self, text: &str) -> Result<DetectorResult, ProviderError> {
        self.client.call_gptzero(&self.api_key, text, self.timeout).await
    }
}

/// Run the detector once; any failure (or a timeout) means no result.
pub async fn run_detector(
    detector: Option<&dyn DedicatedDetector>,
    text: &str,
    timeout: Duration,
) -> Option<DetectorResult> {
    let detector = detector?;
    match with_timeout(timeout, detector.analyze(text)).await {
        Ok(result) => {
            info!(
                "[DETECTOR] {} average_generated_prob={:.2}",
                detector.name(),
                result.average_generated_prob
            );
            Some(result)
        }
        Err(e) => {
            warn!("[DETECTOR] {} error: {}", detector.name(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Option<DetectorResult>);

    #[async_trait]
    impl DedicatedDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn analyze(&self, _text: &str) -> Result<DetectorResult, ProviderError> {
            self.0.ok_or(ProviderError::MissingContent)
        }
    }

    #[tokio::test]
    async fn test_run_detector_success() {
        let expected = DetectorResult {
            completely_generated_prob: 10.0,
            average_generated_prob: 30.0,
        };
        let detector = FixedDetector(Some(expected));
        let result = run_detector(Some(&detector), "text", Duration::from_secs(1)).await;
        assert_eq!(result, Some(expected));
    }

    #[tokio::test]
    async fn test_run_detector_failure_and_absent() {
        let detector = FixedDetector(None);
        assert_eq!(run_detector(Some(&detector), "text", Duration::from_secs(1)).await, None);
        assert_eq!(run_detector(None, "text", Duration::from_secs(1)).await, None);
    }

    struct SlowDetector;

    #[async_trait]
    impl DedicatedDetector for SlowDetector {
        fn name(&self) -> &str {
            "slow"
        }

        async fn analyze(&self, _text: &str) -> Result<DetectorResult, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(DetectorResult {
                completely_generated_prob: 99.0,
                average_generated_prob: 99.0,
            })
        }
    }

    #[tokio::test]
    async fn test_run_detector_timeout_means_no_result() {
        let result = run_detector(Some(&SlowDetector), "text", Duration::from_millis(20)).await;
        assert_eq!(result, None);
    }
}
