//! Retry policy for calls to hosted models

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{EmbeddingProvider, Error, Result};

/// Randomized exponential backoff bounded by an attempt count
///
/// The wait before retry `n` (1-based) is drawn uniformly from
/// `[min_wait, clamp(multiplier * 2^(n-1), min_wait, max_wait)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub multiplier: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(20),
            multiplier: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without waiting
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
            multiplier: Duration::ZERO,
        }
    }

    /// Upper bound of the wait after the given failed attempt
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt.saturating_sub(1).min(62) as i32);
        let raw = self.multiplier.as_secs_f64() * exp;
        let clamped = raw
            .max(self.min_wait.as_secs_f64())
            .min(self.max_wait.as_secs_f64().max(self.min_wait.as_secs_f64()));
        Duration::from_secs_f64(clamped)
    }

    /// Draw the wait after the given failed attempt
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let low = self.min_wait.as_secs_f64();
        let high = self.ceiling(attempt).as_secs_f64();
        if high <= low {
            return self.min_wait;
        }
        Duration::from_secs_f64(rng.gen_range(low..=high))
    }

    /// Run `op` until it succeeds or `max_attempts` calls have failed.
    /// Every error is retried; the last one is returned inside
    /// `Error::RetriesExhausted`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    warn!(attempt, error = %e, "giving up");
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt, &mut rand::thread_rng());
                    warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Embedding provider wrapper adding retry and a rest period after each
/// successful call to stay under provider rate limits
pub struct RetryingEmbedder<E> {
    inner: E,
    policy: RetryPolicy,
    courtesy_delay: Duration,
}

impl<E: EmbeddingProvider> RetryingEmbedder<E> {
    pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_millis(500);

    pub fn new(inner: E) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
            courtesy_delay: Self::DEFAULT_COURTESY_DELAY,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.inner.embed(text).await?;
        let expected = self.inner.dimensions();
        if vector.len() != expected {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, got {}",
                expected,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl<E: EmbeddingProvider> EmbeddingProvider for RetryingEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.policy.run(|| self.embed_once(text)).await?;
        debug!(chars = text.len(), "embedded text");
        tokio::time::sleep(self.courtesy_delay).await;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    /// Fails the first `failures` calls, then returns a vector of `len`
    struct FlakyEmbedder {
        failures: u32,
        len: usize,
        calls: AtomicU32,
    }

    impl FlakyEmbedder {
        fn new(failures: u32, len: usize) -> Self {
            Self {
                failures,
                len,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(Error::Network("429 Too Many Requests".to_string()));
            }
            Ok(vec![0.25; self.len])
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_ceiling_grows_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.ceiling(1), Duration::from_secs(1));
        assert_eq!(policy.ceiling(2), Duration::from_secs(2));
        assert_eq!(policy.ceiling(4), Duration::from_secs(8));
        assert_eq!(policy.ceiling(5), Duration::from_secs(16));
        assert_eq!(policy.ceiling(6), Duration::from_secs(20));
        assert_eq!(policy.ceiling(60), Duration::from_secs(20));
    }

    #[test]
    fn test_delay_stays_within_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=10 {
            for _ in 0..50 {
                let delay = policy.delay_for(attempt, &mut rng);
                assert!(delay >= policy.min_wait);
                assert!(delay <= policy.ceiling(attempt));
            }
        }
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(3);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.delay_for(2, &mut rng), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let embedder = RetryingEmbedder::new(FlakyEmbedder::new(2, 3))
            .with_policy(RetryPolicy::immediate(5))
            .with_courtesy_delay(Duration::ZERO);

        let vector = embedder.embed("Azure Functions").await.unwrap();
        assert_eq!(vector, vec![0.25, 0.25, 0.25]);
        assert_eq!(embedder.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let embedder = RetryingEmbedder::new(FlakyEmbedder::new(u32::MAX, 3))
            .with_policy(RetryPolicy::immediate(4))
            .with_courtesy_delay(Duration::ZERO);

        let err = embedder.embed("Azure Functions").await.unwrap_err();
        match err {
            Error::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, Error::Network(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(embedder.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_wrong_length_counts_as_failure() {
        let embedder = RetryingEmbedder::new(FlakyEmbedder::new(0, 2))
            .with_policy(RetryPolicy::immediate(2))
            .with_courtesy_delay(Duration::ZERO);

        let err = embedder.embed("x").await.unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backs_off_between_failed_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let started = tokio::time::Instant::now();
        let value = policy
            .run(move || async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call <= 2 {
                    Err(Error::Network("503 Service Unavailable".to_string()))
                } else {
                    Ok(call)
                }
            })
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(value, 3);
        assert!(elapsed >= policy.min_wait * 2);
        assert!(elapsed <= policy.ceiling(1) + policy.ceiling(2));
    }

    #[tokio::test]
    async fn test_rests_after_success() {
        let embedder = RetryingEmbedder::new(FlakyEmbedder::new(0, 3))
            .with_policy(RetryPolicy::immediate(1))
            .with_courtesy_delay(Duration::from_millis(30));

        let started = Instant::now();
        embedder.embed("x").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
