use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    models::EnrichmentRecord,
    services::providers::{EnrichmentError, EnrichmentSource},
};

/// Result of one title's remote lookup
#[derive(Debug)]
pub enum EnrichmentOutcome {
    Found(EnrichmentRecord),
    /// The source answered but had no match
    Miss,
    TimedOut,
    Failed(EnrichmentError),
    /// The lookup task panicked or was cancelled before reporting
    Aborted,
}

impl EnrichmentOutcome {
    /// Every non-success outcome degrades to `None`
    pub fn into_record(self) -> Option<EnrichmentRecord> {
        match self {
            EnrichmentOutcome::Found(record) => Some(record),
            EnrichmentOutcome::Miss
            | EnrichmentOutcome::TimedOut
            | EnrichmentOutcome::Failed(_)
            | EnrichmentOutcome::Aborted => None,
        }
    }
}

/// Concurrent per-title lookups with independent failure
///
/// All titles are dispatched at once, with at most `max_in_flight` calls talking
/// to the source at any moment. Each call is bounded by `timeout`. There are no
/// retries. Dropping an in-progress `enrich` future aborts its outstanding calls.
#[derive(Clone)]
pub struct EnrichmentFanout {
    source: Arc<dyn EnrichmentSource>,
    timeout: Duration,
    max_in_flight: usize,
}

impl EnrichmentFanout {
    pub fn new(source: Arc<dyn EnrichmentSource>, timeout: Duration, max_in_flight: usize) -> Self {
        Self {
            source,
            timeout,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Index-aligned records for `titles`; failures become `None`
    pub async fn enrich(&self, titles: &[String]) -> Vec<Option<EnrichmentRecord>> {
        self.enrich_outcomes(titles)
            .await
            .into_iter()
            .map(EnrichmentOutcome::into_record)
            .collect()
    }

    /// Index-aligned outcomes for `titles`, resolved once every lookup has finished
    pub async fn enrich_outcomes(&self, titles: &[String]) -> Vec<EnrichmentOutcome> {
        if titles.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (slot, title) in titles.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&permits);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => lookup_with_timeout(source.as_ref(), &title, timeout).await,
                    Err(_) => EnrichmentOutcome::Aborted,
                };
                (slot, outcome)
            });
        }

        let mut outcomes: Vec<Option<EnrichmentOutcome>> =
            std::iter::repeat_with(|| None).take(titles.len()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "Enrichment task join error"),
            }
        }

        let outcomes: Vec<EnrichmentOutcome> = outcomes
            .into_iter()
            .enumerate()
            .map(|(slot, outcome)| {
                outcome.unwrap_or_else(|| {
                    tracing::warn!(slot, title = %titles[slot], "Enrichment lookup aborted");
                    EnrichmentOutcome::Aborted
                })
            })
            .collect();

        log_batch(self.source.name(), &outcomes);
        outcomes
    }
}

async fn lookup_with_timeout(
    source: &dyn EnrichmentSource,
    title: &str,
    timeout: Duration,
) -> EnrichmentOutcome {
    match tokio::time::timeout(timeout, source.lookup(title)).await {
        Ok(Ok(Some(record))) => EnrichmentOutcome::Found(record),
        Ok(Ok(None)) => EnrichmentOutcome::Miss,
        Ok(Err(e)) => {
            tracing::debug!(title = %title, error = %e, "Enrichment lookup failed");
            EnrichmentOutcome::Failed(e)
        }
        Err(_) => {
            tracing::debug!(title = %title, timeout_ms = timeout.as_millis() as u64, "Enrichment lookup timed out");
            EnrichmentOutcome::TimedOut
        }
    }
}

fn log_batch(provider: &str, outcomes: &[EnrichmentOutcome]) {
    let (mut found, mut missed, mut timed_out, mut failed, mut aborted) = (0, 0, 0, 0, 0);
    for outcome in outcomes {
        match outcome {
            EnrichmentOutcome::Found(_) => found += 1,
            EnrichmentOutcome::Miss => missed += 1,
            EnrichmentOutcome::TimedOut => timed_out += 1,
            EnrichmentOutcome::Failed(_) => failed += 1,
            EnrichmentOutcome::Aborted => aborted += 1,
        }
    }

    if timed_out + failed + aborted > 0 {
        tracing::warn!(
            provider,
            found,
            missed,
            timed_out,
            failed,
            aborted,
            "Partial enrichment failure"
        );
    } else {
        tracing::debug!(provider, found, missed, "Enrichment batch completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockEnrichmentSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn record(overview: &str) -> EnrichmentRecord {
        EnrichmentRecord {
            overview: Some(overview.to_string()),
            ..Default::default()
        }
    }

    fn fanout(source: impl EnrichmentSource + 'static) -> EnrichmentFanout {
        EnrichmentFanout::new(Arc::new(source), Duration::from_millis(200), 4)
    }

    /// Source that sleeps for some titles and tracks peak concurrency
    struct SlowSource {
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EnrichmentSource for SlowSource {
        async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if title.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(5)).await;
            } else {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(record(title)))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_empty_titles_make_no_calls() {
        let mut source = MockEnrichmentSource::new();
        source.expect_lookup().never();
        source.expect_name().return_const("mock");

        let result = fanout(source).enrich(&[]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_results_are_index_aligned() {
        let mut source = MockEnrichmentSource::new();
        source
            .expect_lookup()
            .times(3)
            .returning(|title| Ok(Some(record(title))));
        source.expect_name().return_const("mock");

        let result = fanout(source).enrich(&titles(&["Heat", "Ronin", "Alien"])).await;

        let overviews: Vec<Option<String>> = result
            .into_iter()
            .map(|r| r.and_then(|r| r.overview))
            .collect();
        assert_eq!(
            overviews,
            vec![
                Some("Heat".to_string()),
                Some("Ronin".to_string()),
                Some("Alien".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_all_failures_become_none() {
        let mut source = MockEnrichmentSource::new();
        source
            .expect_lookup()
            .returning(|_| Err(EnrichmentError::Status(503)));
        source.expect_name().return_const("mock");

        let result = fanout(source).enrich(&titles(&["A", "B", "C", "D"])).await;
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_others() {
        let mut source = MockEnrichmentSource::new();
        source.expect_lookup().returning(|title| match title {
            "broken" => Err(EnrichmentError::Malformed("bad json".to_string())),
            "unknown" => Ok(None),
            other => Ok(Some(record(other))),
        });
        source.expect_name().return_const("mock");

        let outcomes = fanout(source)
            .enrich_outcomes(&titles(&["Heat", "broken", "unknown"]))
            .await;

        assert!(matches!(outcomes[0], EnrichmentOutcome::Found(_)));
        assert!(matches!(outcomes[1], EnrichmentOutcome::Failed(_)));
        assert!(matches!(outcomes[2], EnrichmentOutcome::Miss));
    }

    #[tokio::test]
    async fn test_timeout_is_a_miss_not_an_error() {
        let source = SlowSource {
            delay: Duration::from_millis(1),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let outcomes = fanout(source)
            .enrich_outcomes(&titles(&["fast", "slow one", "also fast"]))
            .await;

        assert!(matches!(outcomes[0], EnrichmentOutcome::Found(_)));
        assert!(matches!(outcomes[1], EnrichmentOutcome::TimedOut));
        assert!(matches!(outcomes[2], EnrichmentOutcome::Found(_)));
    }

    #[tokio::test]
    async fn test_in_flight_is_bounded() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_millis(20),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let fanout = EnrichmentFanout::new(source.clone(), Duration::from_secs(2), 2);

        let names: Vec<String> = (0..8).map(|i| format!("movie {}", i)).collect();
        let result = fanout.enrich(&names).await;

        assert_eq!(result.len(), 8);
        assert!(result.iter().all(Option::is_some));
        assert!(source.peak.load(Ordering::SeqCst) <= 2);
    }

    /// Sleeps, then counts lookups that ran to completion
    struct CompletionCounter {
        delay: Duration,
        completed: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EnrichmentSource for CompletionCounter {
        async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(Some(record(title)))
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    fn counter(delay: Duration) -> Arc<CompletionCounter> {
        Arc::new(CompletionCounter {
            delay,
            completed: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_dropping_enrich_aborts_only_its_own_lookups() {
        let dropped_source = counter(Duration::from_millis(200));
        let kept_source = counter(Duration::from_millis(200));
        let dropped = EnrichmentFanout::new(dropped_source.clone(), Duration::from_secs(2), 4);
        let kept = EnrichmentFanout::new(kept_source.clone(), Duration::from_secs(2), 4);
        let names = titles(&["Heat", "Ronin", "Alien", "Tenet"]);

        let (cancelled, finished) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(20), dropped.enrich(&names)),
            kept.enrich(&names),
        );
        assert!(cancelled.is_err());
        assert!(finished.iter().all(Option::is_some));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(dropped_source.completed.load(Ordering::SeqCst), 0);
        assert_eq!(kept_source.completed.load(Ordering::SeqCst), 4);
    }

    /// Panics on one title, like a provider bug
    struct PanickingSource;

    #[async_trait::async_trait]
    impl EnrichmentSource for PanickingSource {
        async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
            if title == "boom" {
                panic!("lookup panicked");
            }
            Ok(Some(record(title)))
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_panicked_lookup_is_aborted_not_timed_out() {
        let source = PanickingSource;

        let outcomes = fanout(source)
            .enrich_outcomes(&titles(&["Heat", "boom", "Ronin"]))
            .await;

        assert!(matches!(outcomes[0], EnrichmentOutcome::Found(_)));
        assert!(matches!(outcomes[1], EnrichmentOutcome::Aborted));
        assert!(matches!(outcomes[2], EnrichmentOutcome::Found(_)));
    }

    #[test]
    fn test_outcome_into_record() {
        assert!(EnrichmentOutcome::Found(record("x")).into_record().is_some());
        assert!(EnrichmentOutcome::Miss.into_record().is_none());
        assert!(EnrichmentOutcome::TimedOut.into_record().is_none());
        assert!(EnrichmentOutcome::Aborted.into_record().is_none());
        assert!(EnrichmentOutcome::Failed(EnrichmentError::Status(404))
            .into_record()
            .is_none());
    }
}
