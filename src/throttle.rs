use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::{request::RequestContext, MewsError, Result};

/// Shared "do not send before" instant set by `429 Too Many Requests`.
///
/// Clones share the same slot, so one throttled call holds back every other
/// call made through the same client.
#[derive(Clone, Debug, Default)]
pub(crate) struct RetryAfterGate {
    until: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl RetryAfterGate {
    fn slot(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.until.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self) -> Option<DateTime<Utc>> {
        *self.slot()
    }

    /// Stores `at` unless a later instant is already pending.
    pub(crate) fn set(&self, at: DateTime<Utc>) {
        let mut slot = self.slot();
        if slot.map_or(true, |current| current < at) {
            *slot = Some(at);
        }
    }

    /// Clears the slot only if it still holds `at`.
    pub(crate) fn clear(&self, at: DateTime<Utc>) {
        let mut slot = self.slot();
        if *slot == Some(at) {
            *slot = None;
        }
    }

    /// Sleeps until no future instant is pending.
    ///
    /// Re-reads the slot after every sleep so an instant pushed further out by
    /// a concurrent call is honoured without waiting twice on the old one.
    pub(crate) async fn wait(&self, context: &RequestContext) -> Result<()> {
        loop {
            let Some(until) = self.get() else {
                return Ok(());
            };
            let Ok(remaining) = (until - Utc::now()).to_std() else {
                return Ok(());
            };
            if remaining.is_zero() {
                return Ok(());
            }

            let wait_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(%until, wait_ms, "waiting for retry-after");
            pause(remaining, context).await?;
        }
    }
}

/// Sleeps for `duration`, returning early with `Cancelled` if the context is
/// cancelled first.
pub(crate) async fn pause(duration: Duration, context: &RequestContext) -> Result<()> {
    match context.cancellation() {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(MewsError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        },
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}

/// Reads `Retry-After` as an HTTP-date or as delta-seconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<u64>() {
        let delta = chrono::Duration::from_std(Duration::from_secs(seconds)).ok()?;
        return now.checked_add_signed(delta);
    }

    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use chrono::{TimeZone, Utc};
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
    use tokio_util::sync::CancellationToken;

    use super::{parse_retry_after, pause, RetryAfterGate};
    use crate::{request::RequestContext, MewsError};

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parses_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 0, 0).unwrap();
        let parsed = parse_retry_after(&headers("Wed, 21 Oct 2015 07:28:00 GMT"), now);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()));
    }

    #[test]
    fn parses_delta_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let parsed = parse_retry_after(&headers("120"), now);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap()));
    }

    #[test]
    fn ignores_missing_or_garbage_header() {
        let now = Utc::now();
        assert_eq!(parse_retry_after(&HeaderMap::new(), now), None);
        assert_eq!(parse_retry_after(&headers("soon"), now), None);
    }

    #[test]
    fn set_keeps_the_later_instant() {
        let gate = RetryAfterGate::default();
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 20).unwrap();

        gate.set(late);
        gate.set(early);
        assert_eq!(gate.get(), Some(late));
    }

    #[test]
    fn clear_ignores_a_newer_instant() {
        let gate = RetryAfterGate::default();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 20).unwrap();

        gate.set(first);
        gate.set(second);
        gate.clear(first);
        assert_eq!(gate.get(), Some(second));

        gate.clear(second);
        assert_eq!(gate.get(), None);
    }

    #[test]
    fn clones_share_the_slot() {
        let gate = RetryAfterGate::default();
        let other = gate.clone();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        other.set(at);
        assert_eq!(gate.get(), Some(at));
    }

    #[tokio::test]
    async fn wait_returns_immediately_for_past_instant() {
        let gate = RetryAfterGate::default();
        gate.set(Utc::now() - chrono::Duration::seconds(5));

        let started = Instant::now();
        gate.wait(&RequestContext::background())
            .await
            .expect("wait must succeed");
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn wait_sleeps_until_future_instant() {
        let gate = RetryAfterGate::default();
        gate.set(Utc::now() + chrono::Duration::milliseconds(200));

        let started = Instant::now();
        gate.wait(&RequestContext::background())
            .await
            .expect("wait must succeed");
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn pause_aborts_on_cancellation() {
        let token = CancellationToken::new();
        let context = RequestContext::background().with_cancellation(token.clone());
        token.cancel();

        let err = pause(Duration::from_secs(30), &context)
            .await
            .expect_err("cancelled pause must fail");
        assert!(matches!(err, MewsError::Cancelled));
    }
}
