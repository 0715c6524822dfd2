//! Race a unit of work against a deadline while a progress future runs.
//!
//! The progress future has output type [`Infallible`]: it can keep the user
//! entertained but can never win. Whatever has not finished when the race
//! resolves is dropped, which cancels it at its current `.await`.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

/// How a race ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// The work finished before the deadline; carries its output.
    Completed(T),
    /// The deadline elapsed first; the work was cancelled.
    TimedOut,
}

impl<T> RaceOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RaceOutcome::TimedOut)
    }
}

/// Run `work` and `progress` concurrently until `work` completes or
/// `timeout` elapses.
///
/// Work that is ready at the same instant as the deadline wins.
pub async fn race_with_timeout<W, P>(work: W, progress: P, timeout: Duration) -> RaceOutcome<W::Output>
where
    W: Future,
    P: Future<Output = Infallible>,
{
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(work, progress, deadline);

    tokio::select! {
        biased;

        out = &mut work => RaceOutcome::Completed(out),
        _ = &mut deadline => RaceOutcome::TimedOut,
        never = &mut progress => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::time::{Instant, sleep};

    use crate::throbber::{Throbber, ThrobberStyle};

    async fn finishes_after(delay: Duration, text: &str, done: Arc<AtomicBool>) -> String {
        sleep(delay).await;
        done.store(true, Ordering::SeqCst);
        text.to_string()
    }

    fn spinner() -> Throbber {
        Throbber::new(ThrobberStyle::Ascii, Duration::from_millis(150))
    }

    #[tokio::test(start_paused = true)]
    async fn work_before_deadline_wins() {
        let done = Arc::new(AtomicBool::new(false));
        let start = Instant::now();
        let outcome = race_with_timeout(
            finishes_after(Duration::from_secs(2), "quip", done.clone()),
            spinner().spin(std::io::sink()),
            Duration::from_secs(15),
        )
        .await;

        assert_eq!(outcome, RaceOutcome::Completed("quip".to_string()));
        assert!(done.load(Ordering::SeqCst));
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_slow_work() {
        let done = Arc::new(AtomicBool::new(false));
        let start = Instant::now();
        let outcome = race_with_timeout(
            finishes_after(Duration::from_secs(20), "too late", done.clone()),
            spinner().spin(std::io::sink()),
            Duration::from_secs(15),
        )
        .await;

        assert!(outcome.is_timed_out());
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(start.elapsed() < Duration::from_secs(20));

        // Cancelled work never gets to finish, even once its time has passed.
        sleep(Duration::from_secs(10)).await;
        assert!(!done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_work_beats_zero_timeout() {
        let outcome = race_with_timeout(
            async { 7 },
            spinner().spin(std::io::sink()),
            Duration::ZERO,
        )
        .await;
        assert_eq!(outcome, RaceOutcome::Completed(7));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_with_pending_work_times_out() {
        let outcome = race_with_timeout(
            sleep(Duration::from_secs(3600)),
            spinner().spin(std::io::sink()),
            Duration::ZERO,
        )
        .await;
        assert!(outcome.is_timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_never_resolves_the_race() {
        for frame_ms in [0u64, 1, 50, 150, 5_000] {
            for timeout_ms in [0u64, 1, 100, 15_000] {
                let throbber = Throbber::new(ThrobberStyle::Triangles, Duration::from_millis(frame_ms));
                let outcome = race_with_timeout(
                    std::future::pending::<()>(),
                    throbber.spin(std::io::sink()),
                    Duration::from_millis(timeout_ms),
                )
                .await;
                assert!(outcome.is_timed_out(), "frame={frame_ms}ms timeout={timeout_ms}ms");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_dropped_when_race_resolves() {
        struct CountDrop(Arc<AtomicUsize>);
        impl Drop for CountDrop {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let guard = CountDrop(drops.clone());
        let progress = async move {
            let _guard = guard;
            std::future::pending::<Infallible>().await
        };

        let outcome = race_with_timeout(async { "done" }, progress, Duration::from_secs(1)).await;
        assert_eq!(outcome, RaceOutcome::Completed("done"));
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_work_is_completed_not_timed_out() {
        let outcome: RaceOutcome<Result<String, String>> = race_with_timeout(
            async {
                sleep(Duration::from_secs(1)).await;
                Err("connection refused".to_string())
            },
            spinner().spin(std::io::sink()),
            Duration::from_secs(15),
        )
        .await;
        assert_eq!(outcome, RaceOutcome::Completed(Err("connection refused".to_string())));
    }
}
