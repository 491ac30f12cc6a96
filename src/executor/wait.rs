use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::TimeoutError;
use crate::surface::UiSurface;

/// Cooperatively wait until `predicate` holds.
///
/// Each iteration settles the surface first, then evaluates the predicate; the first true
/// evaluation returns immediately. Once `timeout` has elapsed the wait fails with a
/// `TimeoutError` naming `what`.
pub async fn wait_for<F>(
    surface: &dyn UiSurface,
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut predicate: F,
) -> Result<(), TimeoutError>
where
    F: FnMut(&dyn UiSurface) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut polls = 0u32;
    loop {
        surface.settle().await;
        polls += 1;
        if predicate(surface) {
            trace!(target: "uidsl::executor", %what, polls, "Wait condition met");
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(TimeoutError {
                what: what.to_string(),
                timeout,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{ElementQuery, find_matches};
    use crate::surface::{ElementNode, SnapshotSurface};

    fn has(surface: &dyn UiSurface, text: &str) -> bool {
        !find_matches(&surface.snapshot(), &ElementQuery::exact_text(text)).is_empty()
    }

    #[tokio::test]
    async fn returns_on_first_true_evaluation() {
        let surface = SnapshotSurface::new(vec![ElementNode::text("ready")]);
        wait_for(
            &surface,
            "ready",
            Duration::from_millis(100),
            Duration::from_millis(5),
            |s| has(s, "ready"),
        )
        .await
        .unwrap();
        assert_eq!(surface.settle_count(), 1);
    }

    #[tokio::test]
    async fn sees_elements_that_appear_after_settling() {
        let surface = SnapshotSurface::new(vec![]);
        surface.schedule(3, ElementNode::text("late"));
        wait_for(
            &surface,
            "late",
            Duration::from_secs(2),
            Duration::from_millis(1),
            |s| has(s, "late"),
        )
        .await
        .unwrap();
        assert_eq!(surface.settle_count(), 3);
    }

    #[tokio::test]
    async fn times_out_with_description() {
        let surface = SnapshotSurface::new(vec![]);
        let err = wait_for(
            &surface,
            "the spinner",
            Duration::from_millis(30),
            Duration::from_millis(5),
            |_| false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.what, "the spinner");
        assert!(err.to_string().contains("30ms"));
        assert!(surface.settle_count() >= 2);
    }
}
