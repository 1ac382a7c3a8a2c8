use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Queueing rate limiter for the outbound email channel.
///
/// The upstream provider admits at most `per_window` sends per window
/// (14 per 1100 ms). Every `acquire` reserves one admission slot of
/// `window / per_window` and sleeps until that slot has fully elapsed, so
/// a batch of `k` sends takes at least `k * window / per_window` wall
/// clock. Callers over the budget queue up; nothing is ever rejected.
pub struct RateLimiter {
    slot: Duration,
    next_free: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(per_window: u32, window: Duration) -> Self {
        let per_window = per_window.max(1);
        Self {
            slot: window / per_window,
            next_free: Mutex::new(Instant::now()),
        }
    }

    /// Wait for the next admission slot.
    pub async fn acquire(&self) {
        let release = {
            let mut next_free = self.next_free.lock().await;
            let base = (*next_free).max(Instant::now());
            let release = base + self.slot;
            *next_free = release;
            release
        };
        tokio::time::sleep_until(release).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn twenty_eight_sends_take_two_full_windows() {
        let window = Duration::from_millis(1100);
        let limiter = RateLimiter::new(14, window);

        let start = Instant::now();
        for _ in 0..28 {
            limiter.acquire().await;
        }
        assert!(
            start.elapsed() >= 2 * window,
            "28 sends completed in {:?}, expected at least {:?}",
            start.elapsed(),
            2 * window
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fourteen_sends_fit_in_one_window() {
        let window = Duration::from_millis(1100);
        let limiter = RateLimiter::new(14, window);

        let start = Instant::now();
        for _ in 0..14 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() <= window + Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_are_serialized() {
        let window = Duration::from_millis(1100);
        let limiter = std::sync::Arc::new(RateLimiter::new(14, window));

        let start = Instant::now();
        let tasks: Vec<_> = (0..28)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert!(start.elapsed() >= 2 * window);
    }
}
