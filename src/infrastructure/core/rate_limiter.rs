use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token-budget gate shared by all outbound REST calls.
///
/// A fixed window of `limit` requests: the window starts with the first
/// request after a reset, and a caller arriving with the budget exhausted
/// sleeps until the window resets rather than proceeding or erroring.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    state: Mutex<WindowState>,
}

struct WindowState {
    window_start: Instant,
    used: usize,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Takes one request slot, waiting for the next window reset when the
    /// budget is exhausted. Never fails and never drops a caller.
    pub async fn acquire(&self) {
        loop {
            let reset_at = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                if now.duration_since(state.window_start) >= self.window {
                    state.window_start = now;
                    state.used = 0;
                }
                if state.used < self.limit {
                    state.used += 1;
                    return;
                }
                state.window_start + self.window
            };
            // Lock released while sleeping; re-check on wake
            tokio::time::sleep_until(reset_at).await;
        }
    }

    /// Non-blocking variant: takes a slot if one is free right now
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if now.duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.used = 0;
        }
        if state.used < self.limit {
            state.used += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_exact_limit_never_blocks() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        for _ in 0..5 {
            // Paused clock: acquire must resolve without any sleep
            tokio::time::timeout(Duration::from_millis(1), limiter.acquire())
                .await
                .expect("acquire within the budget must not block");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_limit_blocks_until_window_reset() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(!limiter.try_acquire().await);

        // The 4th caller parks until the window resets; under the paused
        // clock the timeout only fires if acquire is actually sleeping
        assert!(
            tokio::time::timeout(Duration::from_secs(9), limiter.acquire())
                .await
                .is_err(),
            "4th acquire must still be parked before the reset"
        );

        // Past the window boundary the budget is fresh again
        tokio::time::timeout(Duration::from_secs(11), limiter.acquire())
            .await
            .expect("acquire must resolve after the window reset");
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_resets_each_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(!limiter.try_acquire().await);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
    }
}
