//! Rate limiter behavior under concurrent callers, driven on a paused clock.

use brisk::infrastructure::core::rate_limiter::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_split_across_windows() {
    let limiter = Arc::new(RateLimiter::new(40, Duration::from_secs(10)));
    let start = tokio::time::Instant::now();

    let mut handles = Vec::new();
    for _ in 0..60 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            start.elapsed()
        }));
    }

    let mut admissions = Vec::new();
    for handle in handles {
        admissions.push(handle.await.unwrap());
    }

    // First window admits exactly the budget; the rest wait for the reset
    let first_window = admissions
        .iter()
        .filter(|d| **d < Duration::from_secs(10))
        .count();
    assert_eq!(first_window, 40);
    assert!(
        admissions.iter().all(|d| *d < Duration::from_secs(20)),
        "20 stragglers fit in the second window"
    );
}

#[tokio::test(start_paused = true)]
async fn test_sequential_bursts_spread_across_windows() {
    let limiter = RateLimiter::new(2, Duration::from_secs(10));
    let start = tokio::time::Instant::now();

    for _ in 0..6 {
        limiter.acquire().await;
    }

    // 6 acquisitions at 2 per window need two full window waits
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(20), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(31), "elapsed {elapsed:?}");
}
