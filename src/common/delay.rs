// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Run `fut` but take at least `floor` wall time. Loading indicators that
/// resolve in a few milliseconds read as flicker, so short reads are padded
/// up to the floor. Purely UX smoothing, not a correctness requirement.
pub async fn with_min_delay<F, T>(floor: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let deadline = Instant::now() + floor;
    let out = fut.await;
    sleep_until(deadline).await;
    out
}
