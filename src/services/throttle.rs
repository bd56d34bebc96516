use std::time::Duration;

use tracing::trace;

/// Pause before every listing request.
pub const LISTING_DELAY: Duration = Duration::from_millis(100);
/// Pause before every syllabus request.
pub const SYLLABUS_DELAY: Duration = Duration::from_millis(50);

/// Fixed politeness delays in front of outbound EBS calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    listing: Duration,
    syllabus: Duration,
}

impl Throttle {
    pub const fn new(listing: Duration, syllabus: Duration) -> Self {
        Self { listing, syllabus }
    }

    /// No delays at all, for driving the sync engine against local fixtures.
    pub const fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub async fn before_listing(&self) {
        pause(self.listing).await;
    }

    pub async fn before_syllabus(&self) {
        pause(self.syllabus).await;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(LISTING_DELAY, SYLLABUS_DELAY)
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    trace!("Throttling: waiting {:?}", delay);
    tokio::time::sleep(delay).await;
}
