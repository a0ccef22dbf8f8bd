//! Image readiness gate.
//!
//! Decode completion is not reliably observable through a single signal: a
//! "loaded" event can arrive before pixels are actually paintable. The gate
//! bounds that uncertainty with a fail-open protocol — it settles, re-polls a
//! bounded number of times, and escapes to Ready on an absolute timeout so an
//! export can never hang on a stuck image.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

/// Decode events emitted by an image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEvent {
    Loaded,
    Errored,
}

/// The gate's view of a decoding image.
///
/// The production implementation is [`crate::services::ImageSlot`]; tests
/// substitute stalled or failing resources.
#[async_trait]
pub trait ImageResource: Send + Sync {
    /// Decode finished and reported success.
    fn is_complete(&self) -> bool;

    /// Natural dimensions, once known.
    fn natural_size(&self) -> Option<(u32, u32)>;

    /// Pixels are actually available to sample and draw.
    fn is_displayable(&self) -> bool;

    /// Decode reported an error.
    fn has_failed(&self) -> bool;

    /// Force a fresh decode attempt.
    fn reload(&self);

    /// Wait for the next decode event. Resolves immediately when the
    /// resource is already in a terminal state.
    async fn next_event(&self) -> ImageEvent;
}

/// Gate states. `Failed` is terminal; every non-terminal state can escape
/// straight to `Ready` on the absolute timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Loading,
    Decoded,
    SettlingDelay,
    Ready,
    Failed,
}

/// Timing constants bounding every wait in the gate.
#[derive(Debug, Clone, Copy)]
pub struct GateTimings {
    /// Pause after decode completion so compositing sees settled pixels.
    pub settle_delay: Duration,
    /// Interval between readiness re-polls after the settle delay.
    pub poll_interval: Duration,
    /// Number of re-polls before declaring Ready regardless.
    pub max_poll_attempts: u32,
    /// Absolute cap on the whole wait; elapses into fail-open Ready.
    pub max_wait: Duration,
}

impl Default for GateTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            max_poll_attempts: 6,
            max_wait: Duration::from_secs(10),
        }
    }
}

/// How the gate resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResolution {
    Ready { timed_out: bool },
    Failed,
}

/// Bounded asynchronous protocol deciding when a source image is safe to
/// sample and composite.
pub struct ReadinessGate {
    timings: GateTimings,
    state: watch::Sender<GateState>,
}

impl ReadinessGate {
    pub fn new(timings: GateTimings) -> Self {
        let (state, _) = watch::channel(GateState::Idle);
        Self { timings, state }
    }

    /// Observe state transitions (tests and progress reporting).
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Drive the resource to a resolution. Never waits longer than
    /// `timings.max_wait`.
    pub async fn wait_until_ready(&self, image: &dyn ImageResource) -> GateResolution {
        match timeout(self.timings.max_wait, self.drive(image)).await {
            Ok(resolution) => resolution,
            Err(_) => {
                tracing::warn!(
                    max_wait_ms = self.timings.max_wait.as_millis() as u64,
                    "Image never settled within the wait cap; proceeding anyway"
                );
                self.set(GateState::Ready);
                GateResolution::Ready { timed_out: true }
            }
        }
    }

    async fn drive(&self, image: &dyn ImageResource) -> GateResolution {
        self.set(GateState::Loading);

        // A resource that is not already complete gets its load re-triggered
        // for a fresh completion signal.
        if !image.is_complete() {
            image.reload();
        }

        loop {
            if image.has_failed() {
                self.set(GateState::Failed);
                return GateResolution::Failed;
            }
            if checks_pass(image) {
                break;
            }
            match image.next_event().await {
                ImageEvent::Errored => {
                    self.set(GateState::Failed);
                    return GateResolution::Failed;
                }
                ImageEvent::Loaded => {
                    if checks_pass(image) {
                        break;
                    }
                    // Loaded signal without paintable pixels; let the
                    // resource settle before asking again.
                    sleep(self.timings.poll_interval).await;
                }
            }
        }
        self.set(GateState::Decoded);

        self.set(GateState::SettlingDelay);
        sleep(self.timings.settle_delay).await;

        for attempt in 0..self.timings.max_poll_attempts {
            if image.has_failed() {
                self.set(GateState::Failed);
                return GateResolution::Failed;
            }
            if checks_pass(image) {
                break;
            }
            tracing::trace!(attempt, "Image not paintable yet; re-polling");
            sleep(self.timings.poll_interval).await;
        }

        self.set(GateState::Ready);
        GateResolution::Ready { timed_out: false }
    }

    fn set(&self, state: GateState) {
        tracing::trace!(?state, "Readiness gate transition");
        let _ = self.state.send(state);
    }
}

/// Completion signal AND positive natural dimensions AND paintable pixels.
fn checks_pass(image: &dyn ImageResource) -> bool {
    image.is_complete()
        && image.natural_size().is_some_and(|(w, h)| w > 0 && h > 0)
        && image.is_displayable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn fast_timings() -> GateTimings {
        GateTimings {
            settle_delay: Duration::from_millis(5),
            poll_interval: Duration::from_millis(5),
            max_poll_attempts: 3,
            max_wait: Duration::from_millis(200),
        }
    }

    /// Resource that decodes instantly.
    struct InstantResource {
        reloads: AtomicUsize,
    }

    impl InstantResource {
        fn new() -> Self {
            Self {
                reloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageResource for InstantResource {
        fn is_complete(&self) -> bool {
            true
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            Some((64, 48))
        }
        fn is_displayable(&self) -> bool {
            true
        }
        fn has_failed(&self) -> bool {
            false
        }
        fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
        async fn next_event(&self) -> ImageEvent {
            ImageEvent::Loaded
        }
    }

    /// Resource that never signals anything.
    struct StalledResource {
        reloads: AtomicUsize,
    }

    impl StalledResource {
        fn new() -> Self {
            Self {
                reloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageResource for StalledResource {
        fn is_complete(&self) -> bool {
            false
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            None
        }
        fn is_displayable(&self) -> bool {
            false
        }
        fn has_failed(&self) -> bool {
            false
        }
        fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
        async fn next_event(&self) -> ImageEvent {
            std::future::pending().await
        }
    }

    /// Resource whose decode errors out.
    struct BrokenResource;

    #[async_trait]
    impl ImageResource for BrokenResource {
        fn is_complete(&self) -> bool {
            false
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            None
        }
        fn is_displayable(&self) -> bool {
            false
        }
        fn has_failed(&self) -> bool {
            true
        }
        fn reload(&self) {}
        async fn next_event(&self) -> ImageEvent {
            ImageEvent::Errored
        }
    }

    #[tokio::test]
    async fn test_ready_resource_resolves_without_reload() {
        let gate = ReadinessGate::new(fast_timings());
        let resource = InstantResource::new();

        let resolution = gate.wait_until_ready(&resource).await;

        assert_eq!(resolution, GateResolution::Ready { timed_out: false });
        assert_eq!(gate.state(), GateState::Ready);
        assert_eq!(resource.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stalled_resource_escapes_via_timeout() {
        let gate = ReadinessGate::new(fast_timings());
        let resource = StalledResource::new();

        let started = Instant::now();
        let resolution = gate.wait_until_ready(&resource).await;

        assert_eq!(resolution, GateResolution::Ready { timed_out: true });
        assert_eq!(gate.state(), GateState::Ready);
        assert!(started.elapsed() < Duration::from_secs(2));
        // An incomplete resource gets its load force-retriggered once
        assert_eq!(resource.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_error_resolves_failed() {
        let gate = ReadinessGate::new(fast_timings());

        let resolution = gate.wait_until_ready(&BrokenResource).await;

        assert_eq!(resolution, GateResolution::Failed);
        assert_eq!(gate.state(), GateState::Failed);
    }

    #[tokio::test]
    async fn test_gate_walks_through_settling_states() {
        let gate = ReadinessGate::new(fast_timings());
        let mut rx = gate.subscribe();
        let resource = InstantResource::new();

        let mut seen = vec![*rx.borrow()];
        let driver = gate.wait_until_ready(&resource);
        tokio::pin!(driver);

        loop {
            tokio::select! {
                resolution = &mut driver => {
                    assert_eq!(resolution, GateResolution::Ready { timed_out: false });
                    break;
                }
                changed = rx.changed() => {
                    changed.unwrap();
                    seen.push(*rx.borrow());
                }
            }
        }

        // The watch channel coalesces the synchronous Loading -> Decoded
        // burst; the settle pause is the first observable state.
        assert!(seen.contains(&GateState::SettlingDelay));
        assert_eq!(gate.state(), GateState::Ready);
    }
}
