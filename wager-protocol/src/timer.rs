use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// How long a first party's escrow stays claimable before local cancel unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CancellationWindow {
    total_seconds: u64,
    remaining_seconds: u64,
}

impl CancellationWindow {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Count down one second, clamping at zero. Returns the remaining seconds.
    pub fn tick(&mut self) -> u64 {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }
}

/// One-second countdown over a [`CancellationWindow`].
///
/// The timer only mutates its own window; it never talks to the ledger or
/// the backend.
pub struct CancellationTimer {
    window: Arc<watch::Sender<CancellationWindow>>,
    task: Option<JoinHandle<()>>,
}

impl CancellationTimer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CancellationWindow::default());
        Self {
            window: Arc::new(tx),
            task: None,
        }
    }

    /// Start counting down from `total_seconds`. Must be called inside a tokio runtime.
    pub fn arm(&mut self, total_seconds: u64) {
        self.stop_task();
        self.window
            .send_replace(CancellationWindow::new(total_seconds));

        if total_seconds == 0 {
            return;
        }

        let window = self.window.clone();
        self.task = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                ticker.tick().await;

                let mut remaining = 0;
                window.send_modify(|w| remaining = w.tick());
                tracing::debug!("Cancellation window: {}s remaining", remaining);

                if remaining == 0 {
                    tracing::info!("Cancellation window elapsed, local cancel unlocked");
                    break;
                }
            }
        }));

        tracing::debug!("Cancellation timer armed for {}s", total_seconds);
    }

    /// Stop the countdown and clear the window.
    pub fn disarm(&mut self) {
        self.stop_task();
        self.window.send_replace(CancellationWindow::default());
    }

    pub fn window(&self) -> CancellationWindow {
        *self.window.borrow()
    }

    /// Receiver for rendering the countdown.
    pub fn subscribe(&self) -> watch::Receiver<CancellationWindow> {
        self.window.subscribe()
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for CancellationTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancellationTimer {
    fn drop(&mut self) {
        self.stop_task();
    }
}

impl std::fmt::Debug for CancellationTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationTimer")
            .field("window", &self.window())
            .field("running", &self.task.as_ref().map_or(false, |t| !t.is_finished()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn test_window_clamps_at_zero() {
        let mut window = CancellationWindow::new(2);
        assert_eq!(window.tick(), 1);
        assert_eq!(window.tick(), 0);
        assert_eq!(window.tick(), 0);
        assert!(window.is_expired());
        assert_eq!(window.total_seconds(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_reaches_exactly_zero() {
        let mut timer = CancellationTimer::new();
        timer.arm(3);
        assert_eq!(timer.window().remaining_seconds(), 3);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(timer.window().remaining_seconds(), 2);

        sleep(Duration::from_secs(5)).await;
        let window = timer.window();
        assert_eq!(window.remaining_seconds(), 0);
        assert_eq!(window.total_seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_is_monotonic() {
        let mut timer = CancellationTimer::new();
        let mut rx = timer.subscribe();
        timer.arm(5);

        let mut previous = rx.borrow_and_update().remaining_seconds();
        assert_eq!(previous, 5);

        while previous > 0 {
            rx.changed().await.unwrap();
            let current = rx.borrow_and_update().remaining_seconds();
            assert!(current <= previous);
            assert!(current <= 5);
            previous = current;
        }

        sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.window().remaining_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_countdown() {
        let mut timer = CancellationTimer::new();
        timer.arm(10);
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(timer.window().remaining_seconds(), 8);

        timer.disarm();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.window(), CancellationWindow::default());
    }

    #[tokio::test]
    async fn test_zero_window_is_immediately_expired() {
        let mut timer = CancellationTimer::new();
        timer.arm(0);
        assert!(timer.window().is_expired());
    }
}
