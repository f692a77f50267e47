//! Elapsed-time counter for a run.
//!
//! A background thread counts fixed ticks until stopped. Stopping freezes the
//! count and joins the thread; dropping the ticker stops it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug)]
pub struct ElapsedTicker {
    period: Duration,
    ticks: Arc<AtomicU64>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTicker {
    pub fn start(period: Duration) -> Self {
        let ticks = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let counter = Arc::clone(&ticks);

        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            period,
            ticks,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        // Saturate rather than overflow on absurd tick counts.
        let ticks = u32::try_from(self.ticks()).unwrap_or(u32::MAX);
        self.period.saturating_mul(ticks)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("elapsed ticker thread panicked");
            }
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_while_running_and_freezes_on_stop() {
        let mut ticker = ElapsedTicker::start(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(60));
        ticker.stop();
        let frozen = ticker.ticks();
        assert!(frozen > 0);
        assert!(!ticker.is_running());

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticker.ticks(), frozen);
        assert_eq!(ticker.elapsed(), Duration::from_millis(5 * frozen));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut ticker = ElapsedTicker::start(Duration::from_secs(1));
        ticker.stop();
        ticker.stop();
        assert_eq!(ticker.ticks(), 0);
    }
}
