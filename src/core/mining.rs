// Recurring mining task. The timer thread owns only a weak handle to the
// ledger, so dropping the last `Arc<Ledger>` ends the loop on the next tick.

use crate::core::Ledger;
use crate::error::Result;
use log::{debug, error, info};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Seconds between mining attempts by default.
pub const DEFAULT_MINING_INTERVAL_SECS: u64 = 20;

pub struct MiningTimer {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl MiningTimer {
    /// Runs `Ledger::mining` every `interval` until stopped. Each attempt,
    /// successful or not, schedules the next one.
    pub fn start(ledger: Weak<Ledger>, interval: Duration) -> Result<MiningTimer> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("mining-timer".to_string())
            .spawn(move || {
                info!("Mining timer started ({}ms interval)", interval.as_millis());
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(ledger) = ledger.upgrade() else {
                                break;
                            };
                            if !ledger.mining() {
                                debug!("Scheduled mining attempt did not produce a block");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("Mining timer stopped");
            })?;

        Ok(MiningTimer {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signals the loop and waits for an in-flight attempt to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            // The timer thread can end up dropping the ledger itself; it must not join itself.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Mining timer thread panicked");
            }
        }
    }
}

impl Drop for MiningTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
