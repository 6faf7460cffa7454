use crate::error::{GlacierError, Result};
use crossbeam_channel::RecvTimeoutError;
use log::debug;
use ndarray::{Array2, ArrayView3};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Per-pixel glacier probability for one image tile.
///
/// Input is `(tile, tile, input_bands())` with values in `[0, 1]`; the
/// returned array must be `(tile, tile)`.
pub trait Classifier: Send + Sync {
    fn input_bands(&self) -> usize;

    fn predict(&self, tile: ArrayView3<'_, f32>) -> Result<Array2<f32>>;
}

/// Fails a prediction that takes longer than `timeout`.
///
/// The prediction runs on its own thread; on expiry the thread is abandoned
/// and its result discarded.
pub struct TimeoutClassifier<C> {
    inner: Arc<C>,
    timeout: Duration,
}

impl<C: Classifier + 'static> TimeoutClassifier<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<C: Classifier + 'static> Classifier for TimeoutClassifier<C> {
    fn input_bands(&self) -> usize {
        self.inner.input_bands()
    }

    fn predict(&self, tile: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        // One slot, so the abandoned worker never blocks on send.
        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let tile = tile.to_owned();

        thread::spawn(move || {
            // Receiver may already be gone after a timeout.
            let _ = tx.send(inner.predict(tile.view()));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                debug!("Prediction exceeded {:?}", self.timeout);
                Err(GlacierError::ClassifierTimeout(self.timeout.as_secs_f64()))
            }
            Err(RecvTimeoutError::Disconnected) => Err(GlacierError::ClassifierAborted),
        }
    }
}
