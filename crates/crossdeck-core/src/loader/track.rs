//! Background track decoder
//!
//! One worker thread decodes load requests in FIFO order and hands the
//! results back over a channel. The engine drains results on its own thread,
//! so track state is only ever mutated there.
//!
//! Every request carries the deck's load generation at the time it was
//! issued. The engine discards any result whose generation is no longer
//! current, which makes the latest load call win regardless of how long
//! earlier decodes took.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::audio::{DecodeError, TrackDecoder};
use crate::error::{EngineError, EngineResult};
use crate::types::DeckId;

/// Request to decode a track for a deck
#[derive(Debug)]
pub struct LoadRequest {
    pub deck: DeckId,
    /// Deck load generation the result must match to be applied
    pub generation: u64,
    /// Complete encoded file
    pub bytes: Vec<u8>,
}

/// Outcome of one load request
#[derive(Debug)]
pub struct LoadResult<T> {
    pub deck: DeckId,
    pub generation: u64,
    pub result: Result<T, DecodeError>,
}

/// Commands accepted by the loader thread
#[derive(Debug)]
pub enum LoaderCommand {
    Load(LoadRequest),
    Shutdown,
}

/// Owns the loader thread and both ends of its channels
pub struct TrackLoader<D: TrackDecoder> {
    command_tx: Sender<LoaderCommand>,
    result_rx: Receiver<LoadResult<D::Track>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl<D: TrackDecoder> TrackLoader<D> {
    /// Spawn the loader thread
    pub fn spawn(decoder: Arc<D>) -> EngineResult<Self> {
        let (command_tx, command_rx) = channel::unbounded::<LoaderCommand>();
        let (result_tx, result_rx) = channel::unbounded::<LoadResult<D::Track>>();

        let handle = thread::Builder::new()
            .name("track-loader".to_string())
            .spawn(move || loader_thread(decoder, command_rx, result_tx))
            .map_err(|e| EngineError::LoaderSpawn(e.to_string()))?;

        Ok(Self {
            command_tx,
            result_rx,
            thread_handle: Some(handle),
        })
    }

    /// Queue a decode (non-blocking)
    pub fn request(&self, request: LoadRequest) -> EngineResult<()> {
        self.command_tx
            .send(LoaderCommand::Load(request))
            .map_err(|_| EngineError::LoaderStopped)
    }

    /// Take one finished result if available
    pub fn try_recv(&self) -> Option<LoadResult<D::Track>> {
        self.result_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished result
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadResult<D::Track>> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Whether the loader thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the loader thread after any queued requests; later requests fail
    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(LoaderCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Track loader thread panicked");
            }
        }
    }
}

impl<D: TrackDecoder> Drop for TrackLoader<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn loader_thread<D: TrackDecoder>(
    decoder: Arc<D>,
    commands: Receiver<LoaderCommand>,
    results: Sender<LoadResult<D::Track>>,
) {
    log::info!("Track loader thread started");

    while let Ok(command) = commands.recv() {
        let request = match command {
            LoaderCommand::Load(request) => request,
            LoaderCommand::Shutdown => break,
        };

        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| decoder.decode(&request.bytes)))
            .unwrap_or_else(|payload| Err(DecodeError::Panicked(panic_message(payload.as_ref()))));
        match &result {
            Ok(_) => log::info!(
                "Decoded {} bytes for {} (generation {}) in {:?}",
                request.bytes.len(),
                request.deck,
                request.generation,
                start.elapsed()
            ),
            Err(e) => log::warn!("Decode failed for {}: {}", request.deck, e),
        }

        let sent = results.send(LoadResult {
            deck: request.deck,
            generation: request.generation,
            result,
        });
        if sent.is_err() {
            break;
        }
    }

    log::info!("Track loader thread exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
