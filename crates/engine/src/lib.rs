// Clock-driven reference engine
//
// Prepares a source by probing its header, then keeps a wall-clock position
// on a worker thread: seeks are executed there and end of stream is detected
// on every tick. Nothing is decoded or rendered.

pub mod clock;
pub mod probe;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use liteplay_core::{Engine, EngineError, EngineErrorKind, Notifier, SourceKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub use clock::PlaybackClock;
pub use probe::TrackInfo;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How often the worker checks for end of stream
    pub tick: Duration,
    /// Seek targets are rounded down to a multiple of this
    pub seek_align_ms: u64,
}

impl EngineConfig {
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_seek_align_ms(mut self, align_ms: u64) -> Self {
        self.seek_align_ms = align_ms;
        self
    }

    fn align(&self, position_ms: u64) -> u64 {
        if self.seek_align_ms > 1 {
            position_ms / self.seek_align_ms * self.seek_align_ms
        } else {
            position_ms
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            seek_align_ms: 1000,
        }
    }
}

enum Ctrl {
    Seek(u64),
    Stop,
}

/// Worker thread owning one session
struct Worker {
    ctrl_tx: Sender<Ctrl>,
    stop_flag: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        let _ = self.ctrl_tx.send(Ctrl::Stop);
        if let Some(handle) = self.handle.take() {
            log::debug!("[engine] waiting for worker thread to finish");
            let _ = handle.join();
        }
    }
}

pub struct ClockEngine {
    config: EngineConfig,
    clock: Arc<Mutex<PlaybackClock>>,
    worker: Option<Worker>,
}

impl ClockEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            clock: Arc::new(Mutex::new(PlaybackClock::new())),
            worker: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }

    fn run(
        path: String,
        config: EngineConfig,
        clock: Arc<Mutex<PlaybackClock>>,
        ctrl_rx: Receiver<Ctrl>,
        stop_flag: Arc<AtomicBool>,
        notifier: Notifier,
    ) {
        let info = match probe::probe_file(&path) {
            Ok(info) => info,
            Err(err) => {
                if !stop_flag.load(Ordering::SeqCst) {
                    log::error!("[engine] prepare failed: {}", err);
                    notifier.error(err);
                }
                return;
            }
        };
        if stop_flag.load(Ordering::SeqCst) {
            log::info!("[engine] prepare cancelled");
            return;
        }

        log::info!(
            "[engine] prepared codec={} sample_rate={} channels={} duration_ms={}",
            info.codec,
            info.sample_rate,
            info.channels,
            info.duration_ms
        );
        clock.lock().load(info.duration_ms);
        notifier.prepared(info.duration_ms);

        let mut finished = false;
        loop {
            match ctrl_rx.recv_timeout(config.tick) {
                Ok(Ctrl::Seek(position_ms)) => {
                    let target = config.align(position_ms);
                    clock.lock().seek(target);
                    finished = false;
                    log::info!("[engine] seek to {} ms (requested {} ms)", target, position_ms);
                    notifier.seek_completed();
                }
                Ok(Ctrl::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            if stop_flag.load(Ordering::SeqCst) {
                break;
            }

            let at_end = clock.lock().at_end();
            if at_end && !finished {
                finished = true;
                log::info!("[engine] end of stream");
                notifier.end_of_stream();
            } else if !at_end {
                finished = false;
            }
        }
        log::debug!("[engine] worker finished");
    }
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ClockEngine {
    fn prepare(&mut self, source: &SourceKind, notifier: Notifier) -> Result<(), EngineError> {
        self.stop_worker();
        self.clock.lock().clear();

        let path = match source {
            SourceKind::File(path) => path.clone(),
            SourceKind::Http(url) => {
                log::warn!("[engine] network source not supported: {}", url);
                return Err(EngineError::new(
                    EngineErrorKind::UnsupportedSource,
                    format!("network streaming is not supported: {}", url),
                ));
            }
        };

        log::info!("[engine] preparing {}", source);
        let (ctrl_tx, ctrl_rx) = crossbeam_channel::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let config = self.config;
        let clock = self.clock.clone();
        let stop = stop_flag.clone();

        let handle = thread::Builder::new()
            .name("liteplay-engine".to_string())
            .spawn(move || Self::run(path, config, clock, ctrl_rx, stop, notifier))
            .map_err(|e| {
                EngineError::new(EngineErrorKind::Resource, format!("spawn worker: {}", e))
            })?;

        self.worker = Some(Worker {
            ctrl_tx,
            stop_flag,
            handle: Some(handle),
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.clock.lock().start();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.clock.lock().pause();
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        let worker = self.worker.as_ref().ok_or_else(|| {
            EngineError::new(EngineErrorKind::Resource, "seek without a prepared source")
        })?;
        worker.ctrl_tx.send(Ctrl::Seek(position_ms)).map_err(|_| {
            EngineError::new(EngineErrorKind::Resource, "engine worker stopped")
        })
    }

    fn reset(&mut self) {
        log::info!("[engine] reset");
        self.stop_worker();
        self.clock.lock().clear();
    }

    fn position_ms(&self) -> u64 {
        self.clock.lock().position_ms()
    }

    fn release(&mut self) {
        log::info!("[engine] release");
        self.reset();
    }
}

impl Drop for ClockEngine {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
