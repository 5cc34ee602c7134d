//! Execution strategies for the normalizer.
//!
//! [`InlineNormalizer`] runs on the caller's thread. [`OffloadedNormalizer`]
//! hands requests to a dedicated worker thread and returns a [`Ticket`]
//! per request, matched to its result by id rather than queue position.
//! Both run [`crate::normalize`], so geometry and errors agree by
//! construction.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::types::{NormalizeConfig, NormalizeError, Normalized};

/// A normalization strategy.
pub trait Normalizer {
    /// Start normalizing `bytes`. The returned ticket yields the result.
    fn submit(&self, bytes: Vec<u8>, config: &NormalizeConfig) -> Ticket;

    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Submit and wait.
    ///
    /// # Errors
    ///
    /// Whatever the pipeline reports, or
    /// [`NormalizeError::WorkerUnavailable`] if an offloaded request is
    /// lost.
    fn normalize(&self, bytes: Vec<u8>, config: &NormalizeConfig) -> Result<Normalized, NormalizeError> {
        self.submit(bytes, config).wait()
    }
}

/// Available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Offload when possible, inline otherwise.
    #[default]
    Auto,
    /// Always on the caller's thread.
    Inline,
    /// Always on the worker thread.
    Offload,
}

impl StrategyKind {
    /// Build the concrete strategy.
    ///
    /// # Errors
    ///
    /// [`StrategyKind::Offload`] returns
    /// [`NormalizeError::WorkerUnavailable`] if the worker thread cannot
    /// be spawned. `Auto` falls back to inline instead.
    pub fn build(self, config: &NormalizeConfig) -> Result<Box<dyn Normalizer>, NormalizeError> {
        match self {
            Self::Auto => Ok(select_normalizer(config)),
            Self::Inline => Ok(Box::new(InlineNormalizer)),
            Self::Offload => Ok(Box::new(OffloadedNormalizer::spawn()?)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Inline => f.write_str("inline"),
            Self::Offload => f.write_str("offload"),
        }
    }
}

/// Pick a strategy by capability: offload when `config.offload` is set
/// and the worker thread starts, inline otherwise.
#[must_use]
pub fn select_normalizer(config: &NormalizeConfig) -> Box<dyn Normalizer> {
    if !config.offload {
        tracing::info!("offloading disabled, normalizing inline");
        return Box::new(InlineNormalizer);
    }
    match OffloadedNormalizer::spawn() {
        Ok(offloaded) => {
            tracing::info!("normalizing on worker thread");
            Box::new(offloaded)
        }
        Err(err) => {
            tracing::warn!(%err, "worker thread unavailable, normalizing inline");
            Box::new(InlineNormalizer)
        }
    }
}

/// A handle to one submitted normalization.
#[must_use = "a ticket does nothing unless waited on"]
pub struct Ticket {
    id: u64,
    state: TicketState,
}

enum TicketState {
    Ready(Result<Normalized, NormalizeError>),
    Pending(Receiver<Result<Normalized, NormalizeError>>),
}

impl Ticket {
    const fn ready(id: u64, result: Result<Normalized, NormalizeError>) -> Self {
        Self {
            id,
            state: TicketState::Ready(result),
        }
    }

    /// Request id, distinct per submission on one normalizer.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Block until this request's result is available.
    ///
    /// # Errors
    ///
    /// The pipeline's error, or [`NormalizeError::WorkerUnavailable`] if
    /// the worker dropped the request.
    pub fn wait(self) -> Result<Normalized, NormalizeError> {
        match self.state {
            TicketState::Ready(result) => result,
            TicketState::Pending(reply) => reply.recv().map_err(|_| {
                tracing::warn!(request = self.id, "worker dropped request");
                NormalizeError::WorkerUnavailable(format!(
                    "worker exited before answering request {}",
                    self.id
                ))
            })?,
        }
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ready = matches!(self.state, TicketState::Ready(_));
        f.debug_struct("Ticket")
            .field("id", &self.id)
            .field("ready", &ready)
            .finish()
    }
}

/// Runs the pipeline synchronously inside `submit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineNormalizer;

impl Normalizer for InlineNormalizer {
    fn submit(&self, bytes: Vec<u8>, config: &NormalizeConfig) -> Ticket {
        Ticket::ready(0, crate::normalize(&bytes, config))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Inline
    }
}

struct Job {
    id: u64,
    bytes: Vec<u8>,
    config: NormalizeConfig,
    reply: Sender<Result<Normalized, NormalizeError>>,
}

/// Runs the pipeline on a dedicated worker thread.
///
/// Requests are processed one at a time in submission order; results
/// are delivered to each request's own [`Ticket`]. Dropping the
/// normalizer lets the worker finish queued jobs and joins it.
pub struct OffloadedNormalizer {
    jobs: Option<Sender<Job>>,
    next_id: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl OffloadedNormalizer {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::WorkerUnavailable`] if the OS refuses
    /// to start the thread.
    pub fn spawn() -> Result<Self, NormalizeError> {
        let (jobs, queue) = crossbeam_channel::unbounded::<Job>();
        let worker = std::thread::Builder::new()
            .name("pano-normalize".into())
            .spawn(move || run_worker(&queue))
            .map_err(|err| NormalizeError::WorkerUnavailable(err.to_string()))?;
        Ok(Self {
            jobs: Some(jobs),
            next_id: AtomicU64::new(1),
            worker: Some(worker),
        })
    }
}

fn run_worker(queue: &Receiver<Job>) {
    for job in queue {
        tracing::debug!(request = job.id, bytes = job.bytes.len(), "worker picked up request");
        let result = crate::normalize(&job.bytes, &job.config);
        // The caller may have dropped its ticket.
        let _ = job.reply.send(result);
    }
}

impl Normalizer for OffloadedNormalizer {
    fn submit(&self, bytes: Vec<u8>, config: &NormalizeConfig) -> Ticket {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, result) = crossbeam_channel::bounded(1);
        let job = Job {
            id,
            bytes,
            config: config.clone(),
            reply,
        };
        let sent = self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok());
        if !sent {
            tracing::warn!(request = id, "worker thread is gone");
            return Ticket::ready(
                id,
                Err(NormalizeError::WorkerUnavailable(
                    "worker thread has exited".into(),
                )),
            );
        }
        Ticket {
            id,
            state: TicketState::Pending(result),
        }
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Offload
    }
}

impl fmt::Debug for OffloadedNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffloadedNormalizer")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl Drop for OffloadedNormalizer {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop.
        self.jobs = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("normalization worker panicked");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([1, 2, 3]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn inline_ticket_is_ready() {
        let ticket = InlineNormalizer.submit(png_bytes(20, 10), &NormalizeConfig::default());
        assert!(format!("{ticket:?}").contains("ready: true"));
        assert!(ticket.wait().unwrap().is_panorama());
    }

    #[test]
    fn offloaded_tickets_have_distinct_ids() {
        let offloaded = OffloadedNormalizer::spawn().unwrap();
        let config = NormalizeConfig::default();
        let a = offloaded.submit(png_bytes(20, 10), &config);
        let b = offloaded.submit(png_bytes(42, 20), &config);
        assert_ne!(a.id(), b.id());
        // Results match their own request regardless of wait order.
        let rb = b.wait().unwrap();
        let ra = a.wait().unwrap();
        assert_eq!(ra.analysis.width, 20);
        assert_eq!(rb.analysis.width, 42);
    }

    #[test]
    fn lost_reply_is_worker_unavailable() {
        let (reply, result) = crossbeam_channel::bounded(1);
        drop(reply);
        let ticket = Ticket {
            id: 7,
            state: TicketState::Pending(result),
        };
        let err = ticket.wait().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Worker);
        assert!(err.to_string().contains("request 7"));
    }

    #[test]
    fn submit_after_queue_closed_is_worker_unavailable() {
        let mut offloaded = OffloadedNormalizer::spawn().unwrap();
        offloaded.jobs = None;
        let result = offloaded.normalize(png_bytes(4, 2), &NormalizeConfig::default());
        assert!(matches!(result, Err(NormalizeError::WorkerUnavailable(_))));
    }

    #[test]
    fn selection_honors_offload_flag() {
        let inline = select_normalizer(&NormalizeConfig {
            offload: false,
            ..NormalizeConfig::default()
        });
        assert_eq!(inline.kind(), StrategyKind::Inline);
        let offloaded = select_normalizer(&NormalizeConfig::default());
        assert_eq!(offloaded.kind(), StrategyKind::Offload);
    }

    #[test]
    fn strategy_kind_builds_requested_strategy() {
        let config = NormalizeConfig::default();
        assert_eq!(StrategyKind::Inline.build(&config).unwrap().kind(), StrategyKind::Inline);
        assert_eq!(StrategyKind::Offload.build(&config).unwrap().kind(), StrategyKind::Offload);
        assert_eq!(StrategyKind::Auto.to_string(), "auto");
    }
}
