//! Background mix job execution.
//!
//! A mix job takes a pending mix through its whole lifecycle: mark it
//! processing, fetch and analyze every track on a bounded worker pool,
//! assemble the crossfaded mix, export it, and terminate the mix record in
//! `completed` or `failed`. Jobs are processed serially by one background
//! thread, which makes that thread the single writer for each mix identity.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::analysis;
use crate::audio::{decode_file, write_wav, AudioSignal};
use crate::config::AutodjConfig;
use crate::error::{AutodjError, Result};
use crate::fetch::TrackSource;
use crate::mixer::assembler;
use crate::store::{MixRegistry, TrackRegistry};
use crate::types::{Track, TrackAnalysis};

/// Maximum number of jobs waiting in the runner.
pub const MAX_PENDING_JOBS: usize = 8;

/// A unit of background work: one mix plus its candidate tracks.
#[derive(Debug)]
pub struct MixJob {
    /// Identity of the mix this job owns.
    pub mix_id: String,
    /// Candidate tracks, in request order.
    pub tracks: Vec<Track>,
}

impl MixJob {
    /// Creates a job for the given mix and tracks.
    pub fn new(mix_id: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            mix_id: mix_id.into(),
            tracks,
        }
    }
}

/// Terminal outcome of a mix job.
#[derive(Debug)]
pub enum MixJobResult {
    /// The mix was exported and its record completed.
    Completed {
        mix_id: String,
        file_path: PathBuf,
        duration_sec: f32,
        contributing: usize,
        skipped: usize,
    },
    /// The mix could not be exported; its record is failed.
    Failed { mix_id: String, error: String },
}

impl MixJobResult {
    /// Returns the mix identity this result belongs to.
    pub fn mix_id(&self) -> &str {
        match self {
            MixJobResult::Completed { mix_id, .. } => mix_id,
            MixJobResult::Failed { mix_id, .. } => mix_id,
        }
    }

    /// Returns true for a completed result.
    pub fn is_completed(&self) -> bool {
        matches!(self, MixJobResult::Completed { .. })
    }
}

/// Analyzes a decoded track signal: duration, envelope, highlights.
///
/// An extraction error (empty signal) leaves the track unanalyzed; that is
/// degradation, not failure, and the assembler's fallback policy covers it.
pub fn analyze_track(track: &mut Track, signal: &AudioSignal, config: &AutodjConfig) {
    let duration = signal.duration_sec();
    track.duration_sec = Some(duration);

    match analysis::extract(signal, config.frame_length, config.hop_length) {
        Ok(envelope) => {
            let highlights = analysis::detect(&envelope, duration);
            track.analysis = TrackAnalysis::Analyzed {
                envelope,
                highlights,
            };
        }
        Err(e) => {
            warn!("analysis degraded for track {}: {}", track.track_id, e);
        }
    }
}

/// Fetches, decodes, and analyzes tracks on a bounded worker pool.
///
/// Workers drain a shared queue, so at most `config.workers` tracks are in
/// flight at once. A fetch or decode failure leaves the affected track
/// unanalyzed (and without a usable local path) but never stops the batch.
/// The returned order is unspecified; the assembler re-ranks by intensity.
pub fn process_tracks(
    tracks: Vec<Track>,
    source: &dyn TrackSource,
    config: &AutodjConfig,
) -> Vec<Track> {
    if tracks.is_empty() {
        return Vec::new();
    }

    let work_dir = config.effective_work_dir();
    let workers = config.workers.min(tracks.len()).max(1);

    let queue: Mutex<VecDeque<Track>> = Mutex::new(tracks.into());
    let done: Mutex<Vec<Track>> = Mutex::new(Vec::new());

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let next = queue.lock().unwrap().pop_front();
                let Some(mut track) = next else { break };
                process_one(&mut track, source, config, &work_dir);
                done.lock().unwrap().push(track);
            });
        }
    });

    done.into_inner().unwrap()
}

/// Fetch + decode + analyze for a single track.
fn process_one(
    track: &mut Track,
    source: &dyn TrackSource,
    config: &AutodjConfig,
    work_dir: &std::path::Path,
) {
    match source.fetch(track, work_dir) {
        Ok(path) => track.local_path = Some(path),
        Err(e) => {
            warn!("track {} not retrieved: {}", track.track_id, e);
            return;
        }
    }

    let path = track.local_path.as_ref().unwrap();
    let signal = match decode_file(path) {
        Ok(signal) => signal,
        Err(e) => {
            warn!("track {} not decodable: {}", track.track_id, e);
            return;
        }
    };

    analyze_track(track, &signal, config);
}

/// Runs one mix job to its terminal state.
///
/// The registry records are updated as the job progresses; the returned
/// result mirrors the terminal registry state.
pub fn run_mix_job(
    job: MixJob,
    mixes: &MixRegistry,
    tracks: &TrackRegistry,
    source: &dyn TrackSource,
    config: &AutodjConfig,
) -> MixJobResult {
    let mix_id = job.mix_id.clone();

    if !mixes.mark_processing(&mix_id) {
        warn!("mix {} is not pending; refusing to run", mix_id);
        return MixJobResult::Failed {
            mix_id,
            error: "mix is not pending".to_string(),
        };
    }

    info!("mix {}: processing {} tracks", mix_id, job.tracks.len());

    let processed = process_tracks(job.tracks, source, config);
    for track in &processed {
        tracks.insert(track.clone());
    }

    let output = assembler::assemble(&processed);

    let mix_dir = config.effective_mix_dir();
    let export = fs::create_dir_all(&mix_dir)
        .map_err(|e| {
            AutodjError::export_failed(format!(
                "failed to create mix directory {}: {}",
                mix_dir.display(),
                e
            ))
        })
        .and_then(|_| {
            let path = mix_dir.join(format!("{}.wav", mix_id));
            write_wav(&output.samples, &path, output.sample_rate).map(|_| path)
        });

    match export {
        Ok(path) => {
            let duration_sec = output.duration_sec();
            mixes.complete(&mix_id, path.clone(), duration_sec);
            info!(
                "mix {} completed: {:.1}s, {} tracks contributing",
                mix_id, duration_sec, output.contributing
            );
            MixJobResult::Completed {
                mix_id,
                file_path: path,
                duration_sec,
                contributing: output.contributing,
                skipped: output.skipped.len(),
            }
        }
        Err(e) => {
            mixes.fail(&mix_id);
            warn!("mix {} failed: {}", mix_id, e);
            MixJobResult::Failed {
                mix_id,
                error: e.to_string(),
            }
        }
    }
}

/// Message sent to the job processor thread.
enum RunnerMessage {
    /// A new job to process.
    Job(Box<MixJob>),
    /// Request to shut down the processor.
    Shutdown,
}

/// Serial background processor for mix jobs.
///
/// Submitting returns immediately; the caller observes progress through
/// the mix registry or by receiving [`MixJobResult`]s. One processor
/// thread handles jobs in order, so no two jobs ever write the same mix
/// concurrently.
pub struct MixJobRunner {
    /// Channel to send jobs to the processor.
    sender: Sender<RunnerMessage>,
    /// Handle to the processor thread.
    thread_handle: Option<JoinHandle<()>>,
    /// Channel to receive job results.
    result_receiver: Receiver<MixJobResult>,
    /// Jobs submitted but not yet finished.
    pending: Arc<AtomicUsize>,
}

impl MixJobRunner {
    /// Creates a runner and starts its background thread.
    pub fn new(
        mixes: MixRegistry,
        tracks: TrackRegistry,
        source: Arc<dyn TrackSource>,
        config: AutodjConfig,
    ) -> Self {
        let (job_sender, job_receiver) = mpsc::channel::<RunnerMessage>();
        let (result_sender, result_receiver) = mpsc::channel::<MixJobResult>();
        let pending = Arc::new(AtomicUsize::new(0));
        let pending_clone = Arc::clone(&pending);

        let thread_handle = thread::spawn(move || {
            Self::processor_loop(
                job_receiver,
                result_sender,
                pending_clone,
                mixes,
                tracks,
                source,
                config,
            );
        });

        Self {
            sender: job_sender,
            thread_handle: Some(thread_handle),
            result_receiver,
            pending,
        }
    }

    /// Submits a job for background processing.
    ///
    /// Returns an error if the runner is saturated or shut down.
    pub fn submit(&self, job: MixJob) -> Result<()> {
        if self.pending.load(Ordering::SeqCst) >= MAX_PENDING_JOBS {
            return Err(AutodjError::queue_full(MAX_PENDING_JOBS));
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.sender
            .send(RunnerMessage::Job(Box::new(job)))
            .map_err(|_| {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                AutodjError::invalid_request("job runner is shut down")
            })
    }

    /// Returns the number of submitted jobs not yet finished.
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Blocks until the next job result is available.
    ///
    /// Returns None once the runner is shut down.
    pub fn recv_result(&self) -> Option<MixJobResult> {
        self.result_receiver.recv().ok()
    }

    /// Tries to receive a job result without blocking.
    pub fn try_recv_result(&self) -> Option<MixJobResult> {
        self.result_receiver.try_recv().ok()
    }

    /// Shuts down the processor after the current job.
    pub fn shutdown(&mut self) {
        self.sender.send(RunnerMessage::Shutdown).ok();
        if let Some(handle) = self.thread_handle.take() {
            handle.join().ok();
        }
    }

    /// The main processing loop running in the background thread.
    fn processor_loop(
        receiver: Receiver<RunnerMessage>,
        result_sender: Sender<MixJobResult>,
        pending: Arc<AtomicUsize>,
        mixes: MixRegistry,
        tracks: TrackRegistry,
        source: Arc<dyn TrackSource>,
        config: AutodjConfig,
    ) {
        loop {
            match receiver.recv() {
                Ok(RunnerMessage::Job(job)) => {
                    let result = run_mix_job(*job, &mixes, &tracks, source.as_ref(), &config);
                    pending.fetch_sub(1, Ordering::SeqCst);
                    result_sender.send(result).ok();
                }
                Ok(RunnerMessage::Shutdown) | Err(_) => break,
            }
        }
    }
}

impl Drop for MixJobRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
