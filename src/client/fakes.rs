//! Scripted probes for driver tests

use super::{LatencyProbe, TracingProbe};
use crate::{
    error::{AppError, Result},
    models::{Checkpoint, CheckpointRecorder, Endpoint, PhaseTrace, ProbeResult},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

/// What a scripted region does when probed
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// Respond with this status after this many milliseconds
    Status(u16, u64),
    Transport(&'static str),
    Malformed,
}

/// Probe that answers from a per-region script. Unscripted regions answer
/// 200 after 20ms.
#[derive(Default)]
pub(crate) struct ScriptedProbe {
    outcomes: HashMap<String, Outcome>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, code: &str, outcome: Outcome) -> Self {
        self.outcomes.insert(code.to_string(), outcome);
        self
    }

    /// Real time each probe takes, to let concurrent calls overlap
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run(&self, endpoint: &Endpoint) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.outcomes
            .get(&endpoint.code)
            .cloned()
            .unwrap_or(Outcome::Status(200, 20))
    }
}

fn scripted_error(outcome: &Outcome, endpoint: &Endpoint) -> AppError {
    match outcome {
        Outcome::Transport(message) => AppError::transport(*message),
        _ => AppError::request_construction(format!("Invalid URL '{}'", endpoint.address)),
    }
}

#[async_trait]
impl LatencyProbe for ScriptedProbe {
    async fn measure(&self, endpoint: &Endpoint) -> Result<ProbeResult> {
        match self.run(endpoint).await {
            Outcome::Status(200, ms) => Ok(ProbeResult::success(endpoint.clone(), Duration::from_millis(ms))),
            Outcome::Status(status, ms) => Ok(ProbeResult::bad_status(
                endpoint.clone(),
                status,
                Duration::from_millis(ms),
            )),
            other => Err(scripted_error(&other, endpoint)),
        }
    }
}

#[async_trait]
impl TracingProbe for ScriptedProbe {
    async fn trace(&self, endpoint: &Endpoint) -> Result<PhaseTrace> {
        let ms = match self.run(endpoint).await {
            Outcome::Status(_, ms) => ms,
            other => return Err(scripted_error(&other, endpoint)),
        };

        let base = Instant::now();
        let mut recorder = CheckpointRecorder::new();
        recorder.record(Checkpoint::DnsStart, base);
        recorder.record(Checkpoint::DnsDone, base + Duration::from_millis(1));
        recorder.record(Checkpoint::ConnectStart, base + Duration::from_millis(1));
        recorder.record(Checkpoint::ConnectDone, base + Duration::from_millis(3));
        recorder.record(Checkpoint::FirstByte, base + Duration::from_millis(3 + ms));
        recorder.record(Checkpoint::ResponseComplete, base + Duration::from_millis(4 + ms));
        recorder.finish()
    }
}
