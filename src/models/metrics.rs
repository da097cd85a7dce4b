//! Probe results, lifecycle checkpoints and phase breakdowns

use crate::{
    error::{AppError, Result},
    models::endpoint::Endpoint,
    types::Tier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Outcome of a single round-trip latency probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Endpoint that was probed
    pub endpoint: Endpoint,

    /// True only for an HTTP 200 response
    pub success: bool,

    /// HTTP status code, when a response arrived
    pub status_code: Option<u16>,

    /// Diagnostic detail for a failed probe
    pub error: Option<String>,

    /// Wall time from just before dispatch until the status line arrived
    pub latency: Duration,

    /// When the probe was executed
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    /// Create a result for a 200 response
    pub fn success(endpoint: Endpoint, latency: Duration) -> Self {
        Self {
            endpoint,
            success: true,
            status_code: Some(200),
            error: None,
            latency,
            timestamp: Utc::now(),
        }
    }

    /// Create a result for a response with any other status
    pub fn bad_status(endpoint: Endpoint, status_code: u16, latency: Duration) -> Self {
        Self {
            endpoint,
            success: false,
            status_code: Some(status_code),
            error: Some(AppError::protocol(status_code).to_string()),
            latency,
            timestamp: Utc::now(),
        }
    }

    /// Create a result for a transport failure reported inline
    pub fn transport_failure(endpoint: Endpoint, error: &AppError, latency: Duration) -> Self {
        Self {
            endpoint,
            success: false,
            status_code: None,
            error: Some(error.to_string()),
            latency,
            timestamp: Utc::now(),
        }
    }

    /// Tier of a successful probe; failures are never classified
    pub fn tier(&self) -> Option<Tier> {
        self.success.then(|| Tier::classify(self.latency))
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// Ordered lifecycle instants of one instrumented exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Checkpoint {
    DnsStart,
    DnsDone,
    ConnectStart,
    ConnectDone,
    TlsStart,
    TlsDone,
    WroteRequest,
    FirstByte,
    ResponseComplete,
}

impl Checkpoint {
    pub const COUNT: usize = 9;

    /// Causal order of the sequence
    pub const ALL: [Checkpoint; Checkpoint::COUNT] = [
        Checkpoint::DnsStart,
        Checkpoint::DnsDone,
        Checkpoint::ConnectStart,
        Checkpoint::ConnectDone,
        Checkpoint::TlsStart,
        Checkpoint::TlsDone,
        Checkpoint::WroteRequest,
        Checkpoint::FirstByte,
        Checkpoint::ResponseComplete,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Checkpoint::DnsStart => "dns_start",
            Checkpoint::DnsDone => "dns_done",
            Checkpoint::ConnectStart => "connect_start",
            Checkpoint::ConnectDone => "connect_done",
            Checkpoint::TlsStart => "tls_start",
            Checkpoint::TlsDone => "tls_done",
            Checkpoint::WroteRequest => "wrote_request",
            Checkpoint::FirstByte => "first_byte",
            Checkpoint::ResponseComplete => "response_complete",
        }
    }
}

/// Records checkpoint instants for a single exchange.
///
/// Each kind is stamped the first time it fires. Recording a kind backfills
/// every earlier kind that never fired with the latest instant recorded so
/// far (or with the new instant when nothing fired yet), so a skipped phase
/// collapses to zero length. Stamps never move backwards: an instant earlier
/// than the latest recorded one is clamped up to it.
#[derive(Debug, Clone, Default)]
pub struct CheckpointRecorder {
    instants: [Option<Instant>; Checkpoint::COUNT],
    fired: [bool; Checkpoint::COUNT],
}

impl CheckpointRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `kind` at `at`. Returns false when the slot was already filled,
    /// either by an earlier firing or by backfill.
    pub fn record(&mut self, kind: Checkpoint, at: Instant) -> bool {
        let idx = kind.index();
        if self.instants[idx].is_some() {
            return false;
        }

        let floor = self.instants[..idx].iter().rev().find_map(|slot| *slot);
        let stamp = match floor {
            Some(floor) if at < floor => floor,
            _ => at,
        };
        let fill = floor.unwrap_or(stamp);

        for slot in self.instants[..idx].iter_mut().filter(|slot| slot.is_none()) {
            *slot = Some(fill);
        }
        self.instants[idx] = Some(stamp);
        self.fired[idx] = true;
        true
    }

    /// Stamp `kind` with the current instant
    pub fn record_now(&mut self, kind: Checkpoint) -> bool {
        self.record(kind, Instant::now())
    }

    /// Recorded or backfilled instant for `kind`
    pub fn get(&self, kind: Checkpoint) -> Option<Instant> {
        self.instants[kind.index()]
    }

    /// Whether `kind` actually fired, as opposed to being backfilled
    pub fn fired(&self, kind: Checkpoint) -> bool {
        self.fired[kind.index()]
    }

    /// Finalize the sequence and derive the phase breakdown.
    ///
    /// Trailing checkpoints that never fired collapse onto the last one that
    /// did. Fails only when nothing was recorded at all.
    pub fn finish(self) -> Result<PhaseTrace> {
        let last = self
            .instants
            .iter()
            .rev()
            .find_map(|slot| *slot)
            .ok_or_else(|| AppError::internal("no checkpoints were recorded for the exchange"))?;

        let mut instants = [last; Checkpoint::COUNT];
        for (out, slot) in instants.iter_mut().zip(self.instants.iter()) {
            if let Some(instant) = slot {
                *out = *instant;
            }
        }

        Ok(PhaseTrace::from_instants(&instants, self.fired[Checkpoint::TlsDone.index()]))
    }
}

/// Phase-by-phase breakdown of one HTTP(S) exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTrace {
    pub dns_lookup: Duration,
    pub tcp_connection: Duration,
    pub tls_handshake: Duration,
    pub server_processing: Duration,
    pub content_transfer: Duration,

    /// Cumulative from the origin (first checkpoint of the exchange)
    pub name_lookup: Duration,
    pub connect: Duration,
    pub pre_transfer: Duration,
    pub start_transfer: Duration,
    pub total: Duration,

    /// Whether a TLS handshake took place
    pub tls: bool,
}

impl PhaseTrace {
    /// Derive durations from a complete, causally ordered checkpoint sequence
    pub fn from_instants(instants: &[Instant; Checkpoint::COUNT], tls: bool) -> Self {
        let at = |kind: Checkpoint| instants[kind.index()];
        let between = |from: Checkpoint, to: Checkpoint| at(to).saturating_duration_since(at(from));

        // Without a handshake, TlsDone collapsed onto ConnectDone
        let transfer_ready = if tls { Checkpoint::TlsDone } else { Checkpoint::ConnectDone };
        let origin = Checkpoint::DnsStart;

        Self {
            dns_lookup: between(Checkpoint::DnsStart, Checkpoint::DnsDone),
            tcp_connection: between(Checkpoint::ConnectStart, Checkpoint::ConnectDone),
            tls_handshake: between(Checkpoint::TlsStart, Checkpoint::TlsDone),
            server_processing: between(transfer_ready, Checkpoint::FirstByte),
            content_transfer: between(Checkpoint::FirstByte, Checkpoint::ResponseComplete),
            name_lookup: between(origin, Checkpoint::DnsDone),
            connect: between(origin, Checkpoint::ConnectDone),
            pre_transfer: between(origin, transfer_ready),
            start_transfer: between(origin, Checkpoint::FirstByte),
            total: between(origin, Checkpoint::ResponseComplete),
            tls,
        }
    }

    /// The five phase durations, top bar order
    pub fn phases(&self) -> [Duration; 5] {
        [
            self.dns_lookup,
            self.tcp_connection,
            self.tls_handshake,
            self.server_processing,
            self.content_transfer,
        ]
    }

    /// The five cumulative markers, top to bottom
    pub fn markers(&self) -> [Duration; 5] {
        [
            self.name_lookup,
            self.connect,
            self.pre_transfer,
            self.start_transfer,
            self.total,
        ]
    }
}
