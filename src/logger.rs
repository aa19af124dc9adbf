use std::sync::{Mutex, Once};

/// A single logged field's value, tagged by type so one log sink can carry
/// heterogeneous per-frame counters and timings without per-type dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum LogValue {
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Str(String),
}

/// One structured log entry: a frame label plus its `(field, value)` pairs,
/// mirroring the per-frame instrumentation record the teacher's profiling
/// crate marks with `frame_mark`, but queryable in-process rather than sent
/// only to an external profiler.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    pub frame: &'static str,
    pub fields: Vec<(&'static str, LogValue)>,
}

impl FrameRecord {
    pub fn new(frame: &'static str) -> Self {
        Self {
            frame,
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, field: &'static str, value: LogValue) -> Self {
        self.fields.push((field, value));
        self
    }
}

static LOGGER_FAILURE_WARNED: Once = Once::new();

/// Bounded ring buffer of the most recent [`FrameRecord`]s, paired with a
/// `tracing` event emitted for each append.
///
/// No backpressure: once `capacity` is reached, the oldest record is
/// silently dropped to make room for the newest. A poisoned lock (only
/// possible after a prior panic while holding it) is treated the same way —
/// the write is swallowed and a single `tracing::warn!` covers the whole
/// process, never one warning per frame.
pub struct FusionLogger {
    enabled: bool,
    capacity: usize,
    records: Mutex<Vec<FrameRecord>>,
}

impl FusionLogger {
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity: capacity.max(1),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn log_frame(&self, record: FrameRecord) {
        if !self.enabled {
            return;
        }
        tracing::info!(frame = record.frame, fields = ?record.fields, "fusion frame");
        match self.records.lock() {
            Ok(mut records) => {
                if records.len() >= self.capacity {
                    records.remove(0);
                }
                records.push(record);
            }
            Err(_) => {
                LOGGER_FAILURE_WARNED.call_once(|| {
                    tracing::warn!("fusion logger ring buffer is poisoned; further records are dropped");
                });
            }
        }
    }

    /// The most recently appended record, if any.
    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.records.lock().ok()?.last().cloned()
    }

    pub fn frames(&self) -> Vec<FrameRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}
