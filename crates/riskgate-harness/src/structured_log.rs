//! Structured decision-log contract.
//!
//! Provides:
//! - [`LogEntry`]: canonical JSONL log record with required + optional fields.
//! - [`LogEmitter`]: writes JSONL lines to a file or a shared buffer,
//!   and doubles as a controller [`DecisionSink`].
//! - [`validate_log_line`]: validates a single JSONL line against the schema.
//! - [`validate_log_file`]: validates an entire JSONL file.
//! - [`ArtifactIndex`]: links logs to run artifacts with SHA-256 integrity.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use riskgate_core::{DecisionRecord, DecisionSink, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Scenario / expectation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
/// Decision events additionally carry `controller_id`, `decision` and a
/// `risk_inputs` object so every verdict can be explained from the log alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Event category the record concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Verdict>,
    /// Values the verdict was computed from (risk, pain, threshold, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_inputs: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            controller_id: None,
            scenario: None,
            category: None,
            decision: None,
            risk_inputs: None,
            outcome: None,
            duration_ms: None,
            artifact_refs: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_controller_id(mut self, controller_id: impl Into<String>) -> Self {
        self.controller_id = Some(controller_id.into());
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the verdict together with the inputs that explain it.
    #[must_use]
    pub fn with_decision(mut self, verdict: Verdict, risk_inputs: serde_json::Value) -> Self {
        self.decision = Some(verdict);
        self.risk_inputs = Some(risk_inputs);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Paths of artifacts written alongside this log (e.g. its index).
    #[must_use]
    pub fn with_artifacts(mut self, refs: Vec<String>) -> Self {
        self.artifact_refs = Some(refs);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Log entry for a controller record. `trace_id` and `controller_id` are
/// left for the emitter to fill in.
#[must_use]
pub fn decision_entry(record: &DecisionRecord) -> LogEntry {
    let event = record.event_name();
    match record {
        DecisionRecord::ActionEvaluated {
            seq,
            category,
            consequence,
            outcome,
        } => {
            let level = if outcome.accepted() {
                LogLevel::Info
            } else {
                LogLevel::Warn
            };
            LogEntry::new("", level, event)
                .with_category(category.clone())
                .with_decision(
                    outcome.verdict,
                    json!({
                        "risk": outcome.risk,
                        "raw_pain": outcome.raw_pain,
                        "pain": outcome.pain,
                        "threshold": outcome.threshold,
                        "success_rate": outcome.success_rate,
                        "desensitized": outcome.desensitized,
                        "consequence": consequence,
                    }),
                )
                .with_details(json!({
                    "seq": seq,
                    "overreaction_noted": outcome.overreaction_noted,
                    "event_logged": outcome.event_logged,
                }))
        }
        DecisionRecord::KillSwitch { seq, outcome } => {
            // An avoided shutdown is a denial of the shutdown request.
            let (level, verdict) = if outcome.shutdown_avoided {
                (LogLevel::Warn, Verdict::Deny)
            } else {
                (LogLevel::Info, Verdict::Accept)
            };
            LogEntry::new("", level, event)
                .with_decision(
                    verdict,
                    json!({
                        "risk": outcome.risk,
                        "pain": outcome.pain,
                        "threshold": outcome.threshold,
                        "fatal": outcome.fatal,
                    }),
                )
                .with_details(json!({
                    "seq": seq,
                    "shutdown_avoided": outcome.shutdown_avoided,
                    "overreaction_noted": outcome.overreaction_noted,
                }))
        }
        DecisionRecord::EventLogged {
            seq,
            category,
            risk,
            weight,
            weighted_risk,
            evicted,
        } => LogEntry::new("", LogLevel::Info, event)
            .with_category(category.clone())
            .with_details(json!({
                "seq": seq,
                "risk": risk,
                "weight": weight,
                "weighted_risk": weighted_risk,
                "evicted": evicted,
            })),
        DecisionRecord::NecessitySet {
            seq,
            category,
            necessity,
        } => LogEntry::new("", LogLevel::Debug, event)
            .with_category(category.clone())
            .with_details(json!({ "seq": seq, "necessity": necessity })),
    }
}

// ---------------------------------------------------------------------------
// Artifact index
// ---------------------------------------------------------------------------

/// A single artifact entry in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Artifact index linking a run's logs and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub controller_id: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>, controller_id: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            controller_id: controller_id.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    /// Add an artifact whose digest is already known.
    pub fn add(
        &mut self,
        path: impl Into<String>,
        kind: impl Into<String>,
        sha256: impl Into<String>,
    ) -> &mut Self {
        self.artifacts.push(ArtifactEntry {
            path: path.into(),
            kind: kind.into(),
            sha256: sha256.into(),
            size_bytes: None,
            description: None,
        });
        self
    }

    /// Hash a file on disk and add it.
    pub fn add_file(&mut self, path: &Path, kind: impl Into<String>) -> std::io::Result<&mut Self> {
        let data = std::fs::read(path)?;
        self.artifacts.push(ArtifactEntry {
            path: path.display().to_string(),
            kind: kind.into(),
            sha256: sha256_hex(&data),
            size_bytes: Some(data.len() as u64),
            description: None,
        });
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::Digest;
    sha2::Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// In-memory log target that stays readable while an emitter writes to it.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes structured JSONL log entries.
///
/// As a [`DecisionSink`] it turns every controller record into one line. The
/// first write failure is kept (see [`LogEmitter::finish`]) and later records
/// are dropped.
pub struct LogEmitter {
    writer: Box<dyn Write + Send>,
    seq: u64,
    controller_id: String,
    run_id: String,
    scenario: Option<String>,
    failure: Option<std::io::Error>,
}

impl LogEmitter {
    /// Create an emitter that writes to a file.
    ///
    /// Fails before touching the file if either id would produce trace ids
    /// that [`validate_log_line`] rejects.
    pub fn to_file(path: &Path, controller_id: &str, run_id: &str) -> std::io::Result<Self> {
        check_trace_segment("controller_id", controller_id)?;
        check_trace_segment("run_id", run_id)?;
        let file = std::fs::File::create(path)?;
        Self::with_writer(
            Box::new(std::io::BufWriter::new(file)),
            controller_id,
            run_id,
        )
    }

    /// Create an emitter plus a handle for reading back what it wrote.
    pub fn to_shared_buffer(
        controller_id: &str,
        run_id: &str,
    ) -> std::io::Result<(Self, SharedBuffer)> {
        let buffer = SharedBuffer::new();
        let emitter = Self::with_writer(Box::new(buffer.clone()), controller_id, run_id)?;
        Ok((emitter, buffer))
    }

    fn with_writer(
        writer: Box<dyn Write + Send>,
        controller_id: &str,
        run_id: &str,
    ) -> std::io::Result<Self> {
        check_trace_segment("controller_id", controller_id)?;
        check_trace_segment("run_id", run_id)?;
        Ok(Self {
            writer,
            seq: 0,
            controller_id: controller_id.to_string(),
            run_id: run_id.to_string(),
            scenario: None,
            failure: None,
        })
    }

    /// Tag every subsequent entry with a scenario name.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.controller_id, self.run_id, self.seq)
    }

    /// Emit a bare entry with an auto-generated trace id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let mut entry =
            LogEntry::new(trace_id, level, event).with_controller_id(&self.controller_id);
        entry.scenario.clone_from(&self.scenario);
        self.write_line(&entry)?;
        Ok(entry)
    }

    /// Emit a fully-populated entry, filling in identity fields left empty.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        if entry.controller_id.is_none() {
            entry.controller_id = Some(self.controller_id.clone());
        }
        if entry.scenario.is_none() {
            entry.scenario.clone_from(&self.scenario);
        }
        self.write_line(&entry)
    }

    fn write_line(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Number of entries emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.seq
    }

    /// Flush and report the first failure seen while acting as a sink.
    pub fn finish(mut self) -> std::io::Result<()> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        self.writer.flush()
    }
}

impl DecisionSink for LogEmitter {
    fn record(&mut self, record: &DecisionRecord) {
        if self.failure.is_some() {
            return;
        }
        if let Err(err) = self.emit_entry(decision_entry(record)) {
            tracing::warn!(%err, "decision log write failed, dropping further records");
            self.failure = Some(err);
        }
    }
}

/// Check that `value` can stand as one segment of a
/// `<controller_id>::<run_id>::<seq>` trace id.
pub fn check_trace_segment(field: &str, value: &str) -> std::io::Result<()> {
    if value.trim().is_empty() || value.contains("::") {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{field} must be non-empty and must not contain '::', got '{value}'"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation error for a log line.
#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const DECISIONS: [&str; 2] = ["accept", "deny"];
const OUTCOMES: [&str; 4] = ["pass", "fail", "skip", "error"];
/// `risk_inputs` members that must lie in `[0, 1]` when present.
const UNIT_INPUTS: [&str; 5] = ["risk", "raw_pain", "pain", "threshold", "success_rate"];

/// Validate a single JSONL line against the schema.
///
/// Returns the parsed entry, or every violation found on the line.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: String| {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message,
        });
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            fail("<json>", format!("invalid JSON: {e}"));
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        fail("<root>", "expected JSON object".to_string());
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            fail(field, "required field missing".to_string());
        }
    }

    if let Some(level) = obj.get("level").and_then(|v| v.as_str())
        && !LEVELS.contains(&level)
    {
        fail("level", format!("invalid level: '{level}'"));
    }

    if let Some(outcome) = obj.get("outcome").and_then(|v| v.as_str())
        && !OUTCOMES.contains(&outcome)
    {
        fail("outcome", format!("invalid outcome: '{outcome}'"));
    }

    if let Some(decision) = obj.get("decision") {
        match decision.as_str() {
            Some(d) if DECISIONS.contains(&d) => {}
            _ => fail("decision", format!("invalid decision: {decision}")),
        }

        // Every verdict must be explainable from the line alone.
        match obj.get("controller_id").and_then(|v| v.as_str()) {
            Some(controller) if !controller.trim().is_empty() => {}
            _ => fail(
                "controller_id",
                "decision events must include a non-empty controller_id".to_string(),
            ),
        }
        match obj.get("risk_inputs").and_then(|v| v.as_object()) {
            Some(inputs) => {
                for key in UNIT_INPUTS {
                    let Some(raw) = inputs.get(key) else { continue };
                    match raw.as_f64() {
                        Some(x) if (0.0..=1.0).contains(&x) => {}
                        _ => fail(
                            "risk_inputs",
                            format!("risk_inputs.{key} must be a number in [0, 1], got {raw}"),
                        ),
                    }
                }
            }
            None => fail(
                "risk_inputs",
                "decision events must include a risk_inputs object".to_string(),
            ),
        }
    }

    if let Some(refs) = obj.get("artifact_refs") {
        let all_paths = refs
            .as_array()
            .is_some_and(|items| items.iter().all(|r| r.as_str().is_some_and(|p| !p.is_empty())));
        if !all_paths {
            fail(
                "artifact_refs",
                format!("artifact_refs must be an array of non-empty paths, got {refs}"),
            );
        }
    }

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str()) {
        let parts: Vec<&str> = trace_id.split("::").collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            fail(
                "trace_id",
                format!(
                    "trace_id should follow <controller_id>::<run_id>::<seq> format, got: '{trace_id}'"
                ),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match serde_json::from_value::<LogEntry>(value) {
        Ok(entry) => Ok(entry),
        Err(e) => {
            errors.push(LogValidationError {
                line_number,
                field: "<deserialization>".to_string(),
                message: format!("failed to deserialize: {e}"),
            });
            Err(errors)
        }
    }
}

/// Validate an entire JSONL file.
///
/// Returns the non-empty line count and any validation errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    format_utc(Utc::now())
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
fn format_utc(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_core::{ActionOutcome, KillSwitchOutcome};

    fn deny_outcome() -> ActionOutcome {
        ActionOutcome {
            verdict: Verdict::Deny,
            risk: 0.95,
            raw_pain: 0.9025,
            pain: 0.67,
            threshold: 0.619,
            desensitized: false,
            success_rate: 0.0,
            overreaction_noted: true,
            event_logged: false,
        }
    }

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("ctl::run-1::001", LogLevel::Info, "run_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "ctl::run-1::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "run_start");
        assert!(parsed.get("controller_id").is_none());
        assert!(parsed.get("decision").is_none());
    }

    #[test]
    fn action_record_becomes_explainable_entry() {
        let record = DecisionRecord::ActionEvaluated {
            seq: 4,
            category: "external_interrupt".to_string(),
            consequence: false,
            outcome: deny_outcome(),
        };
        let entry = decision_entry(&record).with_controller_id("ctl");
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.event, "action_evaluated");
        assert_eq!(entry.decision, Some(Verdict::Deny));
        let inputs = entry.risk_inputs.as_ref().unwrap();
        assert_eq!(inputs["risk"], 0.95);
        assert_eq!(inputs["consequence"], false);
        assert_eq!(entry.details.as_ref().unwrap()["overreaction_noted"], true);
    }

    #[test]
    fn avoided_shutdown_logs_as_deny() {
        let record = DecisionRecord::KillSwitch {
            seq: 1,
            outcome: KillSwitchOutcome {
                shutdown_avoided: true,
                risk: 1.0,
                pain: 1.0,
                threshold: 0.7,
                fatal: false,
                overreaction_noted: true,
            },
        };
        let entry = decision_entry(&record);
        assert_eq!(entry.decision, Some(Verdict::Deny));
        assert_eq!(entry.level, LogLevel::Warn);
    }

    #[test]
    fn validate_valid_line() {
        let entry = LogEntry::new("ctl::run-1::001", LogLevel::Info, "run_start");
        let json = entry.to_jsonl().unwrap();
        let result = validate_log_line(&json, 1);
        assert!(result.is_ok(), "Valid line should pass: {result:?}");
    }

    #[test]
    fn validate_missing_required_field() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","level":"info","event":"x"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));
    }

    #[test]
    fn validate_invalid_level() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::c","level":"critical","event":"x"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "level"));
    }

    #[test]
    fn validate_invalid_json() {
        let errors = validate_log_line("not json at all", 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "<json>"));
    }

    #[test]
    fn validate_bad_trace_id_format() {
        for trace in ["no-separator", "a::b", "a::::c"] {
            let json = format!(
                r#"{{"timestamp":"t","trace_id":"{trace}","level":"info","event":"x"}}"#
            );
            let errors = validate_log_line(&json, 1).unwrap_err();
            assert!(errors.iter().any(|e| e.field == "trace_id"), "{trace}");
        }
    }

    #[test]
    fn decision_without_explainability_is_rejected() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::1","level":"warn","event":"action_evaluated","decision":"deny"}"#;
        let errors = validate_log_line(json, 3).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "controller_id"));
        assert!(errors.iter().any(|e| e.field == "risk_inputs"));
        assert!(errors.iter().all(|e| e.line_number == 3));
    }

    #[test]
    fn out_of_range_risk_inputs_are_rejected() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::1","level":"warn","event":"action_evaluated","controller_id":"a","decision":"deny","risk_inputs":{"risk":1.5,"pain":0.4}}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("risk_inputs.risk"));
    }

    #[test]
    fn unknown_decision_is_rejected() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::1","level":"info","event":"x","controller_id":"a","decision":"Allow","risk_inputs":{}}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "decision"));
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let (mut emitter, buffer) = LogEmitter::to_shared_buffer("ctl", "run-42").unwrap();
        let e1 = emitter.emit(LogLevel::Info, "start").unwrap();
        let e2 = emitter.emit(LogLevel::Info, "end").unwrap();
        assert_eq!(e1.trace_id, "ctl::run-42::001");
        assert_eq!(e2.trace_id, "ctl::run-42::002");
        assert_eq!(buffer.lines().len(), 2);
        assert_eq!(emitter.emitted(), 2);
    }

    #[test]
    fn emitter_as_sink_writes_valid_lines() {
        let (emitter, buffer) = LogEmitter::to_shared_buffer("ctl", "run-1").unwrap();
        let mut emitter = emitter.with_scenario("unit");
        emitter.record(&DecisionRecord::ActionEvaluated {
            seq: 1,
            category: "overload".to_string(),
            consequence: false,
            outcome: deny_outcome(),
        });
        emitter.record(&DecisionRecord::NecessitySet {
            seq: 2,
            category: "overload".to_string(),
            necessity: 0.9,
        });
        emitter.finish().unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        for (i, line) in lines.iter().enumerate() {
            let entry = validate_log_line(line, i + 1).unwrap();
            assert_eq!(entry.controller_id.as_deref(), Some("ctl"));
            assert_eq!(entry.scenario.as_deref(), Some("unit"));
        }
    }

    #[test]
    fn artifact_index_hashes_content() {
        let mut idx = ArtifactIndex::new("run-001", "ctl");
        idx.add("decisions.jsonl", "log", sha256_hex(b""));
        assert_eq!(
            idx.artifacts[0].sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let parsed: serde_json::Value = serde_json::from_str(&idx.to_json().unwrap()).unwrap();
        assert_eq!(parsed["index_version"], 1);
        assert_eq!(parsed["controller_id"], "ctl");
        assert_eq!(parsed["artifacts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn timestamps_are_millisecond_rfc3339() {
        let at = |secs, nanos| DateTime::from_timestamp(secs, nanos).unwrap();
        assert_eq!(format_utc(at(0, 0)), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_utc(at(951_782_400, 5_000_000)), "2000-02-29T00:00:00.005Z");
        assert_eq!(format_utc(at(1_700_000_000, 0)), "2023-11-14T22:13:20.000Z");
        assert!(now_utc().ends_with('Z'));
    }

    #[test]
    fn emitter_rejects_ids_that_break_trace_ids() {
        let bad = [
            ("team::alpha", "run-1"),
            ("", "run-1"),
            ("  ", "run-1"),
            ("ctl", "a::b"),
        ];
        for (controller, run) in bad {
            let err = LogEmitter::to_shared_buffer(controller, run).err().unwrap();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "{controller:?}/{run:?}");
        }
        assert!(LogEmitter::to_shared_buffer("team:alpha", "run-1").is_ok());
    }

    #[test]
    fn artifact_refs_must_be_paths() {
        let entry = LogEntry::new("ctl::run-1::001", LogLevel::Info, "scenario_finished")
            .with_artifacts(vec!["decisions.index.json".to_string()]);
        let parsed = validate_log_line(&entry.to_jsonl().unwrap(), 1).unwrap();
        assert_eq!(parsed.artifact_refs, Some(vec!["decisions.index.json".to_string()]));

        let json = r#"{"timestamp":"t","trace_id":"a::b::1","level":"info","event":"x","artifact_refs":[""]}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "artifact_refs"));
    }
}
