//! Import summary and reporting

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A source row that was not imported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Zero-based position in the source array
    pub index: usize,

    /// Why the row was skipped
    pub reason: String,
}

/// Summary of a billable import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Rows in the source
    pub total_rows: usize,

    /// Rows written (inserted or replaced)
    pub imported: usize,

    /// Rows left out, with reasons
    pub skipped: Vec<SkippedRow>,

    /// When the import started
    pub started_at: DateTime<Utc>,

    /// Duration of the import
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ImportSummary {
    /// Create an empty summary for `total_rows` source rows
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            imported: 0,
            skipped: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a skipped row
    pub fn skip(&mut self, index: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedRow {
            index,
            reason: reason.into(),
        });
    }

    /// Number of skipped rows
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Share of source rows imported, as a percentage
    pub fn import_rate(&self) -> f64 {
        if self.total_rows == 0 {
            return 100.0;
        }
        (self.imported as f64 / self.total_rows as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_rows = self.total_rows,
            imported = self.imported,
            skipped = self.skipped_count(),
            duration_ms = self.duration.as_millis() as u64,
            import_rate = format!("{:.2}%", self.import_rate()),
            "Billable import completed"
        );

        for row in &self.skipped {
            tracing::warn!(index = row.index, reason = %row.reason, "Billable row skipped");
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
