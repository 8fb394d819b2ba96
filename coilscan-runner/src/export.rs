//! Result export: CSV, JSON and a plain-text table.
//!
//! Sinks are write-only. Every persisted artifact is named
//! `scan_{date}_{fingerprint8}` so reruns with the same configuration on the
//! same day overwrite each other and different configurations never collide.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use coilscan_core::screening::{ScanHit, ScreeningCriteria};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result_set::{ResultSet, ScanSummary};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: 1)")]
    UnsupportedSchema { found: u32 },
}

/// Everything written for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: u32,
    pub scan_date: NaiveDate,
    pub fingerprint: String,
    /// True when the series came from the synthetic fetcher.
    pub synthetic: bool,
    pub criteria: ScreeningCriteria,
    pub summary: ScanSummary,
    pub hits: Vec<ScanHit>,
}

impl ScanReport {
    pub fn new(
        results: &ResultSet,
        criteria: &ScreeningCriteria,
        scan_date: NaiveDate,
        fingerprint: impl Into<String>,
        synthetic: bool,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            scan_date,
            fingerprint: fingerprint.into(),
            synthetic,
            criteria: criteria.clone(),
            summary: results.summary().clone(),
            hits: results.hits().to_vec(),
        }
    }

    /// `scan_{YYYYMMDD}_{first 8 fingerprint chars}`.
    pub fn file_stem(&self) -> String {
        let short: String = self.fingerprint.chars().take(8).collect();
        format!("scan_{}_{short}", self.scan_date.format("%Y%m%d"))
    }
}

// ─── Encoders ───────────────────────────────────────────────────────

const CSV_HEADER: [&str; 11] = [
    "symbol",
    "name",
    "board",
    "date",
    "price",
    "convergence_pct",
    "volume_ratio",
    "long_term_bias_pct",
    "volume_lots",
    "position",
    "momentum",
];

/// One row per hit, in result-set order.
pub fn export_hits_csv(hits: &[ScanHit]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;

    for h in hits {
        wtr.write_record([
            &h.symbol,
            &h.name,
            &h.board.to_string(),
            &h.date.to_string(),
            &format!("{:.2}", h.price),
            &format!("{:.2}", h.convergence_pct),
            &format!("{:.2}", h.volume_ratio),
            &format!("{:.2}", h.long_term_bias_pct),
            &format!("{:.0}", h.volume_lots),
            &h.position.to_string(),
            &h.momentum.to_string(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

pub fn export_json(report: &ScanReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a report, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<ScanReport, ExportError> {
    let report: ScanReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: report.schema_version,
        });
    }
    Ok(report)
}

/// Fixed-width table for terminal output.
pub fn render_table(hits: &[ScanHit]) -> String {
    let mut out = String::with_capacity(128 + hits.len() * 120);
    out.push_str(&format!(
        "{:<6} {:<10} {:>9} {:>8} {:>7} {:>8} {:>9}  {:<38} {}\n",
        "code", "name", "price", "conv%", "vol×", "bias%", "lots", "position", "momentum"
    ));
    for h in hits {
        out.push_str(&format!(
            "{:<6} {:<10} {:>9.2} {:>8.2} {:>7.2} {:>8.2} {:>9.0}  {:<38} {}\n",
            h.symbol,
            h.name,
            h.price,
            h.convergence_pct,
            h.volume_ratio,
            h.long_term_bias_pct,
            h.volume_lots,
            h.position.to_string(),
            h.momentum
        ));
    }
    out
}

// ─── Sinks ──────────────────────────────────────────────────────────

/// Write-only destination for a finished scan. Returns the written path.
pub trait ResultSink {
    fn write(&self, report: &ScanReport) -> Result<PathBuf, ExportError>;
}

fn write_file(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote scan results");
    Ok(path)
}

pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ResultSink for CsvSink {
    fn write(&self, report: &ScanReport) -> Result<PathBuf, ExportError> {
        let csv = export_hits_csv(&report.hits)?;
        write_file(&self.output_dir, &format!("{}.csv", report.file_stem()), &csv)
    }
}

pub struct JsonSink {
    output_dir: PathBuf,
}

impl JsonSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ResultSink for JsonSink {
    fn write(&self, report: &ScanReport) -> Result<PathBuf, ExportError> {
        let json = export_json(report)?;
        write_file(&self.output_dir, &format!("{}.json", report.file_stem()), &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coilscan_core::domain::Board;
    use coilscan_core::screening::{MomentumLabel, PositionLabel};

    fn sample_hit(symbol: &str, convergence_pct: f64) -> ScanHit {
        ScanHit {
            symbol: symbol.into(),
            name: "台積電".into(),
            board: Board::Twse,
            date: NaiveDate::from_ymd_opt(2025, 4, 11).unwrap(),
            price: 912.0,
            convergence_pct,
            volume_ratio: 0.74,
            long_term_bias_pct: 4.2,
            volume_lots: 23_456.0,
            position: PositionLabel::UptrendClear,
            momentum: MomentumLabel::Strengthening,
        }
    }

    fn sample_report() -> ScanReport {
        let mut summary = ScanSummary::new(3);
        summary.record_hit();
        summary.record_hit();
        summary.record_skip(crate::result_set::SkipReason::NoMatch);
        let set = ResultSet::new(vec![sample_hit("2330", 0.8), sample_hit("2303", 0.35)], summary);
        ScanReport::new(
            &set,
            &ScreeningCriteria::base(),
            NaiveDate::from_ymd_opt(2025, 4, 11).unwrap(),
            "0123456789abcdef",
            false,
        )
    }

    #[test]
    fn file_stem_uses_date_and_short_fingerprint() {
        assert_eq!(sample_report().file_stem(), "scan_20250411_01234567");
    }

    #[test]
    fn csv_has_header_and_sorted_rows() {
        let csv = export_hits_csv(&sample_report().hits).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,name,board,date,price,convergence_pct"));
        assert!(lines[1].starts_with("2303,台積電,TWSE,2025-04-11,912.00,0.35,0.74,4.20,23456,"));
        assert!(lines[1].ends_with(",uptrend/long-term-clear,strengthening"));
    }

    #[test]
    fn csv_empty_hits_is_header_only() {
        let csv = export_hits_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn json_roundtrip_and_version_guard() {
        let report = sample_report();
        let json = export_json(&report).unwrap();
        assert_eq!(import_json(&json).unwrap(), report);

        let newer = json.replace("\"schema_version\": 1", "\"schema_version\": 99");
        assert!(matches!(
            import_json(&newer),
            Err(ExportError::UnsupportedSchema { found: 99 })
        ));
    }

    #[test]
    fn sinks_write_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let csv_path = CsvSink::new(dir.path()).write(&report).unwrap();
        let json_path = JsonSink::new(dir.path().join("nested")).write(&report).unwrap();

        assert_eq!(csv_path.file_name().unwrap(), "scan_20250411_01234567.csv");
        assert_eq!(json_path.file_name().unwrap(), "scan_20250411_01234567.json");
        assert!(std::fs::read_to_string(&csv_path).unwrap().contains("2330"));
        let back = import_json(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back.hits.len(), 2);
    }

    #[test]
    fn table_lists_every_hit() {
        let table = render_table(&sample_report().hits);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("uptrend/long-term-clear"));
    }
}
