//! Run report: a flat record of stage outcomes and transaction links.

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Success => "success",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

/// Recorded outcome of a stage plus stage-specific details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub status: StageStatus,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl StageRecord {
    pub fn new(status: StageStatus) -> Self {
        Self {
            status,
            details: Map::new(),
        }
    }

    pub fn success() -> Self {
        Self::new(StageStatus::Success)
    }

    pub fn skipped(reason: &str) -> Self {
        Self::new(StageStatus::Skipped).with("reason", reason)
    }

    pub fn failed(error: &str) -> Self {
        Self::new(StageStatus::Failed).with("error", error)
    }

    /// Attach a detail field.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.details.insert(key.to_string(), value);
        self
    }
}

/// A transaction submitted during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub name: String,
    pub tx_hash: TxHash,
    pub explorer_url: String,
}

/// The report written once at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub test_time: DateTime<Utc>,
    pub stages: BTreeMap<String, StageRecord>,
    pub transactions: Vec<TransactionRecord>,
    #[serde(skip)]
    explorer_url: String,
}

impl RunReport {
    pub fn new(explorer_url: &str) -> Self {
        Self {
            test_time: Utc::now(),
            stages: BTreeMap::new(),
            transactions: Vec::new(),
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn record_stage(&mut self, stage: &str, record: StageRecord) {
        self.stages.insert(stage.to_string(), record);
    }

    /// Record a transaction and return its explorer link.
    pub fn add_transaction(&mut self, name: &str, tx_hash: TxHash) -> String {
        let explorer_url = format!("{}/tx/{}", self.explorer_url, tx_hash);
        self.transactions.push(TransactionRecord {
            name: name.to_string(),
            tx_hash,
            explorer_url: explorer_url.clone(),
        });
        explorer_url
    }

    /// True when no stage failed.
    pub fn all_passed(&self) -> bool {
        self.stages
            .values()
            .all(|record| record.status != StageStatus::Failed)
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        tracing::info!(path = %path.display(), "Saved run report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    #[test]
    fn test_transaction_links() {
        let mut report = RunReport::new("https://sepolia.etherscan.io/");
        let hash = B256::repeat_byte(0xaa);
        let link = report.add_transaction("Stake", hash);
        assert_eq!(link, format!("https://sepolia.etherscan.io/tx/{}", hash));
        assert!(link.contains("/tx/0xaaaa"));
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = RunReport::new("https://sepolia.etherscan.io");
        report.record_stage(
            "stage3_stake",
            StageRecord::success().with("staked_amount", "100").with("is_active", true),
        );
        report.record_stage("stage6_claim_rewards", StageRecord::skipped("No pending rewards"));
        report.add_transaction("Stake", B256::repeat_byte(1));

        let file = tempfile::NamedTempFile::new().unwrap();
        report.save(file.path()).unwrap();

        let json: Value = serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
        assert_eq!(json["stages"]["stage3_stake"]["status"], "success");
        assert_eq!(json["stages"]["stage3_stake"]["is_active"], true);
        assert_eq!(json["stages"]["stage6_claim_rewards"]["reason"], "No pending rewards");
        assert_eq!(json["transactions"][0]["name"], "Stake");
        assert!(json["test_time"].is_string());
        assert!(json.get("explorer_url").is_none());
        assert!(report.all_passed());
    }

    #[test]
    fn test_failed_stage_marks_run_failed() {
        let mut report = RunReport::new("https://example.org");
        report.record_stage("stage1_environment", StageRecord::success());
        report.record_stage("stage2_register_agent", StageRecord::failed("boom"));
        assert!(!report.all_passed());
    }
}
