//! CSV and JSON export of plan holdings and projection schedules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file extension, pretty JSON for `.json`.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" | "pretty" | "pretty_json" => Ok(Self::PrettyJson),
            "compact" | "compact_json" => Ok(Self::Json),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One reconciled holding of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldingExport {
    /// Ticker symbol.
    pub ticker: String,

    /// Sector label.
    pub sector: String,

    /// Unit price.
    pub current_price: f64,

    /// Optimized weight (0.0 to 1.0).
    pub weight: f64,

    /// Currency amount the weight implies each month.
    pub monthly_allocation: f64,

    /// Whole shares bought each month.
    pub whole_shares: u64,

    /// Cost of the whole shares.
    pub share_cost: f64,

    /// Realized weight after rounding to whole shares.
    pub actual_weight: f64,
}

/// Holdings of a plan at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioExport {
    /// Plan name.
    pub name: String,

    /// Date the plan was generated.
    pub date: NaiveDate,

    /// Reconciled holdings.
    pub holdings: Vec<HoldingExport>,
}

impl PortfolioExport {
    /// Create a new portfolio export.
    pub const fn new(name: String, date: NaiveDate, holdings: Vec<HoldingExport>) -> Self {
        Self {
            name,
            date,
            holdings,
        }
    }

    /// Sum of optimized weights (close to 1.0).
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    /// Realized monthly cost of all holdings.
    pub fn total_share_cost(&self) -> f64 {
        self.holdings.iter().map(|h| h.share_cost).sum()
    }
}

/// One month of a projection schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectionRow {
    /// Month number, starting at 1.
    pub month: u32,

    /// Total contributed so far.
    pub cumulative_invested: f64,

    /// Projected portfolio value.
    pub projected_value: f64,

    /// `projected_value - cumulative_invested`.
    pub gain: f64,
}

/// Month-by-month projection schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionExport {
    /// Monthly contribution.
    pub monthly_amount: f64,

    /// Annual growth rate used, as a decimal.
    pub annual_growth_rate: f64,

    /// Schedule rows.
    pub rows: Vec<ProjectionRow>,
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn write_csv<'a, T, I>(records: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for PortfolioExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Header information as comments
                output.push_str(&format!("# Plan: {}\n", self.name));
                output.push_str(&format!("# Date: {}\n", self.date));
                output.push_str(&format!("# Total Weight: {}\n", self.total_weight()));
                output.push_str(&format!(
                    "# Monthly Share Cost: {:.2}\n",
                    self.total_share_cost()
                ));

                output.push_str(&write_csv(&self.holdings)?);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<HoldingExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for ProjectionExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(&self.rows),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
