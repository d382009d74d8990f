use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::categorizer::{AccountLevels, PatternTable};
use crate::error::{BsmapError, Result};
use crate::remap::RemapTable;
use crate::template::ChartTemplate;

/// Everything read from `config.json`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: InputSettings,
    pub output: OutputSettings,
    pub balance_sheet: BalanceSheetSettings,
    /// Column remapper table: group -> (source name -> general name).
    pub account_mapping: RemapTable,
    pub processing_columns: ProcessingColumns,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub delimiter: String,
    /// 1-based line holding the column headers.
    pub header_row: usize,
    /// WHATWG encoding label (`utf-8`, `shift_jis`, `utf-16le`, ...).
    pub file_encoding: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            header_row: 1,
            file_encoding: "utf-8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub delimiter: String,
    pub file_encoding: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            file_encoding: "utf-8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalanceSheetSettings {
    pub account_mapping: PatternTable,
    pub structure: ChartTemplate,
    /// Display unit for the entries listing; 0 disables rescaling.
    pub unit_threshold: u64,
    pub negative_marker: String,
    pub annotation_marker: String,
    pub total_marker: String,
    pub major_categories: Vec<String>,
    pub column_count: usize,
    pub amount_column: usize,
}

impl Default for BalanceSheetSettings {
    fn default() -> Self {
        Self {
            account_mapping: PatternTable::default(),
            structure: ChartTemplate::default(),
            unit_threshold: 1_000_000,
            negative_marker: "△".to_string(),
            annotation_marker: "※".to_string(),
            total_marker: "合計".to_string(),
            major_categories: [
                "資産の部",
                "負債の部",
                "純資産の部",
                "流動資産",
                "固定資産",
                "流動負債",
                "固定負債",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            column_count: 25,
            amount_column: 9,
        }
    }
}

impl BalanceSheetSettings {
    pub fn levels(&self) -> AccountLevels {
        AccountLevels {
            major_categories: self.major_categories.clone(),
            total_marker: self.total_marker.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessingColumns {
    pub target_columns: Vec<String>,
    pub exclude_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub show_mapping_stats: bool,
    pub show_unmapped_items: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            show_mapping_stats: true,
            show_unmapped_items: true,
        }
    }
}

fn single_byte(delimiter: &str, field: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [b] => Ok(*b),
        _ => Err(BsmapError::Config(format!(
            "{field} must be a single ASCII character, got {delimiter:?}"
        ))),
    }
}

fn encoding_for(label: &str, field: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| BsmapError::Config(format!("{field}: unknown encoding {label:?}")))
}

impl Settings {
    pub fn from_json(content: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.input_delimiter()?;
        self.output_delimiter()?;
        self.input_encoding()?;
        self.output_encoding()?;
        if self.input.header_row == 0 {
            return Err(BsmapError::Config("input.header_row is 1-based".to_string()));
        }
        let bs = &self.balance_sheet;
        if bs.column_count < 3 {
            return Err(BsmapError::Config(format!(
                "balance_sheet.column_count must be at least 3, got {}",
                bs.column_count
            )));
        }
        if bs.amount_column >= bs.column_count {
            return Err(BsmapError::Config(format!(
                "balance_sheet.amount_column {} is outside {} columns",
                bs.amount_column, bs.column_count
            )));
        }
        Ok(())
    }

    pub fn input_delimiter(&self) -> Result<u8> {
        single_byte(&self.input.delimiter, "input.delimiter")
    }

    pub fn output_delimiter(&self) -> Result<u8> {
        single_byte(&self.output.delimiter, "output.delimiter")
    }

    pub fn input_encoding(&self) -> Result<&'static Encoding> {
        encoding_for(&self.input.file_encoding, "input.file_encoding")
    }

    pub fn output_encoding(&self) -> Result<&'static Encoding> {
        encoding_for(&self.output.file_encoding, "output.file_encoding")
    }
}

fn user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bsmap")
        .join("config.json")
}

/// Config file to use: the explicit path, else `./config.json`, else the
/// per-user file. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(BsmapError::ConfigNotFound(path.display().to_string()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = PathBuf::from("config.json");
    if local.exists() {
        return Ok(Some(local));
    }
    let user = user_config_path();
    if user.exists() {
        return Ok(Some(user));
    }
    Ok(None)
}

pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match resolve_config_path(explicit)? {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let settings = Settings::from_json(&content)?;
            tracing::info!(path = %path.display(), "loaded config");
            Ok(settings)
        }
        None => {
            tracing::info!("no config file found, using defaults");
            Ok(Settings::default())
        }
    }
}
