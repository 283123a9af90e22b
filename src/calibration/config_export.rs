//! Persists calibration results into the ISP tuning configuration (YAML).
//!
//! Only the keys a tool owns are touched: the three rows under
//! [`CCM_SECTION_KEY`] or the four offsets under [`BLC_SECTION_KEY`]. Every
//! other section of the document is carried over as loaded.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{info, instrument};

use crate::calibration::black_level::BlackLevels;
use crate::calibration::ccm::IntegerCcm;
use crate::calibration::common::error::{CalibrationError, Result};

pub const CCM_SECTION_KEY: &str = "color_correction_matrix";
pub const BLC_SECTION_KEY: &str = "black_level_correction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcmConfigSection {
    pub corrected_red: Vec<i32>,
    pub corrected_green: Vec<i32>,
    pub corrected_blue: Vec<i32>,
}

impl From<&IntegerCcm> for CcmConfigSection {
    fn from(ccm: &IntegerCcm) -> Self {
        Self {
            corrected_red: ccm.red.to_vec(),
            corrected_green: ccm.green.to_vec(),
            corrected_blue: ccm.blue.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackLevelConfigSection {
    pub r_offset: u16,
    pub gr_offset: u16,
    pub gb_offset: u16,
    pub b_offset: u16,
}

impl From<&BlackLevels> for BlackLevelConfigSection {
    fn from(levels: &BlackLevels) -> Self {
        Self {
            r_offset: levels.red,
            gr_offset: levels.green_red,
            gb_offset: levels.green_blue,
            b_offset: levels.blue,
        }
    }
}

fn config_err(e: serde_yaml::Error) -> CalibrationError {
    CalibrationError::ConfigError(e.to_string())
}

fn parse_document(yaml_text: &str) -> Result<Value> {
    if yaml_text.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    serde_yaml::from_str(yaml_text).map_err(config_err)
}

/// Overwrites the fields of `entries` under `key`, creating the section when
/// it is absent or empty.
fn merge_section<T: Serialize>(yaml_text: &str, key: &str, entries: &T) -> Result<String> {
    let mut document = parse_document(yaml_text)?;
    let root = document.as_mapping_mut().ok_or_else(|| {
        CalibrationError::ConfigError("top level of the document is not a mapping".to_string())
    })?;

    let section = root
        .entry(Value::String(key.to_string()))
        .or_insert(Value::Null);
    if section.is_null() {
        *section = Value::Mapping(Mapping::new());
    }
    let section = section
        .as_mapping_mut()
        .ok_or_else(|| CalibrationError::ConfigError(format!("\"{key}\" is not a mapping")))?;

    if let Value::Mapping(fields) = serde_yaml::to_value(entries).map_err(config_err)? {
        for (field, value) in fields {
            section.insert(field, value);
        }
    }

    serde_yaml::to_string(&document).map_err(config_err)
}

fn read_section<T: DeserializeOwned>(yaml_text: &str, key: &str) -> Result<Option<T>> {
    let document = parse_document(yaml_text)?;
    match document.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(section) => serde_yaml::from_value(section.clone())
            .map(Some)
            .map_err(config_err),
    }
}

fn rewrite_file(
    input: &Path,
    output: &Path,
    update: impl FnOnce(&str) -> Result<String>,
) -> Result<()> {
    let text = std::fs::read_to_string(input).map_err(|e| {
        CalibrationError::InputReadError(format!("{}: {}", input.display(), e))
    })?;
    let updated = update(&text)?;
    std::fs::write(output, updated).map_err(|e| {
        CalibrationError::OutputWriteError(format!("{}: {}", output.display(), e))
    })
}

/// Returns `yaml_text` with the CCM rows replaced (or the section created).
pub fn update_config_document(yaml_text: &str, ccm: &IntegerCcm) -> Result<String> {
    merge_section(yaml_text, CCM_SECTION_KEY, &CcmConfigSection::from(ccm))
}

/// Reads the CCM rows back out of a document, if the section is present.
pub fn read_ccm_section(yaml_text: &str) -> Result<Option<CcmConfigSection>> {
    read_section(yaml_text, CCM_SECTION_KEY)
}

/// Loads `input`, updates the CCM rows and writes the result to `output`.
#[instrument(skip(ccm))]
pub fn write_config_file(input: &Path, output: &Path, ccm: &IntegerCcm) -> Result<()> {
    rewrite_file(input, output, |text| update_config_document(text, ccm))?;
    info!(output = %output.display(), "CCM written to configuration");
    Ok(())
}

/// Returns `yaml_text` with the four black-level offsets replaced. Other keys
/// of the section (saturation levels, `is_linear`) are kept.
pub fn update_black_level_document(yaml_text: &str, levels: &BlackLevels) -> Result<String> {
    merge_section(yaml_text, BLC_SECTION_KEY, &BlackLevelConfigSection::from(levels))
}

/// Reads the black-level offsets back out of a document, if present.
pub fn read_black_level_section(yaml_text: &str) -> Result<Option<BlackLevelConfigSection>> {
    read_section(yaml_text, BLC_SECTION_KEY)
}

/// Loads `input`, updates the black-level offsets and writes to `output`.
#[instrument(skip(levels))]
pub fn write_black_level_file(input: &Path, output: &Path, levels: &BlackLevels) -> Result<()> {
    rewrite_file(input, output, |text| update_black_level_document(text, levels))?;
    info!(output = %output.display(), "Black levels written to configuration");
    Ok(())
}
