use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Suites exported when none are named explicitly.
pub const DEFAULT_SUITES: [&str; 10] = ["06", "07", "08", "09", "10", "11", "12", "13", "14", "15"];

/// Two-digit chapter code identifying a suite, e.g. `06`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SuiteCode(String);

impl SuiteCode {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn file_name(&self) -> String {
    format!("ch{}.json", self.0)
  }

  pub fn defaults() -> Vec<SuiteCode> {
    DEFAULT_SUITES
      .iter()
      .map(|code| SuiteCode(code.to_string()))
      .collect()
  }
}

impl FromStr for SuiteCode {
  type Err = anyhow::Error;

  fn from_str(raw: &str) -> Result<Self> {
    if raw.len() != 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
      bail!("invalid suite code `{raw}` (expected two digits, e.g. `06`)");
    }
    Ok(SuiteCode(raw.to_string()))
  }
}

impl fmt::Display for SuiteCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for SuiteCode {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteDocument {
  #[serde(rename = "testsCollection")]
  pub tests_collection: TestsCollection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestsCollection {
  #[serde(default)]
  pub name: Option<String>,
  pub tests: Vec<TestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestEntry {
  /// Base64 encoded source of the snippet.
  pub code: String,
  #[serde(default, deserialize_with = "present")]
  pub negative: Option<Value>,
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

// A `negative` key marks the test whatever its value, so `null` must still count.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
  Value::deserialize(deserializer).map(Some)
}

impl TestEntry {
  pub fn is_negative(&self) -> bool {
    self.negative.is_some()
  }

  pub fn decode_code(&self) -> Result<Vec<u8>> {
    decode_base64(&self.code)
  }

  /// Name used in log messages.
  pub fn label(&self) -> &str {
    self
      .path
      .as_deref()
      .or(self.description.as_deref())
      .unwrap_or("<unnamed>")
  }
}

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
  let compact: Vec<u8> = encoded
    .bytes()
    .filter(|b| !b.is_ascii_whitespace())
    .collect();
  STANDARD
    .decode(&compact)
    .map_err(|err| anyhow!("malformed base64: {err}"))
}

pub fn suite_path(suites_dir: &Path, code: &SuiteCode) -> PathBuf {
  suites_dir.join(code.file_name())
}

pub fn load_suite(suites_dir: &Path, code: &SuiteCode) -> Result<SuiteDocument> {
  let path = suite_path(suites_dir, code);
  let raw = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
  parse_suite(&raw).with_context(|| format!("parse suite {code} ({})", path.display()))
}

pub fn parse_suite(raw: &str) -> Result<SuiteDocument> {
  Ok(serde_json::from_str::<SuiteDocument>(raw)?)
}
