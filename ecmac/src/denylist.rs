use crate::suite::SuiteCode;
use anyhow::{anyhow, Context, Result};
use memchr::memmem;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Manifest compiled into the crate; matches what the C harness has always been built with.
pub const BUILTIN_DENYLIST: &str = include_str!("../denylist.toml");

/// Decides whether a decoded snippet is excluded by its content alone.
pub trait ContentFilter: fmt::Debug {
  /// Returns the matched rule when `source` must be excluded.
  fn rejects(&self, source: &[u8]) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ContentFilter for AcceptAll {
  fn rejects(&self, _source: &[u8]) -> Option<&str> {
    None
  }
}

#[derive(Debug, Clone, Default)]
pub struct SubstringFilter {
  needles: Vec<String>,
}

impl SubstringFilter {
  pub fn new(needles: Vec<String>) -> Self {
    Self {
      needles: needles.into_iter().filter(|n| !n.is_empty()).collect(),
    }
  }

  pub fn needles(&self) -> &[String] {
    &self.needles
  }
}

impl ContentFilter for SubstringFilter {
  fn rejects(&self, source: &[u8]) -> Option<&str> {
    self
      .needles
      .iter()
      .find(|needle| memmem::find(source, needle.as_bytes()).is_some())
      .map(String::as_str)
  }
}

/// Index and content exclusion rules applied to every suite.
#[derive(Debug)]
pub struct Denylist {
  indices: BTreeMap<SuiteCode, BTreeSet<usize>>,
  content: Box<dyn ContentFilter>,
}

impl Denylist {
  pub fn empty() -> Self {
    Self {
      indices: BTreeMap::new(),
      content: Box::new(AcceptAll),
    }
  }

  pub fn builtin() -> Result<Self> {
    Self::from_str(BUILTIN_DENYLIST).context("builtin denylist")
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    let raw =
      fs::read_to_string(path).with_context(|| format!("read denylist {}", path.display()))?;
    Self::from_str(&raw).map_err(|err| anyhow!("{}: {err}", path.display()))
  }

  pub fn from_str(raw: &str) -> Result<Self> {
    let manifest = match toml::from_str::<RawManifest>(raw) {
      Ok(manifest) => manifest,
      Err(toml_err) => serde_json::from_str::<RawManifest>(raw).map_err(|json_err| {
        anyhow!("failed to parse denylist as TOML ({toml_err}) or JSON ({json_err})")
      })?,
    };

    Ok(Self {
      indices: manifest.indices,
      content: Box::new(SubstringFilter::new(manifest.content_substrings)),
    })
  }

  pub fn with_content_filter(mut self, filter: impl ContentFilter + 'static) -> Self {
    self.content = Box::new(filter);
    self
  }

  pub fn with_index(mut self, suite: SuiteCode, index: usize) -> Self {
    self.indices.entry(suite).or_default().insert(index);
    self
  }

  pub fn denies_index(&self, suite: &SuiteCode, index: usize) -> bool {
    self
      .indices
      .get(suite)
      .is_some_and(|denied| denied.contains(&index))
  }

  pub fn content_rejects(&self, source: &[u8]) -> Option<&str> {
    self.content.rejects(source)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
  #[serde(default)]
  content_substrings: Vec<String>,
  #[serde(default)]
  indices: BTreeMap<SuiteCode, BTreeSet<usize>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn code(raw: &str) -> SuiteCode {
    raw.parse().unwrap()
  }

  #[test]
  fn builtin_rejects_for_in_and_labels() {
    let denylist = Denylist::builtin().unwrap();
    assert_eq!(denylist.content_rejects(b"for (x in y);"), Some(" in "));
    assert_eq!(denylist.content_rejects(b"LABEL: while (1) {}"), Some("LABEL"));
    assert_eq!(denylist.content_rejects(b"var index = 1;"), None);
    assert!(!denylist.denies_index(&code("10"), 0));
  }

  #[test]
  fn manifest_parses_as_toml_or_json() {
    let toml = Denylist::from_str("[indices]\n\"12\" = [3, 17]\n").unwrap();
    assert!(toml.denies_index(&code("12"), 17));
    assert!(!toml.denies_index(&code("12"), 4));
    assert_eq!(toml.content_rejects(b"for (x in y);"), None);

    let json =
      Denylist::from_str(r#"{"content_substrings": ["with"], "indices": {"06": [0]}}"#).unwrap();
    assert!(json.denies_index(&code("06"), 0));
    assert_eq!(json.content_rejects(b"with (o) {}"), Some("with"));
  }

  #[test]
  fn manifest_with_bad_suite_code_errors() {
    let err = Denylist::from_str("[indices]\n\"1\" = [0]\n").unwrap_err();
    assert!(err.to_string().contains("TOML"), "{err}");
  }

  #[test]
  fn content_filter_can_be_replaced() {
    let denylist = Denylist::builtin().unwrap().with_content_filter(AcceptAll);
    assert_eq!(denylist.content_rejects(b"for (x in y);"), None);
  }

  #[test]
  fn empty_needles_never_match() {
    let filter = SubstringFilter::new(vec![String::new()]);
    assert!(filter.needles().is_empty());
    assert_eq!(filter.rejects(b"anything"), None);
  }
}
