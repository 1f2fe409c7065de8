use crate::denylist::Denylist;
use crate::render::{render, validate_array_name, OutputMode, DEFAULT_ARRAY_NAME};
use crate::suite::{load_suite, SuiteCode, SuiteDocument};
use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, info_span};

pub const DEFAULT_SUITES_DIR: &str = "tests/ecma262_suites";

/// A test that survived filtering, with its decoded source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
  pub suite: SuiteCode,
  /// Position in the suite's `tests` array, before filtering.
  pub index: usize,
  pub source: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  Denylisted,
  Content { needle: String },
  Negative,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::Denylisted => f.write_str("index denylisted"),
      SkipReason::Content { needle } => write!(f, "content matches {needle:?}"),
      SkipReason::Negative => f.write_str("negative test"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSummary {
  pub total: usize,
  pub emitted: usize,
  pub denylisted: usize,
  pub content: usize,
  pub negative: usize,
}

impl SuiteSummary {
  fn record_skip(&mut self, reason: &SkipReason) {
    match reason {
      SkipReason::Denylisted => self.denylisted += 1,
      SkipReason::Content { .. } => self.content += 1,
      SkipReason::Negative => self.negative += 1,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
  pub suites: Vec<(SuiteCode, SuiteSummary)>,
}

impl ExportSummary {
  pub fn emitted(&self) -> usize {
    self.suites.iter().map(|(_, s)| s.emitted).sum()
  }
}

pub struct ExportOptions {
  pub suites_dir: PathBuf,
  pub suites: Vec<SuiteCode>,
  pub denylist: Denylist,
  pub mode: OutputMode,
  pub array_name: String,
}

impl ExportOptions {
  pub fn new(suites_dir: impl Into<PathBuf>, denylist: Denylist) -> Self {
    Self {
      suites_dir: suites_dir.into(),
      suites: SuiteCode::defaults(),
      denylist,
      mode: OutputMode::default(),
      array_name: DEFAULT_ARRAY_NAME.to_string(),
    }
  }

  pub fn with_suites(mut self, suites: Vec<SuiteCode>) -> Self {
    self.suites = suites;
    self
  }

  pub fn with_mode(mut self, mode: OutputMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_array_name(mut self, array_name: impl Into<String>) -> Self {
    self.array_name = array_name.into();
    self
  }
}

/// Filters one suite's tests, returning survivors in their original order.
pub fn select_cases(
  code: &SuiteCode,
  document: &SuiteDocument,
  denylist: &Denylist,
) -> Result<(Vec<Case>, SuiteSummary)> {
  let tests = &document.tests_collection.tests;
  let mut summary = SuiteSummary {
    total: tests.len(),
    ..SuiteSummary::default()
  };
  let mut cases = Vec::new();
  for (index, test) in tests.iter().enumerate() {
    if denylist.denies_index(code, index) {
      debug!(suite = %code, index, test = test.label(), "{}", SkipReason::Denylisted);
      summary.record_skip(&SkipReason::Denylisted);
      continue;
    }
    let source = test
      .decode_code()
      .with_context(|| format!("suite {code} test #{index} ({})", test.label()))?;
    let reason = match denylist.content_rejects(&source) {
      Some(needle) => Some(SkipReason::Content {
        needle: needle.to_string(),
      }),
      None if test.is_negative() => Some(SkipReason::Negative),
      None => None,
    };
    if let Some(reason) = reason {
      debug!(suite = %code, index, test = test.label(), "{reason}");
      summary.record_skip(&reason);
      continue;
    }
    summary.emitted += 1;
    cases.push(Case {
      suite: code.clone(),
      index,
      source,
    });
  }
  Ok((cases, summary))
}

/// Loads and filters every configured suite in order.
pub fn collect_cases(options: &ExportOptions) -> Result<(Vec<Case>, ExportSummary)> {
  let mut cases = Vec::new();
  let mut summary = ExportSummary::default();
  for code in &options.suites {
    let _span = info_span!("suite", suite = %code).entered();
    let document = load_suite(&options.suites_dir, code)?;
    let (selected, suite_summary) = select_cases(code, &document, &options.denylist)?;
    info!(
      name = document.tests_collection.name.as_deref().unwrap_or(""),
      total = suite_summary.total,
      emitted = suite_summary.emitted,
      denylisted = suite_summary.denylisted,
      content = suite_summary.content,
      negative = suite_summary.negative,
      "filtered suite"
    );
    cases.extend(selected);
    summary.suites.push((code.clone(), suite_summary));
  }
  Ok((cases, summary))
}

/// Collects all cases, then writes the artifact; nothing is written if any suite fails.
pub fn export(options: &ExportOptions, out: &mut impl Write) -> Result<ExportSummary> {
  validate_array_name(&options.array_name)?;
  let (cases, summary) = collect_cases(options)?;
  render(options.mode, &options.array_name, &cases, out).context("write output")?;
  out.flush().context("write output")?;
  info!(cases = cases.len(), "export complete");
  Ok(summary)
}
