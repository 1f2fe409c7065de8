use crate::escape::{escape_c_string, hex_byte, strip_trailing_apostrophes};
use crate::export::Case;
use anyhow::{bail, Result};
use std::io::Write;

pub const DEFAULT_ARRAY_NAME: &str = "ecmac_cases";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
  /// `const char *` table of escaped string literals.
  #[default]
  StringLiterals,
  /// One `static const char cN[]` per case plus a pointer table.
  ByteArrays,
  /// Raw snippets separated by NUL bytes.
  Blob,
}

pub fn validate_array_name(name: &str) -> Result<()> {
  let mut bytes = name.bytes();
  let valid = match bytes.next() {
    Some(first) => {
      (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }
    None => false,
  };
  if !valid {
    bail!("`{name}` is not a valid C identifier");
  }
  Ok(())
}

pub fn render(mode: OutputMode, array_name: &str, cases: &[Case], out: &mut impl Write) -> Result<()> {
  match mode {
    OutputMode::StringLiterals => render_string_literals(array_name, cases, out),
    OutputMode::ByteArrays => render_byte_arrays(array_name, cases, out),
    OutputMode::Blob => render_blob(cases, out),
  }
}

fn render_string_literals(array_name: &str, cases: &[Case], out: &mut impl Write) -> Result<()> {
  writeln!(out, "#pragma GCC diagnostic push")?;
  writeln!(out, "#pragma GCC diagnostic ignored \"-Woverlength-strings\"")?;
  writeln!(out, "const char *{array_name}[] = {{")?;
  for (i, case) in cases.iter().enumerate() {
    out.write_all(b"  \"")?;
    out.write_all(&escape_c_string(&case.source))?;
    out.write_all(b"\"")?;
    if i + 1 < cases.len() {
      out.write_all(b",")?;
    }
    out.write_all(b"\n")?;
  }
  writeln!(out, "}};")?;
  writeln!(out, "#pragma GCC diagnostic pop")?;
  Ok(())
}

fn render_byte_arrays(array_name: &str, cases: &[Case], out: &mut impl Write) -> Result<()> {
  let mut names = Vec::with_capacity(cases.len());
  for (i, case) in cases.iter().enumerate() {
    let name = format!("c{i}");
    let bytes: Vec<String> = case
      .source
      .iter()
      .copied()
      .chain(std::iter::once(0))
      .map(hex_byte)
      .collect();
    writeln!(out, "static const char {name}[] = {{{}}};", bytes.join(","))?;
    names.push(name);
  }
  writeln!(out, "const char *{array_name}[] = {{{}}};", names.join(", "))?;
  Ok(())
}

fn render_blob(cases: &[Case], out: &mut impl Write) -> Result<()> {
  for (i, case) in cases.iter().enumerate() {
    if i > 0 {
      out.write_all(b"\0")?;
    }
    out.write_all(strip_trailing_apostrophes(&case.source))?;
  }
  Ok(())
}
