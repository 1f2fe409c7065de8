//! Byte-level escaping for embedding decoded snippets in C sources.

/// Removes any run of apostrophes at the end of `source`.
pub fn strip_trailing_apostrophes(source: &[u8]) -> &[u8] {
  let end = source
    .iter()
    .rposition(|&b| b != b'\'')
    .map_or(0, |pos| pos + 1);
  &source[..end]
}

/// Escapes `source` for the body of a C string literal, without the surrounding quotes.
///
/// CRLF pairs collapse into a single `\n` escape, and a `?` following another `?` is written
/// as `\?` so no trigraph can form. Trailing apostrophes are dropped.
pub fn escape_c_string(source: &[u8]) -> Vec<u8> {
  let source = strip_trailing_apostrophes(source);
  let mut out = Vec::with_capacity(source.len() + source.len() / 8);
  let mut bytes = source.iter().copied().peekable();
  let mut prev = None;
  while let Some(b) = bytes.next() {
    match b {
      b'\\' => out.extend_from_slice(b"\\\\"),
      b'"' => out.extend_from_slice(b"\\\""),
      b'\n' => out.extend_from_slice(b"\\n"),
      b'\r' if bytes.peek() == Some(&b'\n') => {
        bytes.next();
        out.extend_from_slice(b"\\n");
      }
      b'\r' => out.extend_from_slice(b"\\r"),
      b'?' if prev == Some(b'?') => out.extend_from_slice(b"\\?"),
      b => out.push(b),
    }
    prev = Some(b);
  }
  out
}

/// Formats a byte as C hex, e.g. `0x61`.
pub fn hex_byte(b: u8) -> String {
  format!("{b:#x}")
}

#[cfg(test)]
mod tests {
  use super::*;

  // Undoes the escapes produced above the way a C compiler reads them.
  fn unescape(escaped: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = escaped.iter();
    while let Some(&b) = iter.next() {
      if b != b'\\' {
        out.push(b);
        continue;
      }
      match iter.next() {
        Some(b'n') => out.push(b'\n'),
        Some(b'r') => out.push(b'\r'),
        Some(&other) => out.push(other),
        None => panic!("dangling backslash"),
      }
    }
    out
  }

  fn escaped(source: &str) -> String {
    String::from_utf8(escape_c_string(source.as_bytes())).unwrap()
  }

  #[test]
  fn escapes_backslashes_quotes_and_newlines() {
    assert_eq!(escaped("1+1;"), "1+1;");
    assert_eq!(escaped(r#"var s = "a\b";"#), r#"var s = \"a\\b\";"#);
    assert_eq!(escaped("a;\r\nb;\nc;"), "a;\\nb;\\nc;");
    assert_eq!(escaped("a\rb"), "a\\rb");
  }

  #[test]
  fn question_mark_runs_never_form_trigraphs() {
    assert_eq!(escaped("x ?? y"), "x ?\\? y");
    assert_eq!(escaped("???="), "?\\?\\?=");
    assert_eq!(escaped("a ? b : c"), "a ? b : c");
  }

  #[test]
  fn trailing_apostrophes_are_stripped() {
    assert_eq!(escaped("'abc''"), "'abc");
    assert_eq!(strip_trailing_apostrophes(b"'''"), b"");
    assert_eq!(strip_trailing_apostrophes(b""), b"");
  }

  #[test]
  fn escaping_round_trips_through_c_unescaping() {
    let samples: [&[u8]; 4] = [
      b"if (a ??? b) { s = \"\\\\\"; }\n",
      b"\r\nline\r\n",
      b"\xe2\x80\xa8 raw bytes ??/",
      b"var q = '?';",
    ];
    for sample in samples {
      let expected = strip_trailing_apostrophes(sample).to_vec();
      let expected = String::from_utf8_lossy(&expected).replace("\r\n", "\n");
      let round_tripped = unescape(&escape_c_string(sample));
      assert_eq!(String::from_utf8_lossy(&round_tripped), expected);
    }
  }

  #[test]
  fn hex_bytes_are_lowercase_and_unpadded() {
    assert_eq!(hex_byte(b'a'), "0x61");
    assert_eq!(hex_byte(0), "0x0");
    assert_eq!(hex_byte(0xe2), "0xe2");
  }
}
