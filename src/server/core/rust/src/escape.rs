/* src/server/core/rust/src/escape.rs */

use std::fmt::Write;

/// Make serialized JSON safe to embed inside an inline `<script>` element.
///
/// Walks the JSON text tracking whether the current position is inside a
/// JSON string (handling `\"` and `\\` correctly). Inside strings, `<`, `>`
/// and `&` are written as `\u003c`, `\u003e` and `\u0026` so markup such as
/// `</script>` cannot terminate the element early, and every non-ASCII
/// codepoint (including U+2028/U+2029) becomes `\uXXXX`, with surrogate pairs
/// outside the BMP. The result parses to the same value.
pub fn escape_json_for_script(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  let mut in_string = false;
  let mut chars = json.chars();

  while let Some(ch) = chars.next() {
    if !in_string {
      if ch == '"' {
        in_string = true;
      }
      out.push(ch);
      continue;
    }

    match ch {
      '\\' => {
        out.push(ch);
        if let Some(next) = chars.next() {
          out.push(next);
        }
      }
      '"' => {
        in_string = false;
        out.push(ch);
      }
      '<' | '>' | '&' => push_unicode_escape(&mut out, ch as u32),
      c if (c as u32) > 0x7F => {
        let code = c as u32;
        if code > 0xFFFF {
          let adjusted = code - 0x1_0000;
          push_unicode_escape(&mut out, (adjusted >> 10) + 0xD800);
          push_unicode_escape(&mut out, (adjusted & 0x3FF) + 0xDC00);
        } else {
          push_unicode_escape(&mut out, code);
        }
      }
      c => out.push(c),
    }
  }
  out
}

fn push_unicode_escape(out: &mut String, unit: u32) {
  // Writing to a String cannot fail.
  let _ = write!(out, "\\u{unit:04x}");
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ascii_passthrough() {
    let input = r#"{"key":"hello","n":[1,2.5,null,true]}"#;
    assert_eq!(escape_json_for_script(input), input);
  }

  #[test]
  fn closing_script_tag_cannot_escape() {
    let input = r#"{"bio":"</script><script>alert(1)</script>"}"#;
    let escaped = escape_json_for_script(input);
    assert!(!escaped.contains("</script>"));
    assert_eq!(escaped, r#"{"bio":"\u003c/script\u003e\u003cscript\u003ealert(1)\u003c/script\u003e"}"#);
  }

  #[test]
  fn ampersand_and_line_separators() {
    let input = "{\"a\":\"x & y\u{2028}z\"}";
    assert_eq!(escape_json_for_script(input), r#"{"a":"x \u0026 y\u2028z"}"#);
  }

  #[test]
  fn escapes_cjk_and_emoji() {
    let input = "{\"msg\":\"\u{4f60}\u{597d}\",\"e\":\"\u{1F600}\"}";
    assert_eq!(escape_json_for_script(input), r#"{"msg":"\u4f60\u597d","e":"\ud83d\ude00"}"#);
  }

  #[test]
  fn preserves_existing_escapes() {
    let input = r#"{"a":"line\nbreak","b":"say \"<hi>\""}"#;
    assert_eq!(escape_json_for_script(input), r#"{"a":"line\nbreak","b":"say \"\u003chi\u003e\""}"#);
  }

  #[test]
  fn escaped_json_parses_to_same_value() {
    let value = serde_json::json!({ "html": "<b>caf\u{e9} & \u{1F600}</b>", "keys": ["</script>"] });
    let json = serde_json::to_string(&value).expect("serialize");
    let parsed: serde_json::Value =
      serde_json::from_str(&escape_json_for_script(&json)).expect("parse");
    assert_eq!(parsed, value);
  }
}
