//! Line-oriented INI decoder.
//!
//! Reads the git-config style dialect used by the vSphere cloud provider:
//!
//! ```ini
//! ; comment
//! [Global]
//! insecure-flag = true
//! secret-name = "vccreds"   # inline comment
//!
//! [VirtualCenter "10.0.0.1"]
//! user = administrator@vsphere.local
//! ```
//!
//! Section and variable names are case-insensitive, subsection names are not.
//! Values are trimmed; double-quoted parts keep their whitespace and comment
//! characters and understand `\"`, `\\`, `\n`, `\t` and `\b` escapes. A
//! backslash at the end of a line continues the value on the next line. A
//! variable without `=` is passed on as a bare name. A leading byte-order
//! mark is skipped.
//!
//! The decoder does not know the schema. It hands every header and variable
//! to a [`Sections`] implementation and reports what could not be stored as
//! [`Warning`]s; only malformed text and unconvertible values are fatal.

use std::borrow::Cow;

use crate::error::{CodecError, Warning, Warnings};
use crate::schema::RecordMut;

/// Where decoded sections are stored.
pub trait Sections {
    /// The record for `[name]` or `[name "subsection"]`, or `None` when the
    /// schema has no such section.
    ///
    /// Called once for every header and once for every variable line, so a
    /// header naming a keyed section must create its entry even when no
    /// variable follows.
    fn section(&mut self, name: &str, subsection: Option<&str>) -> Option<&mut dyn RecordMut>;
}

/// A parsed `[name "subsection"]` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    name: String,
    subsection: Option<String>,
}

impl Header {
    fn warning(&self, variable: Option<&str>) -> Warning {
        Warning {
            section: self.name.clone(),
            subsection: self.subsection.clone(),
            variable: variable.map(ToOwned::to_owned),
        }
    }
}

/// Decode `content` into `sections`.
///
/// Returns the warnings collected along the way: headers and variables that
/// the schema has no place for. Decoding continues past warnings.
///
/// # Errors
///
/// Returns [`CodecError::Syntax`] for malformed lines and variables outside
/// of any section, and [`CodecError::InvalidValue`] when a value does not
/// convert to its property type.
pub fn decode<S: Sections + ?Sized>(content: &str, sections: &mut S) -> Result<Warnings, CodecError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut warnings = Vec::new();
    let mut current: Option<Header> = None;
    let mut lines = content.lines().enumerate();

    while let Some((line_num, line)) = lines.next() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with([';', '#']) {
            continue;
        }

        if trimmed.starts_with('[') {
            let header = parse_header(trimmed).map_err(|message| syntax(line_num, message))?;
            tracing::trace!(
                "section [{}{}]",
                header.name,
                header
                    .subsection
                    .as_deref()
                    .map(|sub| format!(" \"{sub}\""))
                    .unwrap_or_default()
            );
            if sections
                .section(&header.name, header.subsection.as_deref())
                .is_none()
            {
                warnings.push(header.warning(None));
            }
            current = Some(header);
            continue;
        }

        let Some(header) = &current else {
            return Err(syntax(
                line_num,
                format!("variable outside of section: {trimmed}"),
            ));
        };
        let logical = join_continued(trimmed, &mut lines);
        let (name, raw) = parse_variable(&logical).map_err(|message| syntax(line_num, message))?;

        let Some(record) = sections.section(&header.name, header.subsection.as_deref()) else {
            warnings.push(header.warning(Some(name)));
            continue;
        };
        match record.assign(name, raw.as_deref()) {
            Ok(true) => {}
            Ok(false) => warnings.push(header.warning(Some(name))),
            Err(source) => {
                return Err(CodecError::InvalidValue {
                    section: header.name.clone(),
                    variable: name.to_string(),
                    source,
                });
            }
        }
    }

    Ok(Warnings(warnings))
}

fn syntax(line_index: usize, message: impl Into<String>) -> CodecError {
    CodecError::Syntax {
        line: line_index + 1,
        message: message.into(),
    }
}

/// Join the lines of a variable whose value ends in a backslash.
///
/// The backslash and the line break are dropped. A continuation on the last
/// line is left in place for the value parser to reject.
fn join_continued<'a>(
    first: &'a str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Cow<'a, str> {
    if !continues(first) {
        return Cow::Borrowed(first);
    }
    let mut joined = first.to_string();
    while continues(&joined) {
        let Some((_, next)) = lines.next() else {
            break;
        };
        joined.pop();
        joined.push_str(next.trim_end());
    }
    Cow::Owned(joined)
}

/// Whether a variable line ends in a backslash that escapes nothing, outside
/// of any comment.
fn continues(line: &str) -> bool {
    let mut quoted = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' if chars.next().is_none() => return true,
            ';' | '#' if !quoted => return false,
            _ => {}
        }
    }
    false
}

/// Parse a `[name]` or `[name "subsection"]` line.
fn parse_header(line: &str) -> Result<Header, String> {
    let rest = line
        .strip_prefix('[')
        .ok_or_else(|| format!("invalid section header: {line}"))?;
    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == ']' || c == '"')
        .ok_or_else(|| format!("unterminated section header: {line}"))?;
    let (name, rest) = rest.split_at(name_end);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') {
        return Err(format!("invalid section name {name:?}"));
    }

    let mut rest = rest.trim_start();
    let subsection = match rest.strip_prefix('"') {
        Some(quoted) => {
            let (subsection, after) = parse_quoted(quoted)?;
            rest = after.trim_start();
            Some(subsection)
        }
        None => None,
    };

    let after = rest
        .strip_prefix(']')
        .ok_or_else(|| format!("unterminated section header: {line}"))?
        .trim_start();
    if !after.is_empty() && !after.starts_with([';', '#']) {
        return Err(format!("unexpected text after section header: {after}"));
    }

    Ok(Header {
        name: name.to_string(),
        subsection,
    })
}

/// Parse the inside of a quoted subsection name; `text` starts after the
/// opening quote. Returns the name and the text after the closing quote.
fn parse_quoted(text: &str) -> Result<(String, &str), String> {
    let mut name = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok((name, chars.as_str())),
            '\\' => name.push(unescape(chars.next())?),
            _ => name.push(c),
        }
    }
    Err("unterminated subsection name".to_string())
}

/// Parse a `name = value` or bare `name` line.
fn parse_variable(line: &str) -> Result<(&str, Option<String>), String> {
    let name_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(line.len());
    let (name, rest) = line.split_at(name_end);
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(format!("invalid variable name in line: {line}"));
    }

    let rest = rest.trim_start();
    if rest.is_empty() || rest.starts_with([';', '#']) {
        return Ok((name, None));
    }
    let value = rest
        .strip_prefix('=')
        .ok_or_else(|| format!("expected '=' after variable \"{name}\""))?;
    Ok((name, Some(parse_value(value)?)))
}

/// Parse a value: trim, strip comments, join quoted parts, resolve escapes.
fn parse_value(text: &str) -> Result<String, String> {
    let mut value = String::new();
    let mut quoted = false;
    // Length of `value` without trailing unquoted whitespace.
    let mut keep = 0;
    let mut chars = text.trim_start().chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                keep = value.len();
            }
            '\\' => {
                value.push(unescape(chars.next())?);
                keep = value.len();
            }
            ';' | '#' if !quoted => break,
            _ => {
                value.push(c);
                if quoted || !c.is_whitespace() {
                    keep = value.len();
                }
            }
        }
    }

    if quoted {
        return Err("unterminated quoted value".to_string());
    }
    value.truncate(keep);
    Ok(value)
}

fn unescape(c: Option<char>) -> Result<char, String> {
    match c {
        Some('"') => Ok('"'),
        Some('\\') => Ok('\\'),
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('b') => Ok('\u{8}'),
        Some(other) => Err(format!("invalid escape sequence \\{other}")),
        None => Err("unfinished escape sequence".to_string()),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ini_record;

    #[derive(Debug, Default, PartialEq)]
    struct Props {
        name: String,
        count: i32,
        enabled: bool,
    }

    ini_record!(Props {
        name => "name,omitempty",
        count => "count,omitempty",
        enabled => "enabled-flag,omitempty",
    });

    /// Accepts `[Main]` and `[Keyed "..."]`.
    #[derive(Debug, Default)]
    struct Doc {
        main: Props,
        keyed: BTreeMap<String, Props>,
    }

    impl Sections for Doc {
        fn section(&mut self, name: &str, subsection: Option<&str>) -> Option<&mut dyn RecordMut> {
            match (name.to_ascii_lowercase().as_str(), subsection) {
                ("main", None) => Some(&mut self.main),
                ("keyed", Some(key)) => Some(self.keyed.entry(key.to_string()).or_default()),
                _ => None,
            }
        }
    }

    fn decode_doc(content: &str) -> (Doc, Warnings) {
        let mut doc = Doc::default();
        let warnings = decode(content, &mut doc).expect("test data should decode");
        (doc, warnings)
    }

    #[test]
    fn decode_simple_section() {
        let (doc, warnings) = decode_doc("[Main]\nname = vc\ncount = 3\nenabled-flag = true\n");
        assert!(warnings.is_empty());
        assert_eq!(
            doc.main,
            Props {
                name: "vc".to_string(),
                count: 3,
                enabled: true,
            }
        );
    }

    #[test]
    fn names_are_case_insensitive() {
        let (doc, warnings) = decode_doc("[MAIN]\nNAME = vc\nEnabled-Flag\n");
        assert!(warnings.is_empty());
        assert_eq!(doc.main.name, "vc");
        assert!(doc.main.enabled, "bare boolean should be true");
    }

    #[test]
    fn keyed_header_without_variables_creates_entry() {
        let (doc, _) = decode_doc("[Keyed \"0.0.0.0\"]\n[Keyed \"1.1.1.1\"]\ncount = 2\n");
        assert_eq!(doc.keyed.len(), 2);
        assert_eq!(doc.keyed["0.0.0.0"], Props::default());
        assert_eq!(doc.keyed["1.1.1.1"].count, 2);
    }

    #[test]
    fn subsection_names_keep_case_and_escapes() {
        let (doc, _) = decode_doc("[keyed \"VC \\\"A\\\"\"]\n");
        assert!(doc.keyed.contains_key("VC \"A\""));
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let (doc, warnings) =
            decode_doc("; leading comment\n\n# another\n[Main] ; trailing\nname = vc # inline\n");
        assert!(warnings.is_empty());
        assert_eq!(doc.main.name, "vc");
    }

    #[test]
    fn indented_content_is_accepted() {
        let (doc, _) = decode_doc("\n\t\t[Main]\n\t\tname = vc\n\t\t");
        assert_eq!(doc.main.name, "vc");
    }

    #[test]
    fn quoted_values() {
        let (doc, _) = decode_doc("[Main]\nname = \"  spaced ; not a comment  \"\n");
        assert_eq!(doc.main.name, "  spaced ; not a comment  ");

        let (doc, _) = decode_doc("[Main]\nname = \"vccreds\"\n");
        assert_eq!(doc.main.name, "vccreds");

        let (doc, _) = decode_doc("[Main]\nname = a\\tb \"c\"d  \n");
        assert_eq!(doc.main.name, "a\tb cd");
    }

    #[test]
    fn equals_in_value_is_kept() {
        let (doc, _) = decode_doc("[Main]\nname = val=ue\n");
        assert_eq!(doc.main.name, "val=ue");
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let (doc, warnings) = decode_doc("\u{feff}[Main]\nname = vc\n");
        assert!(warnings.is_empty());
        assert_eq!(doc.main.name, "vc");
    }

    #[test]
    fn trailing_backslash_continues_value() {
        let (doc, warnings) = decode_doc("[Main]\nname = ab\\\ncd\ncount = 2\n");
        assert!(warnings.is_empty());
        assert_eq!(doc.main.name, "abcd");
        assert_eq!(doc.main.count, 2);

        let (doc, _) = decode_doc("[Main]\nname = a\\\nb\\\nc\n");
        assert_eq!(doc.main.name, "abc");
    }

    #[test]
    fn continuation_inside_quotes_keeps_whitespace() {
        let (doc, _) = decode_doc("[Main]\nname = \"a b\\\n c\"\n");
        assert_eq!(doc.main.name, "a b c");
    }

    #[test]
    fn escaped_or_commented_backslash_does_not_continue() {
        let (doc, _) = decode_doc("[Main]\nname = a\\\\\ncount = 1\n");
        assert_eq!(doc.main.name, "a\\");
        assert_eq!(doc.main.count, 1);

        let (doc, _) = decode_doc("[Main]\nname = a ; note \\\ncount = 1\n");
        assert_eq!(doc.main.name, "a");
        assert_eq!(doc.main.count, 1);
    }

    #[test]
    fn line_numbers_count_continued_lines() {
        let mut doc = Doc::default();
        assert!(matches!(
            decode("[Main]\nname = a\\\nb\n[Broken\n", &mut doc),
            Err(CodecError::Syntax { line: 4, .. })
        ));
    }

    #[test]
    fn unknown_variable_is_a_warning() {
        let (doc, warnings) = decode_doc("[Main]\nserver = deprecated\nname = vc\n");
        assert_eq!(doc.main.name, "vc");
        assert_eq!(
            warnings.0,
            vec![Warning {
                section: "Main".to_string(),
                subsection: None,
                variable: Some("server".to_string()),
            }]
        );
    }

    #[test]
    fn unknown_section_warns_for_header_and_variables() {
        let (_, warnings) = decode_doc("[Other \"x\"]\nkey = value\n");
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings.to_string(),
            "warning:\ncan't store data at section \"Other\", subsection \"x\"\n\
             can't store data at section \"Other\", subsection \"x\", variable \"key\"\n"
        );
    }

    #[test]
    fn keyed_section_without_key_is_a_warning() {
        let (doc, warnings) = decode_doc("[Keyed]\ncount = 1\n");
        assert!(doc.keyed.is_empty());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn variable_outside_section_fails() {
        let mut doc = Doc::default();
        let err = decode("name = orphan\n", &mut doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid INI syntax at line 1: variable outside of section: name = orphan"
        );
    }

    #[test]
    fn malformed_lines_fail_with_line_number() {
        for (content, line) in [
            ("[Main\n", 1),
            ("[Main]\n[Keyed \"open]\n", 2),
            ("[Main]\n\nname = \"unterminated\n", 3),
            ("[Main]\nname value\n", 2),
            ("[Main]\n1name = x\n", 2),
            ("[Main]\nname = bad\\qescape\n", 2),
            ("[Main]\nname = dangling\\\n", 2),
            ("[Main] trailing\n", 1),
        ] {
            let mut doc = Doc::default();
            match decode(content, &mut doc) {
                Err(CodecError::Syntax { line: actual, .. }) => {
                    assert_eq!(actual, line, "wrong line for {content:?}");
                }
                other => panic!("expected syntax error for {content:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn conversion_failure_is_fatal() {
        let mut doc = Doc::default();
        let err = decode("[Main]\ncount = many\n", &mut doc).unwrap_err();
        match err {
            CodecError::InvalidValue {
                section, variable, ..
            } => {
                assert_eq!(section, "Main");
                assert_eq!(variable, "count");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn bare_string_variable_is_fatal() {
        let mut doc = Doc::default();
        assert!(matches!(
            decode("[Main]\nname\n", &mut doc),
            Err(CodecError::InvalidValue { .. })
        ));
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        let (doc, warnings) = decode_doc("");
        assert!(warnings.is_empty());
        assert_eq!(doc.main, Props::default());
        assert!(doc.keyed.is_empty());
    }
}
