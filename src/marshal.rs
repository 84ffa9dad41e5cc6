//! INI serialization.
//!
//! Sections are written in the order the configuration declares them. A
//! map-valued section becomes one `[Name "key"]` block per entry; any other
//! section becomes a single `[Name]` block. Inside a block each tagged
//! property is written as `name = value`.

use std::fmt::Write as _;

use crate::empty;
use crate::error::CodecError;
use crate::schema::{Reflect, Record, Value};

/// Marshal a configuration to INI text.
///
/// # Examples
///
/// ```
/// use vsphere_cloud_config::cloud::{Config, WorkspaceConfig};
/// use vsphere_cloud_config::marshal;
///
/// let config = Config {
///     workspace: WorkspaceConfig {
///         server: "10.0.0.1".to_string(),
///         folder: "kubernetes".to_string(),
///         ..WorkspaceConfig::default()
///     },
///     ..Config::default()
/// };
/// let text = marshal(Some(&config)).unwrap();
/// assert_eq!(
///     String::from_utf8(text).unwrap(),
///     "[Workspace]\nserver = 10.0.0.1\nfolder = kubernetes\n"
/// );
/// ```
///
/// # Errors
///
/// Returns [`CodecError::NilConfig`] when `config` is `None`, and
/// [`CodecError::UnsupportedKind`] when a section or property has a kind the
/// marshaller cannot write.
pub fn marshal<R: Record + ?Sized>(config: Option<&R>) -> Result<Vec<u8>, CodecError> {
    let config = config.ok_or(CodecError::NilConfig)?;
    let mut out = String::new();

    for section in config.fields() {
        let Some(tag) = section.tag() else {
            continue;
        };
        if tag.omit_empty && empty::evaluate(section.value.reflect())? {
            tracing::trace!("omitting empty section [{}]", tag.name);
            continue;
        }

        match deref(section.value.reflect()) {
            Some(Value::Map(map)) => {
                for (key, body) in map.entries() {
                    let header = format!("{} \"{}\"", tag.name, escape(key));
                    write_section(&mut out, &header, body)?;
                }
            }
            _ => write_section(&mut out, tag.name, section.value)?,
        }
    }

    Ok(out.into_bytes())
}

fn write_section(out: &mut String, header: &str, body: &dyn Reflect) -> Result<(), CodecError> {
    let record = match deref(body.reflect()) {
        Some(Value::Record(record)) => Some(record),
        None => None,
        Some(other) => return Err(CodecError::UnsupportedKind(other.kind())),
    };

    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "[{header}]")?;
    tracing::trace!("writing section [{header}]");

    let Some(record) = record else {
        return Ok(());
    };
    for property in record.fields() {
        let Some(tag) = property.tag() else {
            continue;
        };
        if tag.omit_empty && empty::evaluate(property.value.reflect())? {
            continue;
        }
        match deref(property.value.reflect()) {
            Some(value) => writeln!(out, "{} = {}", tag.name, format_scalar(value)?)?,
            None => writeln!(out, "{}", tag.name)?,
        }
    }
    Ok(())
}

/// Strip optional wrapping; `None` when the value is absent.
fn deref(mut value: Value<'_>) -> Option<Value<'_>> {
    while let Value::Optional(inner) = value {
        value = inner?.reflect();
    }
    Some(value)
}

fn format_scalar(value: Value<'_>) -> Result<String, CodecError> {
    match value {
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Int(number) => Ok(number.to_string()),
        Value::Uint(number) => Ok(number.to_string()),
        Value::Float(number) => Ok(number.to_string()),
        Value::Str(text) if needs_quotes(text) => Ok(format!("\"{}\"", escape(text))),
        Value::Str(text) => Ok(text.to_string()),
        other => Err(CodecError::UnsupportedKind(other.kind())),
    }
}

/// Values that would not read back unchanged when written bare.
fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.trim() != text
        || text.contains(['"', '\\', ';', '#', '\n', '\t'])
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}
