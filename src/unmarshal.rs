//! INI deserialization.
//!
//! Text is decoded into a shadow of the target configuration first. The
//! shadow differs from the target only in how keyed sections are held: each
//! entry is a [`Mentioned`] value, so a `[Section "key"]` header with no
//! properties still produces an entry. Once decoding succeeded and the warning
//! policy has been applied, the shadow is flattened into the target.

use std::collections::BTreeMap;

use crate::error::{CodecError, Warnings};
use crate::ini::{self, Sections};

/// Options that influence how INI data is unmarshalled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnmarshalOptions {
    /// Treat decoder warnings (deprecated or unknown keys) as fatal errors.
    pub warn_as_fatal: bool,
}

impl UnmarshalOptions {
    /// Options with warnings treated as fatal errors.
    #[must_use]
    pub const fn warn_as_fatal() -> Self {
        Self {
            warn_as_fatal: true,
        }
    }
}

/// A decode-time mirror of a configuration type.
pub trait Shadow: Sections + Default {
    /// The public configuration the shadow flattens into.
    type Target;

    /// Move the decoded sections into `target`.
    fn flatten(self, target: &mut Self::Target);
}

/// A keyed-section entry together with whether its header was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mentioned<T> {
    /// The header for this entry appeared in the input.
    pub present: bool,
    /// The entry's properties, default until assigned.
    pub value: T,
}

impl<T> Mentioned<T> {
    /// Record that the entry was mentioned and return its value for assignment.
    pub const fn mark(&mut self) -> &mut T {
        self.present = true;
        &mut self.value
    }
}

/// Collapse shadow entries into plain values, keeping every mentioned key.
#[must_use]
pub fn collapse<T>(entries: BTreeMap<String, Mentioned<T>>) -> BTreeMap<String, T> {
    entries
        .into_iter()
        .filter(|(_, entry)| entry.present)
        .map(|(key, entry)| (key, entry.value))
        .collect()
}

/// Unmarshal INI data into `target` through the shadow type `S`.
///
/// `target` is only modified when the whole document was accepted.
///
/// # Errors
///
/// Returns [`CodecError::Encoding`] for non-UTF-8 input, the decoder's fatal
/// errors ([`CodecError::Syntax`], [`CodecError::InvalidValue`]) unchanged,
/// and [`CodecError::Warnings`] when `options.warn_as_fatal` is set and the
/// input contained data the schema has no place for.
pub fn unmarshal<S: Shadow>(
    data: &[u8],
    target: &mut S::Target,
    options: UnmarshalOptions,
) -> Result<(), CodecError> {
    let content = std::str::from_utf8(data)?;
    let mut shadow = S::default();
    let warnings = ini::decode(content, &mut shadow)?;
    apply_policy(warnings, options)?;
    shadow.flatten(target);
    Ok(())
}

fn apply_policy(warnings: Warnings, options: UnmarshalOptions) -> Result<(), CodecError> {
    if warnings.is_empty() {
        return Ok(());
    }
    if options.warn_as_fatal {
        return Err(CodecError::Warnings(warnings));
    }
    for warning in warnings.iter() {
        tracing::debug!("ignoring INI warning: {warning}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::Warning;
    use crate::ini_record;
    use crate::schema::RecordMut;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Props {
        name: String,
        size: i64,
    }

    ini_record!(Props {
        name => "name,omitempty",
        size => "size,omitempty",
    });

    #[derive(Debug, Default, PartialEq)]
    struct Target {
        main: Props,
        keyed: BTreeMap<String, Props>,
        untouched: String,
    }

    #[derive(Default)]
    struct TargetShadow {
        main: Props,
        keyed: BTreeMap<String, Mentioned<Props>>,
    }

    impl Sections for TargetShadow {
        fn section(&mut self, name: &str, subsection: Option<&str>) -> Option<&mut dyn RecordMut> {
            match (name.to_ascii_lowercase().as_str(), subsection) {
                ("main", None) => Some(&mut self.main),
                ("keyed", Some(key)) => Some(self.keyed.entry(key.to_string()).or_default().mark()),
                _ => None,
            }
        }
    }

    impl Shadow for TargetShadow {
        type Target = Target;

        fn flatten(self, target: &mut Target) {
            target.main = self.main;
            target.keyed = collapse(self.keyed);
        }
    }

    fn run(content: &str, options: UnmarshalOptions) -> (Result<(), CodecError>, Target) {
        let mut target = Target {
            untouched: "kept".to_string(),
            ..Target::default()
        };
        let result = unmarshal::<TargetShadow>(content.as_bytes(), &mut target, options);
        (result, target)
    }

    #[test]
    fn options_default_to_lenient() {
        assert!(!UnmarshalOptions::default().warn_as_fatal);
        assert!(UnmarshalOptions::warn_as_fatal().warn_as_fatal);
    }

    #[test]
    fn flattens_sections_and_keeps_unmirrored_fields() {
        let (result, target) = run(
            "[Main]\nname = a\nsize = 2\n[Keyed \"x\"]\n[Keyed \"y\"]\nsize = 9\n",
            UnmarshalOptions::default(),
        );
        result.unwrap();
        assert_eq!(target.main.name, "a");
        assert_eq!(target.main.size, 2);
        assert_eq!(target.keyed.len(), 2);
        assert_eq!(target.keyed["x"], Props::default());
        assert_eq!(target.keyed["y"].size, 9);
        assert_eq!(target.untouched, "kept");
    }

    #[test]
    fn previous_entries_are_replaced() {
        let mut target = Target::default();
        target.keyed.insert("stale".to_string(), Props::default());
        unmarshal::<TargetShadow>(b"[Keyed \"fresh\"]\n", &mut target, UnmarshalOptions::default())
            .unwrap();
        assert_eq!(target.keyed.keys().collect::<Vec<_>>(), ["fresh"]);
    }

    #[test]
    fn warnings_are_dropped_by_default() {
        let (result, target) = run("[Main]\nlegacy = 1\nname = a\n", UnmarshalOptions::default());
        result.unwrap();
        assert_eq!(target.main.name, "a");
    }

    #[test]
    fn warnings_are_fatal_on_request() {
        let (result, target) = run(
            "[Main]\nlegacy = 1\nname = a\n",
            UnmarshalOptions::warn_as_fatal(),
        );
        match result.unwrap_err() {
            CodecError::Warnings(warnings) => assert_eq!(
                warnings.0,
                vec![Warning {
                    section: "Main".to_string(),
                    subsection: None,
                    variable: Some("legacy".to_string()),
                }]
            ),
            other => panic!("expected warnings, got {other:?}"),
        }
        assert_eq!(target.main, Props::default(), "target must stay untouched");
    }

    #[test]
    fn fatal_errors_ignore_the_policy() {
        for options in [UnmarshalOptions::default(), UnmarshalOptions::warn_as_fatal()] {
            let (result, target) = run("[Main]\nsize = big\n", options);
            assert!(matches!(result, Err(CodecError::InvalidValue { .. })));
            assert_eq!(target.main, Props::default());
        }
    }

    #[test]
    fn non_utf8_input_fails() {
        let mut target = Target::default();
        let err = unmarshal::<TargetShadow>(&[b'[', 0xff, b']'], &mut target, UnmarshalOptions::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::Encoding(_)));
    }

    #[test]
    fn collapse_drops_unmentioned_entries() {
        let mut entries = BTreeMap::new();
        entries.insert("seen".to_string(), Mentioned { present: true, value: 1 });
        entries.insert("unseen".to_string(), Mentioned { present: false, value: 2 });
        let collapsed = collapse(entries);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed["seen"], 1);
    }

    /// Collects the messages of every event emitted while it is installed.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<String>>>);

    struct MessageExtractor(String);

    impl tracing::field::Visit for MessageExtractor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut extractor = MessageExtractor(String::new());
            event.record(&mut extractor);
            self.0.lock().unwrap().push(extractor.0);
        }
    }

    #[test]
    fn dropped_warnings_are_logged_at_debug() {
        use tracing_subscriber::layer::SubscriberExt as _;

        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
        let (result, _) = run("[Main]\nlegacy = 1\n", UnmarshalOptions::default());
        drop(guard);

        result.unwrap();
        let messages = capture.0.lock().unwrap();
        assert!(
            messages.iter().any(|m| m
                == "ignoring INI warning: can't store data at section \"Main\", variable \"legacy\""),
            "got {messages:?}"
        );
    }
}
