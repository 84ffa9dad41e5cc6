//! Field metadata resolution.
//!
//! Every field of a record may carry an INI metadata string of the form
//! `name[,omitempty]`. The name is the key written to (and matched in) the INI
//! text; `omitempty` suppresses the field when its value is empty.

/// The resolved INI name and omission flag of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag<'a> {
    /// Name used for the section or property in INI text.
    pub name: &'a str,
    /// Skip the field when its value is empty.
    pub omit_empty: bool,
}

impl<'a> FieldTag<'a> {
    /// Resolve the metadata of a field.
    ///
    /// Returns `None` when the field has no metadata at all; such fields are
    /// invisible to the codec. An empty name or `-` keeps the field's own
    /// identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsphere_cloud_config::schema::FieldTag;
    ///
    /// let tag = FieldTag::resolve("insecure", Some("insecure-flag,omitempty")).unwrap();
    /// assert_eq!(tag.name, "insecure-flag");
    /// assert!(tag.omit_empty);
    ///
    /// let tag = FieldTag::resolve("Folder", Some("-")).unwrap();
    /// assert_eq!(tag.name, "Folder");
    /// assert!(!tag.omit_empty);
    ///
    /// assert!(FieldTag::resolve("image", None).is_none());
    /// ```
    #[must_use]
    pub fn resolve(ident: &'a str, metadata: Option<&'a str>) -> Option<Self> {
        let mut parts = metadata?.split(',');
        let name = match parts.next() {
            Some(name) if !name.is_empty() && name != "-" => name,
            _ => ident,
        };
        let omit_empty = parts.next() == Some("omitempty");
        Some(Self { name, omit_empty })
    }

    /// Whether `name` from INI text refers to this field.
    ///
    /// Section and variable names are case-insensitive on input.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
