//! The vSphere cloud provider configuration.
//!
//! [`Config`] is the `vsphere.conf` file read by the vSphere cloud provider:
//!
//! ```ini
//! [Global]
//! secret-name = vccreds
//! secret-namespace = kube-system
//!
//! [VirtualCenter "10.0.0.1"]
//! datacenters = dc0
//!
//! [Workspace]
//! server = 10.0.0.1
//! datacenter = dc0
//! folder = kubernetes
//! ```
//!
//! The same model serializes to JSON through serde so it can be embedded in
//! cluster objects. Both representations drop empty fields.

mod sections;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use sections::{
    DiskConfig, GlobalConfig, LabelConfig, NetworkConfig, ProviderConfig, VirtualCenterConfig,
    WorkspaceConfig,
};

use crate::empty;
use crate::error::CodecError;
use crate::ini::Sections;
use crate::marshal::marshal;
use crate::schema::{Field, FieldTag, Reflect, Record, RecordMut, Value};
use crate::unmarshal::{Mentioned, Shadow, UnmarshalOptions, collapse, unmarshal};

const GLOBAL: &str = "Global,omitempty";
const VIRTUAL_CENTER: &str = "VirtualCenter,omitempty";
const NETWORK: &str = "Network,omitempty";
const DISK: &str = "Disk,omitempty";
const WORKSPACE: &str = "Workspace,omitempty";
const LABELS: &str = "Labels,omitempty";

/// The cloud provider configuration.
///
/// Sections are written in field order. `provider_config` describes the
/// provider deployment and never appears in the INI text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// `[Global]`
    #[serde(skip_serializing_if = "omit")]
    pub global: GlobalConfig,
    /// `[VirtualCenter "<server>"]`, one per vCenter.
    #[serde(skip_serializing_if = "omit")]
    pub virtual_center: BTreeMap<String, VirtualCenterConfig>,
    /// `[Network]`
    #[serde(skip_serializing_if = "omit")]
    pub network: NetworkConfig,
    /// `[Disk]`
    #[serde(skip_serializing_if = "omit")]
    pub disk: DiskConfig,
    /// `[Workspace]`
    #[serde(skip_serializing_if = "omit")]
    pub workspace: WorkspaceConfig,
    /// `[Labels]`
    #[serde(skip_serializing_if = "omit")]
    pub labels: LabelConfig,
    /// Deployment settings for the provider itself.
    #[serde(skip_serializing_if = "omit")]
    pub provider_config: ProviderConfig,
}

impl Reflect for Config {
    fn reflect(&self) -> Value<'_> {
        Value::Record(self)
    }
}

impl Record for Config {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::tagged("global", GLOBAL, &self.global),
            Field::tagged("virtual_center", VIRTUAL_CENTER, &self.virtual_center),
            Field::tagged("network", NETWORK, &self.network),
            Field::tagged("disk", DISK, &self.disk),
            Field::tagged("workspace", WORKSPACE, &self.workspace),
            Field::tagged("labels", LABELS, &self.labels),
            Field::untagged("provider_config", &self.provider_config),
        ]
    }
}

impl Config {
    /// Marshal the configuration to INI text.
    ///
    /// # Errors
    ///
    /// See [`marshal`](crate::marshal()).
    pub fn marshal_ini(&self) -> Result<Vec<u8>, CodecError> {
        marshal(Some(self))
    }

    /// Replace the INI sections of this configuration with `data`.
    ///
    /// `provider_config` is kept. Nothing changes when an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsphere_cloud_config::UnmarshalOptions;
    /// use vsphere_cloud_config::cloud::Config;
    ///
    /// let mut config = Config::default();
    /// config
    ///     .unmarshal_ini(b"[VirtualCenter \"10.0.0.1\"]\n", UnmarshalOptions::default())
    ///     .unwrap();
    /// assert!(config.virtual_center.contains_key("10.0.0.1"));
    ///
    /// let err = config
    ///     .unmarshal_ini(b"[Global]\nvm-uuid = x\n", UnmarshalOptions::warn_as_fatal())
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "warning:\ncan't store data at section \"Global\", variable \"vm-uuid\"\n"
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// See [`unmarshal`](crate::unmarshal()).
    pub fn unmarshal_ini(&mut self, data: &[u8], options: UnmarshalOptions) -> Result<(), CodecError> {
        unmarshal::<ShadowConfig>(data, self, options)
    }

    /// Read and unmarshal a `vsphere.conf` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not unmarshal.
    pub fn from_ini_file(path: &Path, options: UnmarshalOptions) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read cloud config file: {}", path.display()))?;

        let mut config = Self::default();
        config
            .unmarshal_ini(&data, options)
            .with_context(|| format!("Failed to parse cloud config: {}", path.display()))?;
        tracing::debug!(
            "loaded cloud config from {} ({} vCenter(s))",
            path.display(),
            config.virtual_center.len()
        );
        Ok(config)
    }

    /// Whether the configuration holds no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        omit(self)
    }
}

/// `skip_serializing_if` predicate: the serde form drops what `omitempty` drops.
///
/// Every field type in this module has an emptiness rule, so evaluation only
/// fails if an unsupported kind is added to the schema. Such a value is kept.
fn omit<T: Reflect>(value: &T) -> bool {
    let verdict = empty::is_empty(value);
    debug_assert!(
        verdict.is_ok(),
        "cloud config field has no emptiness rule: {verdict:?}"
    );
    verdict.unwrap_or(false)
}

/// Decode-time mirror of [`Config`].
///
/// `[VirtualCenter "<server>"]` entries remember whether their header was
/// seen, so a vCenter listed without properties is kept as a default entry.
#[derive(Debug, Default)]
pub struct ShadowConfig {
    global: GlobalConfig,
    virtual_center: BTreeMap<String, Mentioned<VirtualCenterConfig>>,
    network: NetworkConfig,
    disk: DiskConfig,
    workspace: WorkspaceConfig,
    labels: LabelConfig,
}

impl Sections for ShadowConfig {
    fn section(&mut self, name: &str, subsection: Option<&str>) -> Option<&mut dyn RecordMut> {
        let is = |ident: &'static str, metadata: &'static str| {
            FieldTag::resolve(ident, Some(metadata)).is_some_and(|tag| tag.matches(name))
        };
        match subsection {
            None if is("global", GLOBAL) => Some(&mut self.global),
            None if is("network", NETWORK) => Some(&mut self.network),
            None if is("disk", DISK) => Some(&mut self.disk),
            None if is("workspace", WORKSPACE) => Some(&mut self.workspace),
            None if is("labels", LABELS) => Some(&mut self.labels),
            Some(server) if is("virtual_center", VIRTUAL_CENTER) => Some(
                self.virtual_center
                    .entry(server.to_string())
                    .or_default()
                    .mark(),
            ),
            _ => None,
        }
    }
}

impl Shadow for ShadowConfig {
    type Target = Config;

    fn flatten(self, target: &mut Config) {
        target.global = self.global;
        target.virtual_center = collapse(self.virtual_center);
        target.network = self.network;
        target.disk = self.disk;
        target.workspace = self.workspace;
        target.labels = self.labels;
    }
}
