//! The sections of the cloud provider configuration.
use serde::{Deserialize, Serialize};

use super::omit;
use crate::ini_record;

/// The `[Global]` section: defaults shared by every vCenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Skip TLS verification of the vCenter certificate.
    #[serde(skip_serializing_if = "omit")]
    pub insecure: bool,
    /// Round trips allowed for a single SOAP call.
    #[serde(skip_serializing_if = "omit")]
    pub round_tripper_count: i32,
    /// vCenter user name.
    #[serde(skip_serializing_if = "omit")]
    pub username: String,
    /// vCenter password.
    #[serde(skip_serializing_if = "omit")]
    pub password: String,
    /// Name of the Kubernetes secret holding vCenter credentials.
    #[serde(skip_serializing_if = "omit")]
    pub secret_name: String,
    /// Namespace of the credentials secret.
    #[serde(skip_serializing_if = "omit")]
    pub secret_namespace: String,
    /// vCenter port.
    #[serde(skip_serializing_if = "omit")]
    pub port: String,
    /// Path to a CA bundle used to verify vCenter certificates.
    #[serde(skip_serializing_if = "omit")]
    pub ca_file: String,
    /// Expected certificate thumbprint.
    #[serde(skip_serializing_if = "omit")]
    pub thumbprint: String,
    /// Comma-separated list of datacenters to manage.
    #[serde(skip_serializing_if = "omit")]
    pub datacenters: String,
    /// Service account the cloud provider runs as.
    #[serde(skip_serializing_if = "omit")]
    pub service_account: String,
    /// Directory containing one credentials file per vCenter.
    #[serde(skip_serializing_if = "omit")]
    pub secrets_directory: String,
    /// Disable the cloud provider's informational API.
    #[serde(skip_serializing_if = "omit")]
    pub api_disable: bool,
    /// Address the informational API binds to.
    #[serde(skip_serializing_if = "omit")]
    pub api_binding: String,
}

ini_record!(GlobalConfig {
    insecure => "insecure-flag,omitempty",
    round_tripper_count => "soap-roundtrip-count,omitempty",
    username => "user,omitempty",
    password => "password,omitempty",
    secret_name => "secret-name,omitempty",
    secret_namespace => "secret-namespace,omitempty",
    port => "port,omitempty",
    ca_file => "ca-file,omitempty",
    thumbprint => "thumbprint,omitempty",
    datacenters => "datacenters,omitempty",
    service_account => "service-account,omitempty",
    secrets_directory => "secrets-directory,omitempty",
    api_disable => "api-disable,omitempty",
    api_binding => "api-binding,omitempty",
});

/// A `[VirtualCenter "<server>"]` section. Unset fields fall back to
/// [`GlobalConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualCenterConfig {
    /// vCenter user name.
    #[serde(skip_serializing_if = "omit")]
    pub username: String,
    /// vCenter password.
    #[serde(skip_serializing_if = "omit")]
    pub password: String,
    /// vCenter port.
    #[serde(skip_serializing_if = "omit")]
    pub port: String,
    /// Comma-separated list of datacenters on this vCenter.
    #[serde(skip_serializing_if = "omit")]
    pub datacenters: String,
    /// Round trips allowed for a single SOAP call.
    #[serde(skip_serializing_if = "omit")]
    pub round_tripper_count: i32,
    /// Expected certificate thumbprint.
    #[serde(skip_serializing_if = "omit")]
    pub thumbprint: String,
}

ini_record!(VirtualCenterConfig {
    username => "user,omitempty",
    password => "password,omitempty",
    port => "port,omitempty",
    datacenters => "datacenters,omitempty",
    round_tripper_count => "soap-roundtrip-count,omitempty",
    thumbprint => "thumbprint,omitempty",
});

/// The `[Network]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Name of the network whose addresses are reported as public.
    #[serde(skip_serializing_if = "omit")]
    pub name: String,
}

ini_record!(NetworkConfig {
    name => "public-network,omitempty",
});

/// The `[Disk]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiskConfig {
    /// SCSI controller type used for attached volumes.
    #[serde(skip_serializing_if = "omit")]
    pub scsi_controller_type: String,
}

ini_record!(DiskConfig {
    scsi_controller_type => "scsicontrollertype,omitempty",
});

/// The `[Workspace]` section: where the provider creates volumes and VMs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// vCenter server hosting the workspace.
    #[serde(skip_serializing_if = "omit")]
    pub server: String,
    /// Datacenter of the workspace.
    #[serde(skip_serializing_if = "omit")]
    pub datacenter: String,
    /// VM folder of the workspace.
    #[serde(skip_serializing_if = "omit")]
    pub folder: String,
    /// Datastore used when a volume names none.
    #[serde(skip_serializing_if = "omit")]
    pub datastore: Option<String>,
    /// Resource pool path of the workspace.
    #[serde(skip_serializing_if = "omit")]
    pub resource_pool: String,
}

ini_record!(WorkspaceConfig {
    server => "server,omitempty",
    datacenter => "datacenter,omitempty",
    folder => "folder,omitempty",
    datastore => "default-datastore,omitempty",
    resource_pool => "resourcepool-path,omitempty",
});

/// The `[Labels]` section: vSphere tag categories mapped to topology labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    /// Tag category that provides the zone label.
    #[serde(skip_serializing_if = "omit")]
    pub zone: String,
    /// Tag category that provides the region label.
    #[serde(skip_serializing_if = "omit")]
    pub region: String,
}

ini_record!(LabelConfig {
    zone => "zone,omitempty",
    region => "region,omitempty",
});

/// Settings for the cloud provider deployment itself. Never part of the INI
/// text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Container image of the cloud provider.
    #[serde(skip_serializing_if = "omit")]
    pub image: String,
    /// Extra command line arguments for the cloud provider.
    #[serde(skip_serializing_if = "omit")]
    pub extra_args: Vec<String>,
}

ini_record!(ProviderConfig { image, extra_args });
