// Shared fixtures for integration tests.
//
// Each fixture pairs a `vsphere.conf` text with the `Config` it decodes to.
// The texts are indented the way they tend to appear when embedded in
// manifests; the decoder trims every line.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;

use vsphere_cloud_config::cloud::{Config, GlobalConfig, VirtualCenterConfig, WorkspaceConfig};
use vsphere_cloud_config::{CodecError, UnmarshalOptions};

/// Global keys that older cloud provider releases accepted and the current
/// schema no longer stores.
pub const DEPRECATED_GLOBAL_KEYS: [&str; 6] = [
    "server",
    "datacenter",
    "datastore",
    "working-dir",
    "vm-name",
    "vm-uuid",
];

/// A named INI text and the configuration it stands for.
pub struct Fixture {
    /// Snapshot and assertion name.
    pub name: &'static str,
    /// INI text as a user would write it.
    pub ini: &'static str,
    /// The configuration the text decodes to.
    pub config: Config,
}

/// Build a `VirtualCenter` map from `(server, section)` pairs.
pub fn vcenters(entries: &[(&str, VirtualCenterConfig)]) -> BTreeMap<String, VirtualCenterConfig> {
    entries
        .iter()
        .map(|(server, section)| ((*server).to_string(), section.clone()))
        .collect()
}

/// The workspace shared by every fixture.
pub fn workspace() -> WorkspaceConfig {
    WorkspaceConfig {
        server: "0.0.0.0".to_string(),
        datacenter: "us-west".to_string(),
        folder: "kubernetes".to_string(),
        ..WorkspaceConfig::default()
    }
}

/// Configurations that survive a marshal/unmarshal round trip.
pub fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            name: "global_credentials",
            ini: r#"
		[Global]
		user = user
		password = password
		datacenters = us-west

		[VirtualCenter "0.0.0.0"]

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		default-datastore = default
		"#,
            config: Config {
                global: GlobalConfig {
                    username: "user".to_string(),
                    password: "password".to_string(),
                    datacenters: "us-west".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[("0.0.0.0", VirtualCenterConfig::default())]),
                workspace: WorkspaceConfig {
                    datastore: Some("default".to_string()),
                    ..workspace()
                },
                ..Config::default()
            },
        },
        Fixture {
            name: "virtual_center_credentials",
            ini: r#"
		[Global]
		port = 443
		insecure-flag = true
		datacenters = us-west

		[VirtualCenter "0.0.0.0"]
		user = user
		password = password

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		"#,
            config: Config {
                global: GlobalConfig {
                    port: "443".to_string(),
                    insecure: true,
                    datacenters: "us-west".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[(
                    "0.0.0.0",
                    VirtualCenterConfig {
                        username: "user".to_string(),
                        password: "password".to_string(),
                        ..VirtualCenterConfig::default()
                    },
                )]),
                workspace: workspace(),
                ..Config::default()
            },
        },
        Fixture {
            name: "secret_reference",
            ini: r#"
		[Global]
		secret-name = "vccreds"
		secret-namespace = "kube-system"
		datacenters = us-west

		[VirtualCenter "0.0.0.0"]

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		"#,
            config: Config {
                global: GlobalConfig {
                    secret_name: "vccreds".to_string(),
                    secret_namespace: "kube-system".to_string(),
                    datacenters: "us-west".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[("0.0.0.0", VirtualCenterConfig::default())]),
                workspace: workspace(),
                ..Config::default()
            },
        },
        Fixture {
            name: "secret_reference_without_user",
            ini: r#"
		[Global]
		port = 443
		insecure-flag = true
		datacenters = us-west
		secret-name = "vccreds"
		secret-namespace = "kube-system"

		[VirtualCenter "0.0.0.0"]
		password = password

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		"#,
            config: Config {
                global: GlobalConfig {
                    port: "443".to_string(),
                    insecure: true,
                    secret_name: "vccreds".to_string(),
                    secret_namespace: "kube-system".to_string(),
                    datacenters: "us-west".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[(
                    "0.0.0.0",
                    VirtualCenterConfig {
                        password: "password".to_string(),
                        ..VirtualCenterConfig::default()
                    },
                )]),
                workspace: workspace(),
                ..Config::default()
            },
        },
        Fixture {
            name: "thumbprint_per_vcenter",
            ini: r#"
		[Global]
		user = user
		password = password
		datacenters = us-west

		[VirtualCenter "0.0.0.0"]
		thumbprint = thumbprint:0

		[VirtualCenter "no_thumbprint"]

		[VirtualCenter "1.1.1.1"]
		thumbprint = thumbprint:1

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		"#,
            config: Config {
                global: GlobalConfig {
                    username: "user".to_string(),
                    password: "password".to_string(),
                    datacenters: "us-west".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[
                    (
                        "0.0.0.0",
                        VirtualCenterConfig {
                            thumbprint: "thumbprint:0".to_string(),
                            ..VirtualCenterConfig::default()
                        },
                    ),
                    ("no_thumbprint", VirtualCenterConfig::default()),
                    (
                        "1.1.1.1",
                        VirtualCenterConfig {
                            thumbprint: "thumbprint:1".to_string(),
                            ..VirtualCenterConfig::default()
                        },
                    ),
                ]),
                workspace: workspace(),
                ..Config::default()
            },
        },
        Fixture {
            name: "global_ca_file",
            ini: r#"
		[Global]
		datacenters = "us-west"
		secret-name = "vccreds"
		secret-namespace = "kube-system"
		ca-file = /some/path/to/my/trusted/ca.pem

		[VirtualCenter "0.0.0.0"]
		[VirtualCenter "1.1.1.1"]

		[Workspace]
		server = 0.0.0.0
		datacenter = us-west
		folder = kubernetes
		"#,
            config: Config {
                global: GlobalConfig {
                    datacenters: "us-west".to_string(),
                    secret_name: "vccreds".to_string(),
                    secret_namespace: "kube-system".to_string(),
                    ca_file: "/some/path/to/my/trusted/ca.pem".to_string(),
                    ..GlobalConfig::default()
                },
                virtual_center: vcenters(&[
                    ("0.0.0.0", VirtualCenterConfig::default()),
                    ("1.1.1.1", VirtualCenterConfig::default()),
                ]),
                workspace: workspace(),
                ..Config::default()
            },
        },
    ]
}

/// Unmarshal `ini` into a fresh configuration.
///
/// Returns the configuration even on failure so callers can check that it
/// was left untouched.
pub fn unmarshal(ini: &str, options: UnmarshalOptions) -> (Result<(), CodecError>, Config) {
    let mut config = Config::default();
    let result = config.unmarshal_ini(ini.as_bytes(), options);
    (result, config)
}

/// Marshal `config` and return the text.
pub fn marshal(config: &Config) -> String {
    String::from_utf8(config.marshal_ini().expect("marshal config")).expect("marshal output is UTF-8")
}
