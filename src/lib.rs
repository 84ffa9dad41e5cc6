//! INI codec for the vSphere cloud provider configuration.
//!
//! Converts a nested, strongly typed configuration into the INI text read by
//! the vSphere cloud provider (`vsphere.conf`) and back again. The mapping is
//! driven by per-field metadata of the form `name[,omitempty]`:
//!
//! - **[`schema`]**: the visitor traits a configuration implements, and the
//!   [`ini_record!`] macro that implements them for plain structs
//! - **[`marshal()`]**: configuration to INI text
//! - **[`unmarshal()`]**: INI text to configuration, via a [`Shadow`] model
//! - **[`is_empty`] / [`is_not_empty`]**: the emptiness rule behind `omitempty`
//! - **[`cloud`]**: the concrete cloud provider configuration
//!
//! The crate logs through [`tracing`] and installs no subscriber.
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cloud;
pub mod error;
pub mod ini;
pub mod schema;

mod empty;
mod marshal;
mod unmarshal;

pub use empty::{is_empty, is_not_empty};
pub use error::CodecError;
pub use marshal::marshal;
pub use unmarshal::{Mentioned, Shadow, UnmarshalOptions, collapse, unmarshal};
