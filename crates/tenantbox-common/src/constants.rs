//! System-wide constants and defaults.

/// Default container image every user container is created from.
pub const DEFAULT_IMAGE: &str = "bharanidharan/galaxykick:v42";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

/// Default container CLI program driven by the CLI runtime adapter.
pub const DEFAULT_RUNTIME_PROGRAM: &str = "udocker";

/// Arguments passed to the runtime program before every verb.
pub const DEFAULT_RUNTIME_GLOBAL_ARGS: &[&str] = &["--allow-root"];

/// Longest accepted user identity, in bytes.
pub const MAX_IDENTITY_LEN: usize = 64;

/// Application name used in log output and the binary name.
pub const APP_NAME: &str = "tenantbox";
