use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Address space of the default address plan
pub const DEFAULT_ADDRESS_SPACE: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 16);

/// Prefix length of node subnets in the default address plan
pub const DEFAULT_PREFIX_LEN: u8 = 24;

/// Deployment target type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Behavioral model v2 software switch
    Bmv2,
    /// Intel Tofino hardware switch
    Tofino,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Bmv2 => write!(f, "bmv2"),
            Target::Tofino => write!(f, "tofino"),
        }
    }
}

/// How the root router's catch-all route is handled.
///
/// Every non-root router points its catch-all route at the first port it was
/// assigned, which is the link towards its parent. The root has no parent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RootDefaultRoute {
    /// The root gets no catch-all route
    #[default]
    Omit,
    /// The root's catch-all route uses its first assigned port
    FirstPort,
}

/// Configuration file contents.
///
/// Every field is optional; command line flags take precedence over the
/// values read from the file.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// Path to the environment description (physical links)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<PathBuf>,
    /// Path of the intermediate representation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir: Option<PathBuf>,
    /// Path where the host configuration is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<PathBuf>,
    /// Path where the deployment plan is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PathBuf>,
    #[serde(default)]
    pub address_plan: AddressPlan,
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Address block that node subnets are carved from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AddressPlan {
    /// Whole address space, also the destination of catch-all routes
    pub address_space: Ipv4Net,
    /// Prefix length of every node's uplink network
    pub prefix_len: u8,
}

/// Physical mapping options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingConfig {
    #[serde(default)]
    pub root_default_route: RootDefaultRoute,
}

impl Default for AddressPlan {
    fn default() -> Self {
        Self {
            address_space: DEFAULT_ADDRESS_SPACE,
            prefix_len: DEFAULT_PREFIX_LEN,
        }
    }
}

impl AddressPlan {
    /// Validate the address plan
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.address_space != self.address_space.trunc() {
            return Err(ValidationError::InvalidAddressPlan(format!(
                "address_space {} has host bits set (did you mean {}?)",
                self.address_space,
                self.address_space.trunc()
            )));
        }
        if self.prefix_len < self.address_space.prefix_len() || self.prefix_len > 32 {
            return Err(ValidationError::InvalidAddressPlan(format!(
                "prefix_len {} must be between {} and 32",
                self.prefix_len,
                self.address_space.prefix_len()
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.address_plan.validate()?;

        for (key, path) in [
            ("env", &self.env),
            ("ir", &self.ir),
            ("host", &self.host),
            ("plan", &self.plan),
        ] {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(ValidationError::MissingSetting(format!(
                        "{} is set to an empty path",
                        key
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Pick the command line value if present, the configuration value otherwise.
///
/// Fails with [`ValidationError::MissingSetting`] naming `key` if neither is
/// set.
pub fn resolve<T: Clone + fmt::Debug>(
    key: &str,
    cli: Option<T>,
    config: Option<&T>,
) -> Result<T, ValidationError> {
    if let Some(value) = cli {
        log::debug!("Using CLI parameter for {} - {:?}", key, value);
        return Ok(value);
    }
    if let Some(value) = config {
        log::debug!("Using config file for {} - {:?}", key, value);
        return Ok(value.clone());
    }
    Err(ValidationError::MissingSetting(format!(
        "{} is neither specified via CLI nor in the configuration file",
        key
    )))
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing setting: {0}")]
    MissingSetting(String),
    #[error("Invalid address plan: {0}")]
    InvalidAddressPlan(String),
    #[error("Target `{0}` is not supported yet")]
    UnsupportedTarget(Target),
    #[error("Invalid topology parameters: {0}")]
    InvalidTopology(String),
}
