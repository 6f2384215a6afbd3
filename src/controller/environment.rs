//! Physical environment description.
//!
//! The environment lists the cabling that is available on the switch:
//! `links` are pre-wired loops between two switch ports, used for
//! router-to-router edges; `host_links` connect a named host to a switch port.
//!
//! ```json
//! {
//!   "links": [[1, 2], [3, 4]],
//!   "host_links": [["h1", 10], ["h2", 11]]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Identifier of a physical switch port
pub type PortId = u32;

/// Errors raised while loading an environment description
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Cannot read environment file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed environment description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pools of physical links, consumed front to back during mapping.
///
/// A pool left out of the document is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// `(local port, remote port)` loops for router-to-router edges
    #[serde(default)]
    pub links: VecDeque<(PortId, PortId)>,
    /// `(hostname, switch port)` for router-to-host edges
    #[serde(default)]
    pub host_links: VecDeque<(String, PortId)>,
}

impl Environment {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EnvironmentError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load an environment description from a JSON file
    pub fn load(path: &Path) -> Result<Self, EnvironmentError> {
        log::info!("Loading environment from: {:?}", path);
        let file = File::open(path).map_err(|source| EnvironmentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Take the next router-to-router link
    pub(crate) fn pop_link(&mut self) -> Option<(PortId, PortId)> {
        self.links.pop_front()
    }

    /// Take the next host link
    pub(crate) fn pop_host_link(&mut self) -> Option<(String, PortId)> {
        self.host_links.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_environment() {
        let json = r#"{
            "links": [[1, 2], [3, 4]],
            "host_links": [["h1", 10], ["h2", 11]]
        }"#;
        let mut env = Environment::from_reader(json.as_bytes()).unwrap();

        assert_eq!(env.pop_link(), Some((1, 2)));
        assert_eq!(env.pop_host_link(), Some(("h1".to_string(), 10)));
        assert_eq!(env.pop_host_link(), Some(("h2".to_string(), 11)));
        assert_eq!(env.pop_host_link(), None);
        assert_eq!(env.links.len(), 1);
    }

    #[test]
    fn test_malformed_environment() {
        // Links must be pairs
        let json = r#"{"links": [[1, 2, 3]], "host_links": []}"#;
        assert!(matches!(
            Environment::from_reader(json.as_bytes()),
            Err(EnvironmentError::Json(_))
        ));

        let json = r#"{"host_links": [["h1", "ten"]]}"#;
        assert!(Environment::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_pools_are_empty() {
        // A single-router setup needs no router-to-router links
        let json = r#"{"host_links": [["h1", 10], ["h2", 11]]}"#;
        let env = Environment::from_reader(json.as_bytes()).unwrap();
        assert!(env.links.is_empty());
        assert_eq!(env.host_links.len(), 2);

        let env = Environment::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"links": [], "host_links": [["h1", 7]]}}"#).unwrap();

        let env = Environment::load(temp_file.path()).unwrap();
        assert_eq!(env.host_links.front(), Some(&("h1".to_string(), 7)));

        assert!(matches!(
            Environment::load(Path::new("/nonexistent/env.json")),
            Err(EnvironmentError::Io { .. })
        ));
    }
}
