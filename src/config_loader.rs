use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML (or JSON) file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path).wrap_err_with(|| {
        format!("Failed to open configuration file '{}'", config_path.display())
    })?;

    // YAML is a superset of JSON, so both formats parse here
    let config: Config = serde_yaml::from_reader(file).wrap_err_with(|| {
        format!("Failed to parse configuration file '{}'", config_path.display())
    })?;

    config.validate()?;

    Ok(config)
}

/// Load the configuration file if one was given, fall back to defaults otherwise
pub fn load_optional_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            log::debug!("No config file supplied, relying on CLI parameters");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RootDefaultRoute, Target};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
target: bmv2
env: env.json
ir: ir.json
mapping:
  root_default_route: first_port
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.target, Some(Target::Bmv2));
        assert_eq!(config.mapping.root_default_route, RootDefaultRoute::FirstPort);
    }

    #[test]
    fn test_load_config_rejects_invalid_plan() {
        let yaml = r#"
address_plan:
  address_space: 10.0.0.0/24
  prefix_len: 16
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Path::new("/nonexistent/virntup.yaml")).is_err());
        assert!(load_optional_config(None).is_ok());
    }
}
