use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config_str(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parses and validates a config held in memory. Environment variables are
/// expanded before parsing and `~` in paths afterwards.
pub fn parse_config_str(yaml: &str) -> Result<BatchConfig, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: BatchConfig = serde_yaml::from_str(&yaml_string)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = env_var_pattern();
    let mut unexpanded_vars: Vec<String> = re
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=/path/to/directory\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables (e.g., export GMV_OUTPUT=~/videos)\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut BatchConfig) {
    config.output.directory = expand_tilde(&config.output.directory);
    config.log.path = expand_tilde(&config.log.path);
}

fn validate_config(config: &BatchConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_catalog(&config.catalog, &mut errors);
    validate_selection(&config.selection, &mut errors);
    validate_renderer(&config.renderer, &mut errors);
    validate_output(&config.output, &mut errors);

    if config.window.duration.is_zero() {
        errors.push("window.duration must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_catalog(catalog: &CatalogConfig, errors: &mut Vec<String>) {
    if catalog.url.trim().is_empty() {
        errors.push("catalog.url cannot be empty".to_string());
    }

    if !catalog.min_magnitude.is_finite() {
        errors.push(format!(
            "catalog.min_magnitude must be a finite number, got {}",
            catalog.min_magnitude
        ));
    }

    if let Some(end) = catalog.end {
        if end < catalog.start {
            errors.push(format!(
                "catalog.end ({}) is before catalog.start ({})",
                end, catalog.start
            ));
        }
    }

    if let Some(bbox) = &catalog.bbox {
        if let Err(e) = bbox.validate() {
            errors.push(format!("catalog.bbox: {}", e));
        }
    }

    if catalog.timeout.is_zero() {
        errors.push("catalog.timeout must be greater than zero".to_string());
    }
}

fn validate_selection(selection: &SelectionConfig, errors: &mut Vec<String>) {
    if selection.networks.is_empty() {
        errors.push("selection.networks must contain at least one network code".to_string());
    }

    for (i, code) in selection.networks.iter().enumerate() {
        if code.trim().is_empty() {
            errors.push(format!("selection.networks[{}]: network code cannot be empty", i));
        }
    }

    if selection.reference.network.trim().is_empty()
        || selection.reference.station.trim().is_empty()
    {
        errors.push("selection.reference needs both a network and a station".to_string());
    }

    if selection.channel_prefixes.is_empty() {
        errors.push("selection.channel_prefixes must contain at least one prefix".to_string());
    }

    let mut seen = HashSet::new();
    for (i, entry) in selection.stations.iter().enumerate() {
        if !seen.insert(entry.id()) {
            errors.push(format!(
                "selection.stations[{}]: duplicate station '{}'",
                i,
                entry.id()
            ));
        }

        if !(0.0..=1.0).contains(&entry.completeness) {
            errors.push(format!(
                "selection.stations[{}]: completeness must be between 0 and 1, got {}",
                i, entry.completeness
            ));
        }

        if !(-90.0..=90.0).contains(&entry.latitude) || !(-180.0..=180.0).contains(&entry.longitude)
        {
            errors.push(format!(
                "selection.stations[{}]: coordinates ({}, {}) are out of range",
                i, entry.latitude, entry.longitude
            ));
        }
    }
}

fn validate_renderer(renderer: &RendererConfig, errors: &mut Vec<String>) {
    if renderer.program.trim().is_empty() {
        errors.push("renderer.program cannot be empty".to_string());
    }

    if renderer.region.trim().is_empty() {
        errors.push("renderer.region cannot be empty".to_string());
    }

    if renderer.timeout.is_zero() {
        errors.push("renderer.timeout must be greater than zero".to_string());
    }
}

const RENDERER_EXTENSION: &str = "mp4";

fn validate_output(output: &OutputConfig, errors: &mut Vec<String>) {
    let template = &output.filename_template;
    if !template.contains("{date}") && !template.contains("{id}") {
        errors.push(format!(
            "output.filename_template '{}' must contain {{date}} or {{id}}",
            template
        ));
    }

    if template.contains('/') || template.contains('\\') {
        errors.push(format!(
            "output.filename_template '{}' cannot contain path separators",
            template
        ));
    }

    // the renderer gets the stem via -o and always appends .mp4 itself
    let extension = output.extension.trim().trim_start_matches('.');
    if extension != RENDERER_EXTENSION {
        errors.push(format!(
            "output.extension '{}' must be '{}', the extension the renderer writes",
            output.extension, RENDERER_EXTENSION
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
catalog:
  min_magnitude: 7.5
  start: 2010-01-01
selection:
  reference: { network: OK, station: BCOK }
  networks: [OK, US]
renderer:
  program: gmv
  region: ok
output:
  directory: /tmp/gmv
"#;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = parse_config_str(MINIMAL).unwrap();
        assert_eq!(config.dataset, "global");
        assert_eq!(config.catalog.url, DEFAULT_CATALOG_URL);
        assert_eq!(config.output.filename_template, "{date}_Magnitude{mag}");
        assert_eq!(config.window.lead.as_secs(), 20);
        assert_eq!(config.renderer.pause_between.as_secs(), 5);
        assert_eq!(config.selection.channels, ChannelMode::All);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let yaml = MINIMAL
            .replace("networks: [OK, US]", "networks: []")
            .replace("program: gmv", "program: ''");
        let err = parse_config_str(&yaml).unwrap_err();
        match err {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 2, "{:?}", errors);
                assert!(errors[0].contains("selection.networks"));
                assert!(errors[1].contains("renderer.program"));
            }
            other => panic!("expected validation list, got {other}"),
        }
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let yaml = MINIMAL.replace("start: 2010-01-01", "start: 2010-01-01\n  end: 2009-12-31");
        let err = parse_config_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("catalog.end"));
    }

    #[test]
    fn test_extension_must_match_renderer_output() {
        let yaml = MINIMAL.replace(
            "directory: /tmp/gmv",
            "directory: /tmp/gmv\n  extension: mkv",
        );
        let err = parse_config_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("output.extension 'mkv'"), "{}", err);

        let yaml = MINIMAL.replace(
            "directory: /tmp/gmv",
            "directory: /tmp/gmv\n  extension: .mp4",
        );
        assert!(parse_config_str(&yaml).is_ok());
    }

    #[test]
    fn test_presets_pass_validation() {
        use crate::config::generate::{preset_yaml, Preset};

        for preset in [Preset::Global, Preset::Regional] {
            let yaml = preset_yaml(preset);
            assert!(!env_var_pattern().is_match(yaml));
            let config = parse_config_str(yaml).unwrap();
            assert_eq!(config.output.extension, "mp4");
        }
    }

    #[test]
    fn test_unset_env_var_is_reported() {
        let yaml = MINIMAL.replace("/tmp/gmv", "$env{GMV_SURELY_UNSET_VAR}/gmv");
        let err = parse_config_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("GMV_SURELY_UNSET_VAR"));
    }
}
