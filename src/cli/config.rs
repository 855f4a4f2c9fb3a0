use crate::config::generate::{generate_starter_config, Preset};
use crate::config::{system_config_path, user_config_path};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("config file already exists at {0}; remove it first or use --stdout to print the config")]
    AlreadyExists(PathBuf),

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn init(stdout: bool, preset: Preset) -> Result<(), InitError> {
    let config_content = generate_starter_config(preset);

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    // ~/.config/gmv-batch/config.yml, or /etc/gmv-batch/config.yml when home is unusable
    let config_path = user_config_path()
        .filter(|path| match path.parent() {
            Some(parent) => fs::create_dir_all(parent).is_ok(),
            None => false,
        })
        .unwrap_or_else(|| {
            eprintln!(
                "Warning: could not use ~/.config/gmv-batch, falling back to {}",
                system_config_path().display()
            );
            system_config_path()
        });

    let written = write_config(&config_content, &config_path)?;
    println!("Config file written to {}", written.display());
    Ok(())
}

/// Writes a new config file, refusing to overwrite an existing one.
pub fn write_config(config_content: &str, path: &Path) -> Result<PathBuf, InitError> {
    if path.exists() {
        return Err(InitError::AlreadyExists(path.to_path_buf()));
    }

    let write_err = |source| InitError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, config_content).map_err(write_err)?;

    Ok(path.to_path_buf())
}
