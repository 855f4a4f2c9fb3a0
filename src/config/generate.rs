use clap::ValueEnum;

/// Starter configurations shipped with `config init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    /// Large earthquakes worldwide, drawn on the Oklahoma station map.
    #[default]
    Global,
    /// Moderate earthquakes inside Oklahoma, on the zoomed local map.
    Regional,
}

pub fn generate_starter_config(preset: Preset) -> String {
    preset_yaml(preset).to_string()
}

pub fn preset_yaml(preset: Preset) -> &'static str {
    match preset {
        Preset::Global => GLOBAL,
        Preset::Regional => REGIONAL,
    }
}

const GLOBAL: &str = r#"# =============================================================================
# GMV-BATCH CONFIGURATION (global preset)
# =============================================================================
# Renders a ground motion visualization for every large earthquake in the
# USGS catalog since 2010.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/gmv-batch/config.yml
#   3. /etc/gmv-batch/config.yml
#
# Environment variables can be referenced as $env followed by the variable
# name in braces.

dataset: global

# =============================================================================
# CATALOG
# =============================================================================
catalog:
  url: https://earthquake.usgs.gov/fdsnws/event/1/query
  min_magnitude: 7.5
  start: 2010-01-01
  # end: 2024-12-31     # defaults to today (UTC)
  timeout: 30s

# =============================================================================
# STATION AND NETWORK SELECTION
# =============================================================================
selection:
  # Reference station drawn as the trace under the map
  reference:
    network: OK
    station: SMO
  networks: [OK, US, N4, O2, Y7, Y9, ZP, TA, IU]
  # Temporary deployments (X*, Y*, Z* codes) are dropped unless listed here
  allow_temporary: [Y7, Y9, ZP]
  # 'broadband' keeps LH/BH/HH only, 'all' adds short-period EH/SH
  channels: all
  channel_prefixes: [LH, BH, HH, EH, SH]
  # Optional inventory used to pick a fallback reference station
  stations:
    - { network: OK, station: SMO, latitude: 35.47, longitude: -97.52, completeness: 0.95 }
    - { network: OK, station: BCOK, latitude: 35.61, longitude: -97.07, completeness: 0.90 }
    - { network: US, station: OKCU, latitude: 35.60, longitude: -97.48, completeness: 0.85 }

# =============================================================================
# ANIMATION WINDOW
# =============================================================================
window:
  lead: 20s
  duration: 2400s

# =============================================================================
# RENDERER
# =============================================================================
renderer:
  program: python3
  args: [gmv_generalized.py]
  region: ok
  extra_args: []
  timeout: 1h
  pause_between: 5s

# =============================================================================
# OUTPUT
# =============================================================================
output:
  directory: ~/gmv/global
  filename_template: "{date}_Magnitude{mag}"
  extension: mp4
  decimal_separator: "_"
  skip_existing: false

log:
  path: ~/gmv/global/gmv-batch.log
"#;

const REGIONAL: &str = r#"# =============================================================================
# GMV-BATCH CONFIGURATION (regional preset)
# =============================================================================
# Renders a zoomed ground motion visualization for every M4.5+ earthquake
# inside Oklahoma since 2010.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/gmv-batch/config.yml
#   3. /etc/gmv-batch/config.yml
#
# Environment variables can be referenced as $env followed by the variable
# name in braces.

dataset: regional

catalog:
  url: https://earthquake.usgs.gov/fdsnws/event/1/query
  min_magnitude: 4.5
  start: 2010-01-01
  # Oklahoma state bounds, edges inclusive
  bbox:
    min_lat: 33.6
    max_lat: 37.0
    min_lon: -103.0
    max_lon: -94.4
  timeout: 30s

selection:
  reference:
    network: OK
    station: SMO
  networks: [OK, US, N4, XO, O2, Y7, Y9, ZP, TA, IU]
  allow_temporary: [XO, Y7, Y9, ZP]
  channels: all
  channel_prefixes: [LH, BH, HH, EH, SH]
  stations:
    - { network: OK, station: SMO, latitude: 35.47, longitude: -97.52, completeness: 0.95 }
    - { network: OK, station: BCOK, latitude: 35.61, longitude: -97.07, completeness: 0.90 }
    - { network: OK, station: CROK, latitude: 36.02, longitude: -97.59, completeness: 0.80 }
    - { network: US, station: OKCU, latitude: 35.60, longitude: -97.48, completeness: 0.85 }

# Local events are short: start 10 s before origin, run for 10 minutes
window:
  lead: 10s
  duration: 600s

renderer:
  program: python3
  args: [gmv_generalized.py]
  region: ok_local
  # Tighter phase labels and a wider bandpass for the zoomed map
  extra_args: ["-P", "10", "-f", "0.05", "-F", "2.0"]
  timeout: 1h
  pause_between: 5s

output:
  directory: ~/gmv/regional
  filename_template: "{date}_OKlocal_Magnitude{mag}"
  extension: mp4
  decimal_separator: "_"
  skip_existing: false

log:
  path: ~/gmv/regional/gmv-batch.log
"#;
