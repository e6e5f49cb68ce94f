use serde::Deserialize;
use std::path::PathBuf;

fn default_nnodes() -> usize {
    51
}
fn default_cliplat() -> f64 {
    0.0
}
fn default_lat_tick_interval() -> f64 {
    5.0
}
fn default_mapscale() -> f64 {
    1_000_000.0
}
fn default_lon_minor_ticks() -> Vec<f64> {
    vec![12.5]
}
fn default_lon_major_ticks() -> Vec<f64> {
    vec![25.0, 50.0, 75.0]
}
fn default_symmetrical() -> bool {
    true
}
fn default_height() -> f64 {
    4.0
}
fn default_fontsize() -> f64 {
    12.0
}
fn default_padding() -> f64 {
    1.0
}
fn default_verbose() -> bool {
    false
}

/// TOML config file contents; every field is optional in the file and
/// CLI flags take precedence over it
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_nnodes")]
    pub nnodes: usize,
    #[serde(default = "default_cliplat")]
    pub cliplat: f64,
    #[serde(default = "default_lat_tick_interval")]
    pub lat_tick_interval: f64,
    #[serde(default = "default_mapscale")]
    pub mapscale: f64,
    #[serde(default = "default_lon_minor_ticks")]
    pub lon_minor_ticks: Vec<f64>,
    #[serde(default = "default_lon_major_ticks")]
    pub lon_major_ticks: Vec<f64>,
    #[serde(default = "default_symmetrical")]
    pub symmetrical: bool,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_fontsize")]
    pub fontsize: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default)]
    pub projection: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            nnodes: default_nnodes(),
            cliplat: default_cliplat(),
            lat_tick_interval: default_lat_tick_interval(),
            mapscale: default_mapscale(),
            lon_minor_ticks: default_lon_minor_ticks(),
            lon_major_ticks: default_lon_major_ticks(),
            symmetrical: default_symmetrical(),
            height: default_height(),
            fontsize: default_fontsize(),
            padding: default_padding(),
            projection: None,
            output: None,
            verbose: default_verbose(),
        }
    }
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("latbar.toml"));
    paths.push(PathBuf::from(".latbar.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("latbar").join("config.toml"));
        paths.push(config_dir.join("latbar.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".latbar.toml"));
        paths.push(home.join(".config").join("latbar").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.nnodes, 51);
        assert_eq!(config.cliplat, 0.0);
        assert_eq!(config.mapscale, 1_000_000.0);
        assert_eq!(config.lon_major_ticks, vec![25.0, 50.0, 75.0]);
        assert!(config.symmetrical);
    }

    #[test]
    fn test_partial_override() {
        let config: FileConfig = toml::from_str(
            r#"
            mapscale = 2000000
            lon_major_ticks = [100, 200]
            symmetrical = false
            "#,
        )
        .unwrap();
        assert_eq!(config.mapscale, 2_000_000.0);
        assert_eq!(config.lon_major_ticks, vec![100.0, 200.0]);
        assert!(!config.symmetrical);
        // untouched fields keep their defaults
        assert_eq!(config.nnodes, 51);
    }
}
