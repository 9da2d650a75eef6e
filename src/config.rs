use crate::metadata::Classification;
use crate::select::RandomMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub wallpaper: WallpaperConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperConfig {
    pub directory: PathBuf,
    pub recursive: bool,
    /// Canonical paths never offered for selection
    #[serde(default)]
    pub excluded_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub random_mode: RandomMode,
    /// Fraction of the collection kept out of rotation after being shown
    #[serde(default = "default_avoid_recent_percentage")]
    pub avoid_recent_percentage: u32,
    /// Restrict selection to classifications scheduled for the current time
    #[serde(default = "default_true")]
    pub time_based: bool,
    /// Pin selection to one classification regardless of schedules
    #[serde(default)]
    pub luminosity_filter: Option<Classification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Desktop shell JSON config holding `.background.wallpaperPath`
    pub config_path: PathBuf,
    /// Optional command run after a successful apply; the image path is
    /// appended as the last argument
    #[serde(default)]
    pub theme_command: Option<String>,
}

fn default_avoid_recent_percentage() -> u32 {
    crate::select::DEFAULT_AVOID_PERCENTAGE
}

fn default_true() -> bool {
    true
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            directory: dirs::picture_dir()
                .map(|p| p.join("wallpapers"))
                .unwrap_or_else(|| PathBuf::from("~/Pictures/wallpapers")),
            recursive: false,
            excluded_files: Vec::new(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            random_mode: RandomMode::Smart,
            avoid_recent_percentage: default_avoid_recent_percentage(),
            time_based: true,
            luminosity_filter: None,
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            config_path: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("~/.config"))
                .join("desktop-shell/config.json"),
            theme_command: None,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "mrmattias", "driftwall")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Load config from file, creating default if missing or corrupt
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            let data = fs::read_to_string(&path)?;
            match toml::from_str::<Config>(&data) {
                Ok(config) => Ok(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config at {}: {}",
                        path.display(),
                        e
                    );
                    eprintln!("Using default configuration.");
                    Ok(Config::default())
                }
            }
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = toml::to_string_pretty(self)?;
        fs::write(&path, data)?;

        Ok(())
    }

    /// Get wallpaper directory, expanding ~ if needed
    pub fn wallpaper_dir(&self) -> PathBuf {
        crate::utils::expand_tilde(&self.wallpaper.directory)
    }

    /// Shell config path, expanding ~ if needed
    pub fn shell_config_path(&self) -> PathBuf {
        crate::utils::expand_tilde(&self.shell.config_path)
    }
}
