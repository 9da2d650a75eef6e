use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Applying a wallpaper means rewriting the desktop shell's JSON config:
/// jq sets `.background.wallpaperPath` and the shell picks the change up on
/// its own. The rewrite goes through a temp file plus rename so the shell
/// never reads a half-written config.
pub fn apply_wallpaper(config_path: &Path, image_path: &str) -> Result<()> {
    let output = Command::new("jq")
        .arg("--arg")
        .arg("path")
        .arg(image_path)
        .arg(".background.wallpaperPath = $path")
        .arg(config_path)
        .output()
        .context("Failed to run jq (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("jq failed updating shell config: {}", stderr);
    }

    let tmp = config_path.with_extension("json.tmp");
    fs::write(&tmp, &output.stdout)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, config_path)
        .with_context(|| format!("Failed to replace {}", config_path.display()))?;

    debug!(path = image_path, "shell config updated");
    Ok(())
}

/// Read back the wallpaper currently recorded in the shell config.
/// Missing file, bad JSON, or an absent key all read as "unknown".
pub fn current_wallpaper(config_path: &Path) -> Option<String> {
    let data = fs::read_to_string(config_path).ok()?;
    let doc: Value = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                path = %config_path.display(),
                error = %e,
                "shell config is not valid JSON"
            );
            return None;
        }
    };
    doc.get("background")?
        .get("wallpaperPath")?
        .as_str()
        .map(str::to_string)
}

/// Run the configured theme generator (e.g. a pywal-style tool) against the
/// freshly applied image. Failures are reported, never fatal: a broken theme
/// hook must not undo a successful wallpaper change.
pub fn run_theme_command(command: &str, image_path: &str) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };

    let result = Command::new(program)
        .args(parts)
        .arg(image_path)
        .output();

    match result {
        Ok(output) if output.status.success() => {
            debug!(command, "theme command finished");
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(command, %stderr, "theme command exited with failure");
        }
        Err(e) => {
            warn!(command, error = %e, "theme command could not be started");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_current_wallpaper_reads_key() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("shell.json");
        fs::write(
            &config,
            r#"{"background": {"wallpaperPath": "/w/a.png"}, "theme": {}}"#,
        )
        .unwrap();

        assert_eq!(current_wallpaper(&config), Some("/w/a.png".to_string()));
    }

    #[test]
    fn test_current_wallpaper_missing_file() {
        assert_eq!(current_wallpaper(Path::new("/nonexistent/shell.json")), None);
    }

    #[test]
    fn test_current_wallpaper_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("shell.json");
        fs::write(&config, "{not json").unwrap();
        assert_eq!(current_wallpaper(&config), None);
    }

    #[test]
    fn test_current_wallpaper_missing_key() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("shell.json");
        fs::write(&config, r#"{"background": {}}"#).unwrap();
        assert_eq!(current_wallpaper(&config), None);
    }

    #[test]
    fn test_theme_command_failure_is_swallowed() {
        // Nonexistent binary: must not panic or error out
        run_theme_command("/definitely/not/a/binary", "/w/a.png");
        run_theme_command("", "/w/a.png");
    }
}
