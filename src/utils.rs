use std::path::{Path, PathBuf};

/// Supported image file extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Check if a path is a supported image file
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|&supported| supported == ext)
        })
        .unwrap_or(false)
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}

/// Canonical string key for an image path.
///
/// The metadata store, filters and strategies all compare images by this key,
/// so every component must go through here. Mixing absolute and relative
/// representations of the same file would silently break set membership.
pub fn canonical_key(path: &Path) -> String {
    match path.canonicalize() {
        Ok(p) => p.to_string_lossy().into_owned(),
        // Deleted or not-yet-created files can't be canonicalized; fall back
        // to the path as given so lookups against stale records still work.
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("/tmp/a.jpg")));
        assert!(is_image_file(Path::new("/tmp/a.PNG")));
        assert!(!is_image_file(Path::new("/tmp/a.txt")));
        assert!(!is_image_file(Path::new("/tmp/noext")));
    }

    #[test]
    fn test_canonical_key_missing_file_is_stable() {
        let p = Path::new("/nonexistent/driftwall/test.png");
        assert_eq!(canonical_key(p), "/nonexistent/driftwall/test.png");
    }
}
