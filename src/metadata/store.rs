use super::schedule::{ScheduleSet, TimeRange};
use super::{Classification, ImageRecord, MetadataStats, MetadataStore};
use chrono::{NaiveTime, Timelike};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Staleness here only costs responsiveness, never correctness, so the TTL
/// can stay short and recomputation is safe to do redundantly.
const TIME_CACHE_TTL: Duration = Duration::from_secs(30);
const TIME_BUCKET_MINUTES: u32 = 15;

pub(super) struct TimeCache {
    bucket: u32,
    computed_at: Instant,
    images: HashSet<String>,
}

fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "mrmattias", "driftwall")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl MetadataStore {
    /// Open the store from the default config location
    pub fn open() -> Self {
        let dir = config_dir();
        Self::with_paths(dir.join("metadata.json"), dir.join("time_schedules.json"))
    }

    /// Open the store with explicit document paths (used by tests)
    pub fn with_paths(metadata_path: PathBuf, schedules_path: PathBuf) -> Self {
        let records = load_document(&metadata_path, "metadata").unwrap_or_default();
        let schedules = load_document(&schedules_path, "time schedules").unwrap_or_default();

        Self {
            records,
            schedules,
            metadata_path,
            schedules_path,
            time_cache: None,
        }
    }

    pub fn get_record(&self, key: &str) -> Option<&ImageRecord> {
        self.records.get(key)
    }

    pub fn records(&self) -> &HashMap<String, ImageRecord> {
        &self.records
    }

    /// Create or replace a record; persists immediately
    pub fn upsert_record(&mut self, key: &str, record: ImageRecord) {
        self.records.insert(key.to_string(), record);
        self.time_cache = None;
        self.persist_records();
    }

    /// Batch upsert from a bulk analysis pass; one rewrite for all records
    pub fn upsert_batch(&mut self, batch: HashMap<String, ImageRecord>) {
        if batch.is_empty() {
            return;
        }
        self.records.extend(batch);
        self.time_cache = None;
        self.persist_records();
    }

    /// Pin a classification against automatic re-analysis. No-op when the
    /// image has no record yet; callers must analyze first.
    pub fn override_classification(&mut self, key: &str, classification: Classification) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            debug!(key, "override requested for unknown image, ignoring");
            return false;
        };
        record.classification = classification;
        record.manual_override = true;
        self.time_cache = None;
        self.persist_records();
        true
    }

    pub fn add_tag(&mut self, key: &str, tag: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        record.add_tag(tag);
        self.persist_records();
        true
    }

    pub fn remove_tag(&mut self, key: &str, tag: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        record.remove_tag(tag);
        self.persist_records();
        true
    }

    /// True when the image should be (re)analyzed: unknown, or its file
    /// fingerprint changed. Manual overrides freeze the record.
    pub fn needs_analysis(&self, key: &str, fingerprint: &str) -> bool {
        match self.records.get(key) {
            None => true,
            Some(record) if record.manual_override => false,
            Some(record) => record.fingerprint.as_deref() != Some(fingerprint),
        }
    }

    /// Drop records whose backing file no longer exists. Returns removed keys.
    pub fn clean_missing(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .records
            .keys()
            .filter(|key| !Path::new(key.as_str()).exists())
            .cloned()
            .collect();

        if !removed.is_empty() {
            for key in &removed {
                self.records.remove(key);
            }
            self.time_cache = None;
            self.persist_records();
        }
        removed
    }

    pub fn statistics(&self) -> MetadataStats {
        let mut stats = MetadataStats {
            total: self.records.len(),
            ..Default::default()
        };

        for record in self.records.values() {
            match record.classification {
                Classification::Dark => stats.dark += 1,
                Classification::Medium => stats.medium += 1,
                Classification::Light => stats.light += 1,
            }
            if record.manual_override {
                stats.manual_overrides += 1;
            }
            if !record.custom_tags.is_empty() {
                stats.tagged += 1;
            }
        }

        stats
    }

    pub fn images_by_classification(&self, classification: Classification) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, r)| r.classification == classification)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn images_by_tag(&self, tag: &str) -> Vec<&str> {
        let tag = tag.to_lowercase();
        self.records
            .iter()
            .filter(|(_, r)| r.custom_tags.iter().any(|t| t == &tag))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn schedules(&self) -> &ScheduleSet {
        &self.schedules
    }

    pub fn set_schedule_enabled(&mut self, classification: Classification, enabled: bool) -> bool {
        let changed = self.schedules.set_enabled(classification, enabled);
        if changed {
            self.time_cache = None;
            self.persist_schedules();
        }
        changed
    }

    pub fn set_time_ranges(&mut self, classification: Classification, ranges: Vec<TimeRange>) {
        self.schedules.set_time_ranges(classification, ranges);
        self.time_cache = None;
        self.persist_schedules();
    }

    /// Classifications active at `t`. Empty set means "no restriction".
    pub fn active_classifications(&self, t: NaiveTime) -> BTreeSet<Classification> {
        self.schedules.active_classifications(t)
    }

    /// Known images whose classification is active at `t`. With no active
    /// classification, every known image qualifies. Cached per 15-minute
    /// bucket with a short TTL.
    pub fn images_for_time(&mut self, t: NaiveTime) -> HashSet<String> {
        let bucket = (t.hour() * 60 + t.minute()) / TIME_BUCKET_MINUTES;

        if let Some(cache) = &self.time_cache {
            if cache.bucket == bucket && cache.computed_at.elapsed() < TIME_CACHE_TTL {
                return cache.images.clone();
            }
        }

        let active = self.schedules.active_classifications(t);
        let images: HashSet<String> = if active.is_empty() {
            self.records.keys().cloned().collect()
        } else {
            self.records
                .iter()
                .filter(|(_, r)| active.contains(&r.classification))
                .map(|(key, _)| key.clone())
                .collect()
        };

        debug!(
            bucket,
            active = active.len(),
            images = images.len(),
            "rebuilt time-filtered image set"
        );

        self.time_cache = Some(TimeCache {
            bucket,
            computed_at: Instant::now(),
            images: images.clone(),
        });
        images
    }

    /// Persistence failures are logged and swallowed: the in-memory store
    /// keeps working for the rest of the process, changes just won't survive
    /// a restart.
    fn persist_records(&self) {
        if let Err(e) = write_document(&self.metadata_path, &self.records) {
            warn!(path = %self.metadata_path.display(), error = %e, "failed to save metadata");
        }
    }

    fn persist_schedules(&self) {
        if let Err(e) = write_document(&self.schedules_path, &self.schedules) {
            warn!(path = %self.schedules_path.display(), error = %e, "failed to save time schedules");
        }
    }
}

/// Load a JSON document, degrading to None on a missing or corrupt file.
/// A corrupt metadata file must never take the application down.
fn load_document<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read {what}, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse {what}, starting empty");
            None
        }
    }
}

fn write_document<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> MetadataStore {
        MetadataStore::with_paths(
            dir.path().join("metadata.json"),
            dir.path().join("time_schedules.json"),
        )
    }

    fn record(classification: Classification, luminosity: f32) -> ImageRecord {
        ImageRecord {
            classification,
            luminosity,
            manual_override: false,
            custom_tags: Vec::new(),
            fingerprint: Some("1234-5678".into()),
            analyzed_at: 0,
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_corrupt_metadata_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("metadata.json"), "{not json").unwrap();
        fs::write(dir.path().join("time_schedules.json"), "[broken").unwrap();

        let store = open_store(&dir);
        assert_eq!(store.statistics().total, 0);
        // Broken schedule file falls back to defaults, not to nothing
        assert!(!store.active_classifications(at(12, 0)).is_empty());
    }

    #[test]
    fn test_upsert_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));
        store.upsert_record("/w/b.png", record(Classification::Light, 0.9));

        let reopened = open_store(&dir);
        assert_eq!(reopened.statistics().total, 2);
        assert_eq!(
            reopened.get_record("/w/a.png").unwrap().classification,
            Classification::Dark
        );
    }

    #[test]
    fn test_override_requires_existing_record() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        assert!(!store.override_classification("/w/missing.png", Classification::Light));

        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));
        assert!(store.override_classification("/w/a.png", Classification::Light));

        let rec = store.get_record("/w/a.png").unwrap();
        assert_eq!(rec.classification, Classification::Light);
        assert!(rec.manual_override);
    }

    #[test]
    fn test_manual_override_freezes_analysis() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));
        store.override_classification("/w/a.png", Classification::Light);

        // Even a changed fingerprint must not trigger re-analysis
        assert!(!store.needs_analysis("/w/a.png", "different-fingerprint"));
        assert!(store.needs_analysis("/w/new.png", "whatever"));
    }

    #[test]
    fn test_needs_analysis_on_fingerprint_change() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Medium, 0.5));

        assert!(!store.needs_analysis("/w/a.png", "1234-5678"));
        assert!(store.needs_analysis("/w/a.png", "9999-0000"));
    }

    #[test]
    fn test_images_for_time_unrestricted_when_all_disabled() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));
        store.upsert_record("/w/b.png", record(Classification::Light, 0.9));
        for classification in Classification::ALL {
            store.set_schedule_enabled(classification, false);
        }

        let images = store.images_for_time(at(12, 0));
        assert_eq!(images.len(), 2, "empty active set means every known image");
    }

    #[test]
    fn test_images_for_time_filters_by_active_classification() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/dark.png", record(Classification::Dark, 0.1));
        store.upsert_record("/w/light.png", record(Classification::Light, 0.9));

        // Default schedules: 23:00 is dark-only
        let images = store.images_for_time(at(23, 0));
        assert!(images.contains("/w/dark.png"));
        assert!(!images.contains("/w/light.png"));
    }

    #[test]
    fn test_schedule_mutation_invalidates_time_cache() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/dark.png", record(Classification::Dark, 0.1));
        store.upsert_record("/w/light.png", record(Classification::Light, 0.9));

        assert_eq!(store.images_for_time(at(23, 0)).len(), 1);
        store.set_schedule_enabled(Classification::Dark, false);
        // Dark disabled: 23:00 has no active classification, so unrestricted
        assert_eq!(store.images_for_time(at(23, 0)).len(), 2);
    }

    #[test]
    fn test_statistics() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));
        store.upsert_record("/w/b.png", record(Classification::Dark, 0.2));
        store.upsert_record("/w/c.png", record(Classification::Light, 0.9));
        store.override_classification("/w/c.png", Classification::Light);
        store.add_tag("/w/a.png", "space");

        let stats = store.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.dark, 2);
        assert_eq!(stats.light, 1);
        assert_eq!(stats.manual_overrides, 1);
        assert_eq!(stats.tagged, 1);
    }

    #[test]
    fn test_clean_missing_removes_dead_records() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.png");
        fs::write(&real, b"fake image").unwrap();

        let mut store = open_store(&dir);
        let real_key = real.to_string_lossy().into_owned();
        store.upsert_record(&real_key, record(Classification::Medium, 0.5));
        store.upsert_record("/w/gone.png", record(Classification::Dark, 0.1));

        let removed = store.clean_missing();
        assert_eq!(removed, vec!["/w/gone.png".to_string()]);
        assert!(store.get_record(&real_key).is_some());
    }

    #[test]
    fn test_tags() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.upsert_record("/w/a.png", record(Classification::Dark, 0.1));

        assert!(store.add_tag("/w/a.png", "Space "));
        assert!(!store.add_tag("/w/none.png", "space"));
        assert_eq!(store.images_by_tag("space"), vec!["/w/a.png"]);

        assert!(store.remove_tag("/w/a.png", "SPACE"));
        assert!(store.images_by_tag("space").is_empty());
    }
}
