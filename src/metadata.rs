//! Wallpaper metadata: luminosity classification and time schedules
//!
//! Backs the selection pipeline with two JSON documents: per-image
//! classification records and per-classification time schedules. Both are
//! read in full at store construction and rewritten in full on mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Luminosity bucket assigned to an image
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Dark,
    #[default]
    Medium,
    Light,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Dark,
        Classification::Medium,
        Classification::Light,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Classification::Dark => "dark",
            Classification::Medium => "medium",
            Classification::Light => "light",
        }
    }

    /// Parse a classification name (case insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dark" => Some(Classification::Dark),
            "medium" => Some(Classification::Medium),
            "light" => Some(Classification::Light),
            _ => None,
        }
    }
}

/// Metadata record for a single image, keyed by canonical path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub classification: Classification,
    /// Perceptual luminosity in [0,1]
    pub luminosity: f32,
    /// True when the user pinned the classification; re-analysis must not touch it
    #[serde(default)]
    pub manual_override: bool,
    #[serde(default)]
    pub custom_tags: Vec<String>,
    /// Size+mtime fingerprint of the file at analysis time
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Unix timestamp of the last analysis
    #[serde(default)]
    pub analyzed_at: u64,
}

impl ImageRecord {
    /// Add a custom tag, keeping the tag list sorted and free of duplicates
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.to_lowercase().trim().to_string();
        if !tag.is_empty() && !self.custom_tags.contains(&tag) {
            self.custom_tags.push(tag);
            self.custom_tags.sort();
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        let tag = tag.to_lowercase();
        self.custom_tags.retain(|t| t != &tag);
    }
}

/// Aggregate counts over the record map
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MetadataStats {
    pub total: usize,
    pub dark: usize,
    pub medium: usize,
    pub light: usize,
    pub manual_overrides: usize,
    pub tagged: usize,
}

/// Metadata store: record map plus schedule set, persisted as two documents
pub struct MetadataStore {
    records: HashMap<String, ImageRecord>,
    schedules: schedule::ScheduleSet,
    metadata_path: PathBuf,
    schedules_path: PathBuf,
    /// Cached `images_for_time` result, keyed by coarse time bucket
    time_cache: Option<store::TimeCache>,
}

pub mod schedule;
mod store;

pub use schedule::{ScheduleSet, TimeRange, TimeSchedule};
