use anyhow::Result;
use std::collections::BTreeMap;

use crate::cli::TagAction;
use crate::metadata::MetadataStore;
use crate::utils;

pub fn cmd_tag(action: TagAction) -> Result<()> {
    let mut store = MetadataStore::open();

    match action {
        TagAction::List => {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for record in store.records().values() {
                for tag in &record.custom_tags {
                    *counts.entry(tag.clone()).or_default() += 1;
                }
            }
            if counts.is_empty() {
                println!("No tags defined.");
                println!("Add tags with: driftwall tag add <path> <tag>");
            } else {
                println!("Tags:");
                for (tag, count) in counts {
                    println!("  {} ({})", tag, count);
                }
            }
        }
        TagAction::Add { path, tag } => {
            let key = utils::canonical_key(&utils::expand_tilde(&path));
            if store.add_tag(&key, &tag) {
                println!("✓ Added tag '{}' to {}", tag, key);
            } else {
                println!("No metadata for {} (run 'driftwall analyze' first)", key);
            }
        }
        TagAction::Remove { path, tag } => {
            let key = utils::canonical_key(&utils::expand_tilde(&path));
            if store.remove_tag(&key, &tag) {
                println!("✓ Removed tag '{}' from {}", tag, key);
            } else {
                println!("No metadata for {}", key);
            }
        }
        TagAction::Show { tag } => {
            let mut images = store.images_by_tag(&tag);
            images.sort();
            if images.is_empty() {
                println!("No images with tag '{}'", tag);
            } else {
                println!("Images with tag '{}':", tag);
                for key in images {
                    println!("  {}", key);
                }
            }
        }
    }

    Ok(())
}
