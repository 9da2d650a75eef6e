use anyhow::{bail, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::cli::ScheduleAction;
use crate::metadata::{Classification, MetadataStore, TimeRange, TimeSchedule};

pub fn cmd_schedule(action: ScheduleAction) -> Result<()> {
    let mut store = MetadataStore::open();

    match action {
        ScheduleAction::Show => {
            print_schedules(&store);
            print_gaps(&store);
        }
        ScheduleAction::Enable { classification } => {
            let c = parse_classification(&classification)?;
            store.set_schedule_enabled(c, true);
            println!("✓ {} schedule enabled", c.name());
        }
        ScheduleAction::Disable { classification } => {
            let c = parse_classification(&classification)?;
            store.set_schedule_enabled(c, false);
            println!("✓ {} schedule disabled", c.name());
        }
        ScheduleAction::Set {
            classification,
            ranges,
        } => {
            let c = parse_classification(&classification)?;
            let ranges = parse_ranges(&ranges)?;
            store.set_time_ranges(c, ranges);
            println!("✓ {} ranges updated", c.name());
            print_gaps(&store);
        }
        ScheduleAction::Check => {
            print_gaps(&store);
        }
        ScheduleAction::Edit => {
            edit_interactive(&mut store)?;
        }
    }
    Ok(())
}

fn parse_classification(s: &str) -> Result<Classification> {
    match Classification::from_name(s) {
        Some(c) => Ok(c),
        None => bail!("Unknown classification '{}' (expected dark, medium or light)", s),
    }
}

/// Parse "HH:MM-HH:MM[,HH:MM-HH:MM...]" into time ranges
fn parse_ranges(s: &str) -> Result<Vec<TimeRange>> {
    let mut ranges = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        let Some((start, end)) = part.split_once('-') else {
            bail!("Invalid range '{}' (expected HH:MM-HH:MM)", part);
        };
        match TimeRange::parse(start.trim(), end.trim()) {
            Some(range) => ranges.push(range),
            None => bail!("Invalid range '{}' (expected HH:MM-HH:MM)", part),
        }
    }
    if ranges.is_empty() {
        bail!("No time ranges given");
    }
    Ok(ranges)
}

fn format_ranges(schedule: &TimeSchedule) -> String {
    schedule
        .time_ranges
        .iter()
        .map(|r| format!("{}-{}", r.start.format("%H:%M"), r.end.format("%H:%M")))
        .collect::<Vec<_>>()
        .join(",")
}

fn print_schedules(store: &MetadataStore) {
    println!("Time schedules:");
    for c in Classification::ALL {
        match store.schedules().get(c) {
            Some(schedule) => {
                let state = if schedule.enabled { "enabled " } else { "disabled" };
                println!("  {:6} [{}] {}", c.name(), state, format_ranges(schedule));
            }
            None => println!("  {:6} (no schedule)", c.name()),
        }
    }
}

fn print_gaps(store: &MetadataStore) {
    let gaps = store.schedules().coverage_gaps();
    if gaps.is_empty() {
        println!("Schedules cover the full day.");
    } else {
        println!("⚠ Uncovered times (any classification may be picked there):");
        for (start, end) in gaps {
            println!("  {} - {}", start.format("%H:%M"), end.format("%H:%M"));
        }
    }
}

fn edit_interactive(store: &mut MetadataStore) -> Result<()> {
    let theme = ColorfulTheme::default();

    let names: Vec<&str> = Classification::ALL.iter().map(Classification::name).collect();
    let idx = Select::with_theme(&theme)
        .with_prompt("Which classification?")
        .items(&names)
        .default(0)
        .interact()?;
    let classification = Classification::ALL[idx];

    let current = store.schedules().get(classification).cloned();
    let enabled = Confirm::with_theme(&theme)
        .with_prompt(format!("Enable the {} schedule?", classification.name()))
        .default(current.as_ref().map(|s| s.enabled).unwrap_or(true))
        .interact()?;

    let default_ranges = current
        .as_ref()
        .map(format_ranges)
        .unwrap_or_else(|| "09:00-17:00".to_string());
    let input: String = Input::with_theme(&theme)
        .with_prompt("Time ranges (HH:MM-HH:MM, comma separated)")
        .default(default_ranges)
        .validate_with(|s: &String| parse_ranges(s).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;

    store.set_time_ranges(classification, parse_ranges(&input)?);
    store.set_schedule_enabled(classification, enabled);
    println!("✓ {} schedule updated", classification.name());
    print_gaps(store);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_parse_ranges_single() {
        let ranges = parse_ranges("20:00-06:00").unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
        assert_eq!(ranges[0].end, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_ranges_multiple_with_spaces() {
        let ranges = parse_ranges("06:00-09:00, 17:00-20:00").unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_parse_ranges_rejects_garbage() {
        assert!(parse_ranges("").is_err());
        assert!(parse_ranges("20:00").is_err());
        assert!(parse_ranges("25:00-26:00").is_err());
        assert!(parse_ranges("9am-5pm").is_err());
    }

    #[test]
    fn test_format_round_trips() {
        let schedule = TimeSchedule {
            enabled: true,
            time_ranges: parse_ranges("06:00-09:00,17:00-20:00").unwrap(),
        };
        assert_eq!(format_ranges(&schedule), "06:00-09:00,17:00-20:00");
    }
}
