use crate::batch::naming::FilenameAllocator;
use crate::catalog::FilteredEvents;
use crate::config::types::BatchConfig;
use std::fmt::Write;

/// Dry-run preview: what each event would be rendered as, without touching
/// the renderer or the filesystem.
pub fn format(events: &FilteredEvents, config: &BatchConfig) -> String {
    let mut names = FilenameAllocator::new(&config.output);
    let mut out = String::new();
    let rule = "-".repeat(100);

    let _ = writeln!(
        out,
        "REPORT MODE - {} dataset, {} earthquake(s) with magnitude >= {:.1}",
        config.dataset,
        events.len(),
        config.catalog.min_magnitude
    );
    let _ = writeln!(out, "{}", rule);

    if events.is_empty() {
        let _ = writeln!(out, "No qualifying events.");
    }

    for (idx, event) in events.iter().enumerate() {
        let filename = names.allocate(event);
        let _ = writeln!(
            out,
            "{:3}. {} | M{:.1} | Lat {:7.2}, Lon {:8.2} | Depth {:6.1}km | {} | Output: {}",
            idx + 1,
            event.time.format("%Y-%m-%d %H:%M:%S UTC"),
            event.magnitude,
            event.latitude,
            event.longitude,
            event.depth_km,
            event.place,
            filename
        );
    }

    let _ = write!(out, "{}", rule);
    out
}
