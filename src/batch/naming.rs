use crate::catalog::EventRecord;
use crate::config::types::OutputConfig;
use std::collections::HashSet;

/// Magnitude with one decimal digit, `.` replaced by `separator` ("9.1" -> "9_1").
pub fn format_magnitude(magnitude: f64, separator: &str) -> String {
    format!("{:.1}", magnitude).replace('.', separator)
}

/// Expands `{date}`, `{mag}`, `{region}` and `{id}` in a filename template.
pub fn render_stem(template: &str, event: &EventRecord, separator: &str) -> String {
    template
        .replace("{date}", &event.time.format("%Y%m%d").to_string())
        .replace("{mag}", &format_magnitude(event.magnitude, separator))
        .replace("{region}", &path_safe(event.region()))
        .replace("{id}", &path_safe(&event.id))
}

/// Drops whitespace and turns path separators into `-`.
fn path_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

/// Hands out output filenames for one run, never the same name twice.
///
/// A colliding name (two events on the same day with the same magnitude)
/// gets `_2`, `_3`, ... appended to its stem.
#[derive(Debug)]
pub struct FilenameAllocator {
    template: String,
    extension: String,
    separator: String,
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            template: config.filename_template.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            separator: config.decimal_separator.clone(),
            used: HashSet::new(),
        }
    }

    pub fn allocate(&mut self, event: &EventRecord) -> String {
        let stem = render_stem(&self.template, event, &self.separator);

        let mut candidate = self.with_extension(&stem);
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = self.with_extension(&format!("{}_{}", stem, n));
            n += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }

    fn with_extension(&self, stem: &str) -> String {
        if self.extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }
}
