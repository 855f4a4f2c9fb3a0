use super::bbox::BoundingBox;
use super::event::{EventRecord, RawEventRecord};
use std::collections::HashSet;
use tracing::debug;

/// Events that passed [`filter`]. Only the filter can build one, so every
/// event handed to the batch driver has been through it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredEvents(Vec<EventRecord>);

impl FilteredEvents {
    pub fn as_slice(&self) -> &[EventRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<EventRecord> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FilteredEvents {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub events: FilteredEvents,
    /// Records skipped for missing identifier, time, magnitude or coordinates.
    pub malformed: usize,
    pub duplicates: usize,
}

/// Keeps events with `magnitude >= min_magnitude` inside `bbox` (when given),
/// drops repeated identifiers (first occurrence wins) and sorts by origin time.
pub fn filter<I>(events: I, min_magnitude: f64, bbox: Option<&BoundingBox>) -> FilterOutcome
where
    I: IntoIterator<Item = RawEventRecord>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut malformed = 0usize;
    let mut duplicates = 0usize;

    for raw in events {
        let Some(event) = EventRecord::from_raw(raw) else {
            malformed += 1;
            continue;
        };

        if !seen.insert(event.id.clone()) {
            debug!(event_id = %event.id, "Dropping duplicate catalog event");
            duplicates += 1;
            continue;
        }

        if event.magnitude < min_magnitude {
            continue;
        }

        if let Some(bbox) = bbox {
            if !bbox.contains(event.latitude, event.longitude) {
                continue;
            }
        }

        kept.push(event);
    }

    // stable: equal origin times keep catalog order
    kept.sort_by_key(|event| event.time);

    FilterOutcome {
        events: FilteredEvents(kept),
        malformed,
        duplicates,
    }
}
