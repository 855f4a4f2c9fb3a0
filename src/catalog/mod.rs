pub mod bbox;
pub mod client;
pub mod event;
pub mod filter;

pub use bbox::BoundingBox;
pub use client::{parse_geojson, CatalogQuery, CatalogSource, DataFetchError, UsgsCatalog};
pub use event::{EventRecord, RawEventRecord, TimeWindow};
pub use filter::{filter, FilterOutcome, FilteredEvents};
