//! Station and network selection for a single event.
//!
//! Networks pass through the temporary-deployment rule, channels through the
//! broadband / all-channels mode, and the reference station falls back to the
//! nearest available inventory station when the configured one cannot be used.

pub mod fallback;
pub mod network;

use crate::catalog::{EventRecord, TimeWindow};
use crate::config::types::{SelectionConfig, StationId};
use network::normalize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub use fallback::{haversine_km, rank_fallbacks, RankedStation};
pub use network::{included_channel_prefixes, included_networks, is_temporary_network};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkChannel {
    pub network: String,
    pub channel_prefix: String,
}

impl fmt::Display for NetworkChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}*", self.network, self.channel_prefix)
    }
}

/// How the reference station was arrived at.
#[derive(Debug, Clone, PartialEq)]
pub enum StationResolution {
    Primary,
    Fallback { distance_km: f64 },
    /// Nothing better was available; the configured station is used as-is.
    Degraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationSelection {
    pub reference: StationId,
    pub resolution: StationResolution,
    pub pairs: Vec<NetworkChannel>,
}

impl StationSelection {
    pub fn networks(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for pair in &self.pairs {
            if !out.contains(&pair.network.as_str()) {
                out.push(&pair.network);
            }
        }
        out
    }

    pub fn channel_prefixes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for pair in &self.pairs {
            if !out.contains(&pair.channel_prefix.as_str()) {
                out.push(&pair.channel_prefix);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionEmpty {
    #[error("every candidate network is excluded: {}", .0.join(", "))]
    AllNetworksExcluded(Vec<String>),

    #[error("no channel prefix survives the channel rules")]
    NoChannels,
}

/// Resolves the station/network/channel set for events under one configuration.
#[derive(Debug)]
pub struct StationNetworkSelector<'a> {
    config: &'a SelectionConfig,
    networks: Vec<String>,
    prefixes: Vec<String>,
    reference: StationId,
}

impl<'a> StationNetworkSelector<'a> {
    pub fn new(config: &'a SelectionConfig) -> Self {
        let networks = included_networks(&config.networks, &config.allow_temporary);
        let prefixes = included_channel_prefixes(&config.channel_prefixes, config.channels);
        let reference = StationId::new(
            normalize(&config.reference.network),
            normalize(&config.reference.station),
        );

        debug!(
            networks = ?networks,
            prefixes = ?prefixes,
            reference = %reference,
            "Station selector initialized"
        );

        Self {
            config,
            networks,
            prefixes,
            reference,
        }
    }

    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    pub fn channel_prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn select(
        &self,
        event: &EventRecord,
        window: &TimeWindow,
    ) -> Result<StationSelection, SelectionEmpty> {
        if self.networks.is_empty() {
            return Err(SelectionEmpty::AllNetworksExcluded(
                self.config.networks.iter().map(|c| normalize(c)).collect(),
            ));
        }
        if self.prefixes.is_empty() {
            return Err(SelectionEmpty::NoChannels);
        }

        let pairs = self
            .networks
            .iter()
            .flat_map(|network| {
                self.prefixes.iter().map(move |prefix| NetworkChannel {
                    network: network.clone(),
                    channel_prefix: prefix.clone(),
                })
            })
            .collect();

        let (reference, resolution) = self.resolve_reference(event, window);

        Ok(StationSelection {
            reference,
            resolution,
            pairs,
        })
    }

    fn resolve_reference(
        &self,
        event: &EventRecord,
        window: &TimeWindow,
    ) -> (StationId, StationResolution) {
        if self.primary_usable(window) {
            return (self.reference.clone(), StationResolution::Primary);
        }

        let ranked = rank_fallbacks(
            &self.config.stations,
            (event.latitude, event.longitude),
            window,
            |entry| {
                let id = StationId::new(normalize(&entry.network), normalize(&entry.station));
                id != self.reference && self.networks.contains(&id.network)
            },
        );

        match ranked.first() {
            Some(best) => {
                let id = StationId::new(normalize(&best.entry.network), normalize(&best.entry.station));
                debug!(
                    event_id = %event.id,
                    primary = %self.reference,
                    fallback = %id,
                    distance_km = best.distance_km,
                    "Reference station unavailable, using fallback"
                );
                (
                    id,
                    StationResolution::Fallback {
                        distance_km: best.distance_km,
                    },
                )
            }
            None => {
                warn!(
                    event_id = %event.id,
                    primary = %self.reference,
                    "No fallback station available, keeping configured reference"
                );
                (self.reference.clone(), StationResolution::Degraded)
            }
        }
    }

    /// The configured reference is usable when its network is included and the
    /// inventory does not say it was offline during the window. Stations missing
    /// from the inventory are assumed available.
    fn primary_usable(&self, window: &TimeWindow) -> bool {
        if !self.networks.contains(&self.reference.network) {
            return false;
        }

        self.config
            .stations
            .iter()
            .filter(|entry| {
                normalize(&entry.network) == self.reference.network
                    && normalize(&entry.station) == self.reference.station
            })
            .all(|entry| entry.covers(window.start, window.end))
    }
}

/// One-shot form of [`StationNetworkSelector::select`].
pub fn select(
    event: &EventRecord,
    config: &SelectionConfig,
    window: &TimeWindow,
) -> Result<StationSelection, SelectionEmpty> {
    StationNetworkSelector::new(config).select(event, window)
}
