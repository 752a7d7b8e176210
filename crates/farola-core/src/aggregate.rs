// ── Fleet projections ──
//
// Pure functions of (snapshot map, zone filter). Recomputed from scratch on
// every change; nothing is maintained incrementally.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{DeviceState, SnapshotMap};

// ── ZoneFilter ──────────────────────────────────────────────────────

/// Which devices the list views show. Never affects `FleetStats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ZoneFilter {
    #[default]
    All,
    Zone(String),
}

impl ZoneFilter {
    /// `None`, blank, `"all"` and `"todas"` all mean no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(z) if z.eq_ignore_ascii_case("all") || z.eq_ignore_ascii_case("todas") => {
                Self::All
            }
            Some(z) => Self::Zone(z.to_owned()),
        }
    }

    pub fn matches(&self, device: &DeviceState) -> bool {
        match self {
            Self::All => true,
            Self::Zone(zone) => device.zone == *zone,
        }
    }
}

impl From<Option<&str>> for ZoneFilter {
    fn from(raw: Option<&str>) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for ZoneFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Zone(z) => f.write_str(z),
        }
    }
}

// ── FleetStats ──────────────────────────────────────────────────────

/// Fleet-wide counters over every known device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total: usize,
    pub online_count: usize,
    pub powered_on_count: usize,
    pub automatic_count: usize,
    pub online_percent: usize,
    pub powered_on_percent: usize,
    pub automatic_percent: usize,
    /// Watts, summed over devices.
    pub total_power_draw: f64,
    /// kWh, summed over devices.
    pub total_energy_today: f64,
}

impl FleetStats {
    pub fn from_devices<'a>(devices: impl IntoIterator<Item = &'a DeviceState>) -> Self {
        let mut stats = Self::default();
        for d in devices {
            stats.total += 1;
            stats.online_count += usize::from(d.status.online);
            stats.powered_on_count += usize::from(d.status.powered_on);
            stats.automatic_count += usize::from(d.status.automatic);
            stats.total_power_draw += d.metrics.current_power_draw;
            stats.total_energy_today += d.metrics.energy_today;
        }
        stats.online_percent = percent(stats.online_count, stats.total);
        stats.powered_on_percent = percent(stats.powered_on_count, stats.total);
        stats.automatic_percent = percent(stats.automatic_count, stats.total);
        stats
    }

    pub fn offline_count(&self) -> usize {
        self.total - self.online_count
    }
}

/// Integer percentage rounded half-up; 0 for an empty fleet.
fn percent(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (count * 100 + total / 2) / total
}

// ── FleetView ───────────────────────────────────────────────────────

/// Everything the monitoring views read, derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetView {
    /// Every device, in id order.
    pub available_devices: Vec<Arc<DeviceState>>,
    /// Devices passing the zone filter, in id order.
    pub filtered_devices: Vec<Arc<DeviceState>>,
    /// Distinct non-empty zones, sorted.
    pub available_zones: Vec<String>,
    pub filter: ZoneFilter,
    /// Computed over `available_devices`, never the filtered list.
    pub stats: FleetStats,
}

impl FleetView {
    pub fn compute(devices: &SnapshotMap, filter: &ZoneFilter) -> Self {
        let available_devices: Vec<Arc<DeviceState>> = devices.values().cloned().collect();
        let filtered_devices = available_devices
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        let available_zones = available_devices
            .iter()
            .map(|d| d.zone.as_str())
            .filter(|z| !z.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let stats = FleetStats::from_devices(available_devices.iter().map(|d| &**d));

        Self {
            available_devices,
            filtered_devices,
            available_zones,
            filter: filter.clone(),
            stats,
        }
    }

    /// Devices passing the filter that are currently offline.
    pub fn offline_in_view(&self) -> impl Iterator<Item = &Arc<DeviceState>> {
        self.filtered_devices.iter().filter(|d| !d.status.online)
    }
}
