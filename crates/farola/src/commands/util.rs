//! Shared helpers for command handlers.

use tabled::Tabled;

use farola_core::DeviceState;

use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "On")]
    powered_on: String,
    #[tabled(rename = "Auto")]
    automatic: String,
    #[tabled(rename = "LED %")]
    led: String,
    #[tabled(rename = "Power W")]
    power: String,
}

impl DeviceRow {
    pub fn new(d: &DeviceState, color: bool) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            zone: d.zone.clone(),
            online: output::flag(d.status.online, color),
            powered_on: output::flag(d.status.powered_on, color),
            automatic: output::flag(d.status.automatic, color),
            led: format!("{:.0}", d.metrics.led_intensity),
            power: format!("{:.1}", d.metrics.current_power_draw),
        }
    }
}
