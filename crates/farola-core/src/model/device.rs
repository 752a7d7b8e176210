// ── Street-light device domain types ──
//
// The canonical, fully-populated shape every raw controller record is
// normalized into. No field is optional: absence upstream always resolves
// to one of the defaults in `defaults`.

use serde::{Deserialize, Serialize};

/// Literal fallbacks used when no candidate field is present.
pub mod defaults {
    pub const LOCATION: &str = "Sin ubicación";
    pub const ZONE: &str = "Sin zona";
    pub const VOLTAGE: f64 = 220.0;
    pub const LIGHT_VALUE: f64 = 500.0;
    pub const LIGHT_LUX: f64 = 200.0;
    pub const IP: &str = "0.0.0.0";
    pub const PORT: f64 = 80.0;
    pub const MAC: &str = "00:00:00:00:00:00";
    pub const VERSION: &str = "1.0.0";
    pub const FIRMWARE: &str = "desconocido";
    pub const SCHEDULE_START: &str = "18:00";
    pub const SCHEDULE_END: &str = "06:00";
    pub const SCHEDULE_INTENSITY: f64 = 100.0;

    /// Display name for a device that reports none.
    pub fn name(id: &str) -> String {
        format!("Poste {id}")
    }
}

/// Canonical per-device state. Rebuilt wholesale on every raw snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub id: String,
    pub name: String,
    pub location: String,
    pub zone: String,
    pub status: DeviceStatus,
    pub metrics: DeviceMetrics,
    pub sensors: Sensors,
    pub automation: Automation,
    pub network: NetworkInfo,
    pub meta: DeviceMeta,
    /// RFC 3339 instant the state was derived at.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DeviceStatus {
    pub online: bool,
    pub powered_on: bool,
    pub automatic: bool,
    pub active: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    /// LED output, 0-100.
    pub led_intensity: f64,
    /// Instantaneous draw in watts.
    pub current_power_draw: f64,
    /// kWh since local midnight.
    pub energy_today: f64,
    pub cost_today: f64,
    /// Amperes.
    pub current: f64,
    /// Volts.
    pub voltage: f64,
    pub efficiency_today: f64,
    pub times_on_today: f64,
    /// Minutes lit since local midnight.
    pub on_duration_today: f64,
}

impl Default for DeviceMetrics {
    fn default() -> Self {
        Self {
            led_intensity: 0.0,
            current_power_draw: 0.0,
            energy_today: 0.0,
            cost_today: 0.0,
            current: 0.0,
            voltage: defaults::VOLTAGE,
            efficiency_today: 0.0,
            times_on_today: 0.0,
            on_duration_today: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensors {
    pub light_sensor: LightSensor,
    pub motion_sensor: MotionSensor,
    pub current_sensor: CurrentSensor,
}

/// Ambient light (LDR) sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSensor {
    pub functioning: bool,
    /// Raw ADC reading.
    pub value: f64,
    pub lux: f64,
}

impl Default for LightSensor {
    fn default() -> Self {
        Self {
            functioning: true,
            value: defaults::LIGHT_VALUE,
            lux: defaults::LIGHT_LUX,
        }
    }
}

/// PIR motion sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSensor {
    pub functioning: bool,
    pub detected: bool,
    pub detections_today: f64,
}

impl Default for MotionSensor {
    fn default() -> Self {
        Self {
            functioning: true,
            detected: false,
            detections_today: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSensor {
    pub functioning: bool,
    pub value: f64,
}

impl Default for CurrentSensor {
    fn default() -> Self {
        Self {
            functioning: true,
            value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub enabled: bool,
    /// Kept in the order the controller reported them.
    pub schedules: Vec<Schedule>,
    pub sensors_active: bool,
}

/// One on/off window of the automatic program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// `HH:MM`, local time.
    pub start: String,
    pub end: String,
    pub intensity: f64,
    pub enabled: bool,
    /// Day names or numbers as reported; empty means every day.
    pub days: Vec<String>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            start: defaults::SCHEDULE_START.into(),
            end: defaults::SCHEDULE_END.into(),
            intensity: defaults::SCHEDULE_INTENSITY,
            enabled: true,
            days: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub ip: String,
    pub port: f64,
    pub mac: String,
    /// dBm or percent, whatever the firmware reports.
    pub signal_strength: f64,
    /// Milliseconds.
    pub latency: f64,
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self {
            ip: defaults::IP.into(),
            port: defaults::PORT,
            mac: defaults::MAC.into(),
            signal_strength: 0.0,
            latency: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMeta {
    pub last_updated: String,
    pub version: String,
    pub firmware: String,
}

impl DeviceState {
    pub fn is_online(&self) -> bool {
        self.status.online
    }

    pub fn is_lit(&self) -> bool {
        self.status.powered_on
    }

    /// Whether any of the three sensor groups reports a fault.
    pub fn has_sensor_fault(&self) -> bool {
        !(self.sensors.light_sensor.functioning
            && self.sensors.motion_sensor.functioning
            && self.sensors.current_sensor.functioning)
    }
}
