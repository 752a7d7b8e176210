// ── Raw record -> canonical DeviceState ──
//
// Best-effort reconstruction: every attribute is resolved independently
// from its candidate paths and silently falls back to its default. Nothing
// here can fail, so one malformed controller never costs a whole batch.
//
// Candidate order is precedence order for value fields: Spanish firmware
// keys first (nested group, then flat), English aliases from the newer
// ingestion path last. Boolean status fields are an OR over all signals.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::model::device::defaults;
use crate::model::{
    Automation, CurrentSensor, DeviceMeta, DeviceMetrics, DeviceState, DeviceStatus, LightSensor,
    MotionSensor, NetworkInfo, RawRecord, Schedule, Sensors,
};
use crate::resolve::{self, DEFAULT_RECENCY_WINDOW, Signal};

// ── Candidate paths ─────────────────────────────────────────────────

const LED_INTENSITY: &[&str] = &[
    "control.intensidad",
    "control.ledIntensity",
    "calculado.intensidadLED",
    "calculated.ledIntensity",
    "intensidadLED",
    "intensidad",
    "ledIntensity",
    "brillo",
];

const LAST_SEEN: &[&str] = &[
    "ultimaConexion",
    "lastSeen",
    "meta.lastUpdated",
    "ultimaActualizacion",
];

const NAME: &[&str] = &["nombre", "name", "meta.nombre", "info.nombre"];
const LOCATION: &[&str] = &["ubicacion", "direccion", "location", "info.ubicacion"];
const ZONE: &[&str] = &["zona", "zone", "sector", "info.zona"];

const POWER_DRAW: &[&str] = &[
    "calculado.potenciaActual",
    "sensores.corriente.potencia",
    "potenciaActual",
    "potencia",
    "consumoActual",
    "currentPowerDraw",
];
const ENERGY_TODAY: &[&str] = &[
    "calculado.energiaHoy",
    "energiaHoy",
    "consumoHoy",
    "energyToday",
];
const COST_TODAY: &[&str] = &["calculado.costoHoy", "costoHoy", "costToday"];
const CURRENT: &[&str] = &[
    "sensores.corriente.valor",
    "sensores.corriente.amperaje",
    "corriente",
    "current",
];
const VOLTAGE: &[&str] = &["sensores.corriente.voltaje", "voltaje", "voltage"];
const EFFICIENCY: &[&str] = &[
    "calculado.eficienciaHoy",
    "eficienciaHoy",
    "eficiencia",
    "efficiencyToday",
];
const TIMES_ON: &[&str] = &[
    "calculado.vecesEncendidoHoy",
    "vecesEncendidoHoy",
    "vecesEncendido",
    "timesOnToday",
];
const ON_DURATION: &[&str] = &[
    "calculado.tiempoEncendidoHoy",
    "tiempoEncendidoHoy",
    "tiempoEncendido",
    "onDurationToday",
];

const LIGHT_OK: &[&str] = &[
    "sensores.luz.funcionando",
    "sensores.ldr.funcionando",
    "sensors.lightSensor.functioning",
];
const LIGHT_VALUE: &[&str] = &[
    "sensores.luz.valor",
    "sensores.ldr.valor",
    "sensorLuz",
    "ldr",
    "sensors.lightSensor.value",
];
const LIGHT_LUX: &[&str] = &["sensores.luz.lux", "lux", "sensors.lightSensor.lux"];
const MOTION_OK: &[&str] = &[
    "sensores.movimiento.funcionando",
    "sensores.pir.funcionando",
    "sensors.motionSensor.functioning",
];
const MOTION_COUNT: &[&str] = &[
    "sensores.movimiento.deteccionesHoy",
    "deteccionesHoy",
    "sensors.motionSensor.detectionsToday",
];
const CURRENT_OK: &[&str] = &[
    "sensores.corriente.funcionando",
    "sensors.currentSensor.functioning",
];

const SCHEDULES: &[&str] = &[
    "automatizacion.horarios",
    "horarios",
    "automation.schedules",
    "schedules",
];

const IP: &[&str] = &["red.ip", "network.ip", "ip", "direccionIP"];
const PORT: &[&str] = &["red.puerto", "network.port", "puerto", "port"];
const MAC: &[&str] = &["red.mac", "network.mac", "mac", "direccionMAC"];
const SIGNAL: &[&str] = &["red.senal", "red.rssi", "network.signalStrength", "rssi", "senal"];
const LATENCY: &[&str] = &["red.latencia", "network.latency", "latencia", "ping"];

const VERSION: &[&str] = &["meta.version", "version", "info.version"];
const FIRMWARE: &[&str] = &["meta.firmware", "firmware", "info.firmware", "versionFirmware"];
const LAST_UPDATED: &[&str] = &[
    "meta.lastUpdated",
    "ultimaActualizacion",
    "ultimaConexion",
    "updatedAt",
    "lastSeen",
];

// ── Normalizer ──────────────────────────────────────────────────────

/// Stateless builder for canonical device states.
///
/// Referentially transparent: equal `(raw, id, now)` inputs give equal
/// outputs.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Maximum age of a last-seen timestamp for the device to count as online.
    pub online_window: Duration,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            online_window: DEFAULT_RECENCY_WINDOW,
        }
    }
}

impl Normalizer {
    pub fn new(online_window: Duration) -> Self {
        Self { online_window }
    }

    pub fn normalize(&self, raw: &RawRecord, id: &str, now: DateTime<Utc>) -> DeviceState {
        let metrics = metrics(raw);
        let status = self.status(raw, metrics.led_intensity, now);
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        DeviceState {
            id: id.to_owned(),
            name: resolve::text(raw, NAME, &defaults::name(id)),
            location: resolve::text(raw, LOCATION, defaults::LOCATION),
            zone: resolve::text(raw, ZONE, defaults::ZONE),
            status,
            metrics,
            sensors: sensors(raw, metrics.current, now),
            automation: automation(raw, status.automatic, now),
            network: network(raw),
            meta: meta(raw, &timestamp),
            timestamp,
        }
    }

    fn status(&self, raw: &Value, led_intensity: f64, now: DateTime<Utc>) -> DeviceStatus {
        let window = self.online_window;
        let mut online = vec![
            Signal::Flag("online"),
            Signal::Flag("conectado"),
            Signal::Flag("estado.online"),
            Signal::Flag("estado.conectado"),
            Signal::Flag("status.online"),
            Signal::Flag("activo"),
            Signal::Equals("estado", "online"),
            Signal::Equals("status", "online"),
        ];
        online.extend(LAST_SEEN.iter().map(|&path| Signal::Recent(path, window)));

        DeviceStatus {
            online: resolve::any(raw, &online, now),
            powered_on: resolve::any(
                raw,
                &[
                    Signal::Flag("encendido"),
                    Signal::Flag("control.encendido"),
                    Signal::Flag("estado.encendido"),
                    Signal::Flag("poweredOn"),
                    Signal::Flag("status.poweredOn"),
                    Signal::Flag("on"),
                    Signal::Equals("estado", "encendido"),
                    Signal::Derived(led_intensity > 0.0),
                ],
                now,
            ),
            automatic: automatic(raw, now),
            active: resolve::any(
                raw,
                &[
                    Signal::Flag("activo"),
                    Signal::Flag("estado.activo"),
                    Signal::Flag("active"),
                    Signal::Flag("status.active"),
                ],
                now,
            ),
            disabled: resolve::any(
                raw,
                &[
                    Signal::Flag("deshabilitado"),
                    Signal::Flag("disabled"),
                    Signal::Flag("estado.deshabilitado"),
                    Signal::Flag("status.disabled"),
                ],
                now,
            ),
        }
    }
}

/// Normalize with the default recency window.
pub fn normalize(raw: &RawRecord, id: &str, now: DateTime<Utc>) -> DeviceState {
    Normalizer::default().normalize(raw, id, now)
}

// ── Attribute groups ────────────────────────────────────────────────

fn automatic(raw: &Value, now: DateTime<Utc>) -> bool {
    resolve::any(
        raw,
        &[
            Signal::Flag("automatizacion.habilitada"),
            Signal::Flag("automatizacion.enabled"),
            Signal::Flag("automation.enabled"),
            Signal::Flag("control.modoAutomatico"),
            Signal::Flag("modoAutomatico"),
            Signal::Flag("automatico"),
            Signal::Flag("automatic"),
            Signal::Equals("modo", "automatico"),
            Signal::Equals("modo", "automático"),
        ],
        now,
    )
}

fn metrics(raw: &Value) -> DeviceMetrics {
    DeviceMetrics {
        led_intensity: resolve::number(raw, LED_INTENSITY, 0.0),
        current_power_draw: resolve::number(raw, POWER_DRAW, 0.0),
        energy_today: resolve::number(raw, ENERGY_TODAY, 0.0),
        cost_today: resolve::number(raw, COST_TODAY, 0.0),
        current: resolve::number(raw, CURRENT, 0.0),
        voltage: resolve::number(raw, VOLTAGE, defaults::VOLTAGE),
        efficiency_today: resolve::number(raw, EFFICIENCY, 0.0),
        times_on_today: resolve::number(raw, TIMES_ON, 0.0),
        on_duration_today: resolve::number(raw, ON_DURATION, 0.0),
    }
}

fn sensors(raw: &Value, current: f64, now: DateTime<Utc>) -> Sensors {
    Sensors {
        light_sensor: LightSensor {
            functioning: !resolve::explicitly_false(raw, LIGHT_OK),
            value: resolve::number(raw, LIGHT_VALUE, defaults::LIGHT_VALUE),
            lux: resolve::number(raw, LIGHT_LUX, defaults::LIGHT_LUX),
        },
        motion_sensor: MotionSensor {
            functioning: !resolve::explicitly_false(raw, MOTION_OK),
            detected: resolve::any(
                raw,
                &[
                    Signal::Flag("sensores.movimiento.detectado"),
                    Signal::Flag("sensores.pir.detectado"),
                    Signal::Flag("movimiento"),
                    Signal::Flag("sensors.motionSensor.detected"),
                ],
                now,
            ),
            detections_today: resolve::number(raw, MOTION_COUNT, 0.0),
        },
        current_sensor: CurrentSensor {
            functioning: !resolve::explicitly_false(raw, CURRENT_OK),
            value: current,
        },
    }
}

fn automation(raw: &Value, enabled: bool, now: DateTime<Utc>) -> Automation {
    let schedules = resolve::first_present(raw, SCHEDULES)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(schedule).collect())
        .unwrap_or_default();

    Automation {
        enabled,
        schedules,
        sensors_active: resolve::any(
            raw,
            &[
                Signal::Flag("automatizacion.sensoresActivos"),
                Signal::Flag("automation.sensorsActive"),
                Signal::Flag("sensoresActivos"),
                Signal::Flag("sensorsActive"),
            ],
            now,
        ),
    }
}

fn schedule(entry: &Value) -> Option<Schedule> {
    if !entry.is_object() {
        return None;
    }
    let days = resolve::first_present(entry, &["dias", "days"])
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(resolve::coerce_text).collect())
        .unwrap_or_default();

    Some(Schedule {
        start: resolve::text(entry, &["inicio", "horaInicio", "start"], defaults::SCHEDULE_START),
        end: resolve::text(entry, &["fin", "horaFin", "end"], defaults::SCHEDULE_END),
        intensity: resolve::number(
            entry,
            &["intensidad", "intensity"],
            defaults::SCHEDULE_INTENSITY,
        ),
        enabled: !resolve::explicitly_false(entry, &["activo", "habilitado", "enabled"]),
        days,
    })
}

fn network(raw: &Value) -> NetworkInfo {
    NetworkInfo {
        ip: resolve::text(raw, IP, defaults::IP),
        port: resolve::number(raw, PORT, defaults::PORT),
        mac: resolve::text(raw, MAC, defaults::MAC),
        signal_strength: resolve::number(raw, SIGNAL, 0.0),
        latency: resolve::number(raw, LATENCY, 0.0),
    }
}

fn meta(raw: &Value, timestamp: &str) -> DeviceMeta {
    DeviceMeta {
        last_updated: resolve::first_present(raw, LAST_UPDATED)
            .and_then(resolve::timestamp)
            .map_or_else(
                || timestamp.to_owned(),
                |t| t.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        version: resolve::text(raw, VERSION, defaults::VERSION),
        firmware: resolve::text(raw, FIRMWARE, defaults::FIRMWARE),
    }
}
