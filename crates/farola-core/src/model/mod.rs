// ── Domain model ──
//
// Canonical types shared by the normalizer, the store and every consumer.

pub mod device;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use device::{
    Automation, CurrentSensor, DeviceMeta, DeviceMetrics, DeviceState, DeviceStatus, LightSensor,
    MotionSensor, NetworkInfo, Schedule, Sensors,
};

/// Untyped per-device payload exactly as the live source delivered it.
pub type RawRecord = serde_json::Value;

/// Current id -> state mapping. Published as an immutable `Arc` snapshot.
pub type SnapshotMap = BTreeMap<String, Arc<DeviceState>>;
