//! Telemetry Snapshot

use serde::Serialize;
use std::collections::BTreeMap;

/// The aggregated result of one collection run.
///
/// Maps field name to decoded value; a field that failed to collect is
/// simply absent. Serializes transparently to a flat JSON object, which is
/// the published payload. Key order is stable, so identical runs produce
/// bit-identical payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TelemetrySnapshot {
    readings: BTreeMap<&'static str, f64>,
}

impl TelemetrySnapshot {
    /// Record one collected field
    pub fn insert(&mut self, field: &'static str, value: f64) {
        self.readings.insert(field, value);
    }

    /// Value of a field, if it was collected
    pub fn get(&self, field: &str) -> Option<f64> {
        self.readings.get(field).copied()
    }

    /// Number of collected fields
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True when nothing was collected; still a valid run result
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterate collected fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.readings.iter().map(|(field, value)| (*field, *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_serializes_to_empty_object() {
        let snapshot = TelemetrySnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "{}");
    }

    #[test]
    fn test_flat_payload() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.insert("battery_charge", 84.5);
        snapshot.insert("ambient_air_temp", 20.0);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"ambient_air_temp":20.0,"battery_charge":84.5}"#);
    }

    #[test]
    fn test_insert_overwrites_instead_of_duplicating() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.insert("battery_charge", 84.5);
        snapshot.insert("battery_charge", 85.0);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("battery_charge"), Some(85.0));
    }
}
