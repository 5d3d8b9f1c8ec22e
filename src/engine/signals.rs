use crate::engine::Vec2;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ==================== Signals ====================
/// A value an external harness can read, serialized as a bare JSON value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    Null,
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for SignalValue {
    fn from(value: bool) -> Self {
        SignalValue::Flag(value)
    }
}

impl From<f64> for SignalValue {
    fn from(value: f64) -> Self {
        SignalValue::Number(value)
    }
}

impl From<u64> for SignalValue {
    fn from(value: u64) -> Self {
        SignalValue::Number(value as f64)
    }
}

impl From<usize> for SignalValue {
    fn from(value: usize) -> Self {
        SignalValue::Number(value as f64)
    }
}

impl From<&str> for SignalValue {
    fn from(value: &str) -> Self {
        SignalValue::Text(value.to_string())
    }
}

impl From<Option<&str>> for SignalValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(SignalValue::Null, SignalValue::from)
    }
}

impl From<Counter> for SignalValue {
    fn from(counter: Counter) -> Self {
        counter.get().into()
    }
}

/// Named scalar values of a scene. Every real change bumps `revision`,
/// which is what the HUD and the window publisher watch.
#[derive(Debug, Default, Clone)]
pub struct Signals {
    values: BTreeMap<String, SignalValue>,
    revision: u64,
}

impl Signals {
    pub fn new() -> Self {
        Signals::default()
    }

    /// Returns true when the stored value changed
    pub fn set(&mut self, name: &str, value: impl Into<SignalValue>) -> bool {
        let value = value.into();
        if self.values.get(name) == Some(&value) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        self.revision += 1;
        true
    }

    pub fn get(&self, name: &str) -> Option<&SignalValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(SignalValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(SignalValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(SignalValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> &BTreeMap<String, SignalValue> {
        &self.values
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.values).context("serializing signals")
    }
}

// ==================== Counter ====================
/// Monotonically non-decreasing count, there is no way to lower it
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Counter(u64);

impl Counter {
    pub fn new() -> Self {
        Counter(0)
    }

    pub fn increment(&mut self) -> u64 {
        self.add(1)
    }

    pub fn add(&mut self, amount: u64) -> u64 {
        self.0 = self.0.saturating_add(amount);
        self.0
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

// ==================== Event records ====================
/// One console line: `{"event": ..., ...fields, "timestamp": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Scene clock milliseconds
    pub timestamp: f64,
}

impl EventRecord {
    pub fn new(event: &str, timestamp: f64) -> Self {
        EventRecord {
            event: event.to_string(),
            fields: Map::new(),
            timestamp,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Rounded `{x, y}` object, the usual shape for positions in the logs
    pub fn with_position(self, key: &str, position: Vec2) -> Self {
        self.with(
            key,
            serde_json::json!({ "x": position.x.round(), "y": position.y.round() }),
        )
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).with_context(|| format!("serializing event '{}'", self.event))
    }
}

#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn push(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    pub fn count(&self, event: &str) -> usize {
        self.records.iter().filter(|record| record.event == event).count()
    }

    pub fn last(&self, event: &str) -> Option<&EventRecord> {
        self.records.iter().rev().find(|record| record.event == event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything a scene exposes for verification. Created with the scene,
/// dropped with it.
#[derive(Debug, Default)]
pub struct Telemetry {
    pub signals: Signals,
    pub events: EventLog,
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry::default()
    }

    pub fn emit(&mut self, record: EventRecord) {
        self.events.push(record);
    }
}
