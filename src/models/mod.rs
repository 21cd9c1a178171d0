use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Top level of the facility tree. Owns its rooms; a department that
/// disappears from a reconcile snapshot is deleted with all descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub department_id: Option<i32>,
    #[serde(default)]
    pub tanks: Vec<Tank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<i32>,
}

/// Catalog entry like "temperature" or "pH". Referenced by readings,
/// never owned by them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
}

/// A single time-stamped measurement against a tank. Timestamps are
/// naive and interpreted as UTC throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub id: Option<i32>,
    pub tank_id: i32,
    pub attribute_id: i32,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// The subtree a reading query ranges over: a single tank, all tanks of
/// a room, or all tanks of all rooms of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Tank(i32),
    Room(i32),
    Department(i32),
}
