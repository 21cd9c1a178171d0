use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DBError;
use crate::models::{Attribute, Department, Reading, Room, Scope, Tank};

pub mod memory;
pub mod postgres;

/// Write set of one reconciliation call.
///
/// The planner computes it from a snapshot of the persisted forest; the
/// store applies it in a single transaction. Delete sets only ever contain
/// ids that were persisted when the snapshot was taken, so nodes created
/// by the same call can never become deletion candidates.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Resolved forest to save, in input order. Nodes without an id are
    /// inserted, nodes with one are updated (or inserted with that id if
    /// the update misses).
    pub departments: Vec<Department>,
    pub delete_departments: Vec<i32>,
    pub delete_rooms: Vec<i32>,
    pub delete_tanks: Vec<i32>,
}

/// CRUD + lookup over the department/room/tank forest and the attribute
/// catalog. Deletes cascade to all descendants and their readings.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    async fn find_all_departments(&self) -> Result<Vec<Department>, DBError>;
    async fn find_department_by_id(&self, id: i32) -> Result<Option<Department>, DBError>;
    async fn delete_department(&self, id: i32) -> Result<(), DBError>;

    async fn find_room_by_id(&self, id: i32) -> Result<Option<Room>, DBError>;

    async fn find_all_tanks(&self) -> Result<Vec<Tank>, DBError>;
    async fn find_tank_by_id(&self, id: i32) -> Result<Option<Tank>, DBError>;
    async fn save_tank(&self, tank: Tank) -> Result<Tank, DBError>;
    async fn delete_tank(&self, id: i32) -> Result<(), DBError>;

    async fn find_all_attributes(&self) -> Result<Vec<Attribute>, DBError>;
    async fn find_attribute_by_id(&self, id: i32) -> Result<Option<Attribute>, DBError>;
    async fn save_attribute(&self, attribute: Attribute) -> Result<Attribute, DBError>;
    async fn delete_attribute(&self, id: i32) -> Result<(), DBError>;

    /// Applies a reconciliation plan atomically and returns the saved
    /// forest with all ids assigned.
    async fn commit_reconcile(&self, plan: ReconcilePlan) -> Result<Vec<Department>, DBError>;

    async fn health_check(&self) -> Result<(), DBError>;
}

/// Range queries and the day-replace write over the reading time series.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// All readings in scope with `from <= timestamp < until`, ordered by
    /// timestamp ascending. Room and department scopes follow the tanks
    /// *currently* in that subtree.
    async fn find_in_range(
        &self,
        scope: Scope,
        attribute_id: Option<i32>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Reading>, DBError>;

    async fn find_for_tank_on_day(
        &self,
        tank_id: i32,
        day: NaiveDate,
    ) -> Result<Vec<Reading>, DBError>;

    /// Atomically replaces every reading of the tank on `day` with the
    /// supplied set.
    async fn replace_day(
        &self,
        tank_id: i32,
        day: NaiveDate,
        readings: Vec<Reading>,
    ) -> Result<(), DBError>;
}

/// Half-open UTC bounds of a calendar day: `[00:00, next day 00:00)`.
pub(crate) fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(NaiveTime::MIN);
    let until = (day + Duration::days(1)).and_time(NaiveTime::MIN);
    (start, until)
}
