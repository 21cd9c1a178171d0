use chrono::{NaiveDate, NaiveDateTime};

use super::FacilityService;
use crate::error::{DBError, ServiceError};
use crate::models::{Reading, Tank};

/// One incoming measurement of a day-replace call. A client-supplied
/// reading id is dropped before this point; ingestion only ever creates.
#[derive(Debug, Clone)]
pub struct ReadingEntry {
    pub attribute_id: i32,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl FacilityService {
    /// Replaces all readings of the tank on the given calendar day with
    /// the supplied entries, atomically. Readings on other days are
    /// untouched; a day's reading missing from the input is gone after
    /// the call.
    ///
    /// Attribute ids are not validated here. A dangling id flows into the
    /// store and fails its foreign key constraint, which aborts the whole
    /// transaction.
    pub async fn replace_tank_day(
        &self,
        tank_id: i32,
        entries: Vec<ReadingEntry>,
        day: NaiveDate,
    ) -> Result<Tank, ServiceError> {
        let tank = self
            .hierarchy
            .find_tank_by_id(tank_id)
            .await?
            .ok_or(DBError::TankNotFound(tank_id))?;

        let readings = entries
            .into_iter()
            .map(|entry| Reading {
                id: None,
                tank_id,
                attribute_id: entry.attribute_id,
                timestamp: entry.timestamp,
                value: entry.value,
            })
            .collect();

        self.readings.replace_day(tank_id, day, readings).await?;
        Ok(tank)
    }
}
