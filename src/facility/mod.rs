use std::sync::Arc;

use tracing::error;

use crate::error::{DBError, ServiceError};
use crate::models::{Attribute, Department, Reading, Room, Scope, Tank};
use crate::store::{HierarchyStore, ReadingStore};

pub mod aggregate;
pub mod ingest;
pub mod reconcile;


/// Application core over the two store collaborators.
///
/// All tree mutation goes through `create_or_update_departments`, all
/// reading mutation through `replace_tank_day`; everything else is a
/// read or a flat catalog operation.
pub struct FacilityService {
    pub(crate) hierarchy: Arc<dyn HierarchyStore>,
    pub(crate) readings: Arc<dyn ReadingStore>,
}

impl FacilityService {
    pub fn new(hierarchy: Arc<dyn HierarchyStore>, readings: Arc<dyn ReadingStore>) -> Arc<Self> {
        Arc::new(FacilityService {
            hierarchy,
            readings,
        })
    }

    pub async fn departments(&self) -> Result<Vec<Department>, ServiceError> {
        Ok(self.hierarchy.find_all_departments().await?)
    }

    pub async fn department(&self, id: i32) -> Result<Department, ServiceError> {
        Ok(self
            .hierarchy
            .find_department_by_id(id)
            .await?
            .ok_or(DBError::DepartmentNotFound(id))?)
    }

    pub async fn delete_department(&self, id: i32) -> Result<(), ServiceError> {
        self.department(id).await?;
        Ok(self.hierarchy.delete_department(id).await?)
    }

    pub async fn room(&self, id: i32) -> Result<Room, ServiceError> {
        Ok(self
            .hierarchy
            .find_room_by_id(id)
            .await?
            .ok_or(DBError::RoomNotFound(id))?)
    }

    pub async fn tanks(&self) -> Result<Vec<Tank>, ServiceError> {
        Ok(self.hierarchy.find_all_tanks().await?)
    }

    pub async fn tank(&self, id: i32) -> Result<Tank, ServiceError> {
        Ok(self
            .hierarchy
            .find_tank_by_id(id)
            .await?
            .ok_or(DBError::TankNotFound(id))?)
    }

    pub async fn create_tank(&self, name: String, room_id: i32) -> Result<Tank, ServiceError> {
        self.room(room_id).await?;
        Ok(self
            .hierarchy
            .save_tank(Tank {
                id: None,
                name,
                room_id: Some(room_id),
            })
            .await?)
    }

    pub async fn delete_tank(&self, id: i32) -> Result<(), ServiceError> {
        self.tank(id).await?;
        Ok(self.hierarchy.delete_tank(id).await?)
    }

    pub async fn attributes(&self) -> Result<Vec<Attribute>, ServiceError> {
        Ok(self.hierarchy.find_all_attributes().await?)
    }

    pub async fn attribute(&self, id: i32) -> Result<Attribute, ServiceError> {
        Ok(self
            .hierarchy
            .find_attribute_by_id(id)
            .await?
            .ok_or(DBError::AttributeNotFound(id))?)
    }

    pub async fn save_attribute(&self, attribute: Attribute) -> Result<Attribute, ServiceError> {
        Ok(self.hierarchy.save_attribute(attribute).await?)
    }

    pub async fn delete_attribute(&self, id: i32) -> Result<(), ServiceError> {
        self.attribute(id).await?;
        Ok(self.hierarchy.delete_attribute(id).await?)
    }

    pub async fn tank_readings_on_day(
        &self,
        tank_id: i32,
        day: chrono::NaiveDate,
    ) -> Result<Vec<Reading>, ServiceError> {
        self.tank(tank_id).await?;
        Ok(self.readings.find_for_tank_on_day(tank_id, day).await?)
    }

    /// Fails with the scope's NotFound before any readings are touched.
    pub(crate) async fn resolve_scope(&self, scope: Scope) -> Result<(), ServiceError> {
        match scope {
            Scope::Tank(id) => self.tank(id).await.map(|_| ()),
            Scope::Room(id) => self.room(id).await.map(|_| ()),
            Scope::Department(id) => self.department(id).await.map(|_| ()),
        }
    }

    pub async fn check_db(&self) -> String {
        match self.hierarchy.health_check().await {
            Ok(_) => "healthy".to_owned(),
            Err(e) => {
                error!("Database health check failed: {}", e);
                "error".to_owned()
            }
        }
    }
}
