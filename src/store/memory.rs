use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{day_bounds, HierarchyStore, ReadingStore, ReconcilePlan};
use crate::error::DBError;
use crate::models::{Attribute, Department, Reading, Room, Scope, Tank};

#[derive(Debug, Clone)]
struct RoomRecord {
    name: String,
    department_id: i32,
}

#[derive(Debug, Clone)]
struct TankRecord {
    name: String,
    room_id: i32,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    departments: HashMap<i32, String>,
    rooms: HashMap<i32, RoomRecord>,
    tanks: HashMap<i32, TankRecord>,
    attributes: HashMap<i32, String>,
    readings: Vec<Reading>,
}

/// Hierarchy and reading store backed by plain maps behind one lock.
///
/// Every store call holds the lock for its full duration, which gives the
/// same per-call atomicity the postgres adapter gets from a transaction.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Inner {
    fn alloc_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Keeps the id counter ahead of explicitly supplied ids.
    fn claim_id(&mut self, id: i32) {
        if id > self.next_id {
            self.next_id = id;
        }
    }

    fn assemble_department(&self, id: i32, name: &str) -> Department {
        let mut room_ids: Vec<i32> = self
            .rooms
            .iter()
            .filter(|(_, r)| r.department_id == id)
            .map(|(room_id, _)| *room_id)
            .collect();
        room_ids.sort_unstable();

        Department {
            id: Some(id),
            name: name.to_owned(),
            rooms: room_ids
                .iter()
                .map(|room_id| self.assemble_room(*room_id, &self.rooms[room_id]))
                .collect(),
        }
    }

    fn assemble_room(&self, id: i32, record: &RoomRecord) -> Room {
        let mut tank_ids: Vec<i32> = self
            .tanks
            .iter()
            .filter(|(_, t)| t.room_id == id)
            .map(|(tank_id, _)| *tank_id)
            .collect();
        tank_ids.sort_unstable();

        Room {
            id: Some(id),
            name: record.name.clone(),
            department_id: Some(record.department_id),
            tanks: tank_ids
                .iter()
                .map(|tank_id| Tank {
                    id: Some(*tank_id),
                    name: self.tanks[tank_id].name.clone(),
                    room_id: Some(id),
                })
                .collect(),
        }
    }

    fn upsert_department(&mut self, id: Option<i32>, name: &str) -> i32 {
        let id = match id {
            Some(id) => {
                self.claim_id(id);
                id
            }
            None => self.alloc_id(),
        };
        self.departments.insert(id, name.to_owned());
        id
    }

    fn upsert_room(&mut self, id: Option<i32>, name: &str, department_id: i32) -> i32 {
        let id = match id {
            Some(id) => {
                self.claim_id(id);
                id
            }
            None => self.alloc_id(),
        };
        self.rooms.insert(
            id,
            RoomRecord {
                name: name.to_owned(),
                department_id,
            },
        );
        id
    }

    fn upsert_tank(&mut self, id: Option<i32>, name: &str, room_id: i32) -> i32 {
        let id = match id {
            Some(id) => {
                self.claim_id(id);
                id
            }
            None => self.alloc_id(),
        };
        self.tanks.insert(
            id,
            TankRecord {
                name: name.to_owned(),
                room_id,
            },
        );
        id
    }

    fn remove_tank(&mut self, id: i32) {
        self.tanks.remove(&id);
        self.readings.retain(|r| r.tank_id != id);
    }

    fn remove_room(&mut self, id: i32) {
        let tank_ids: Vec<i32> = self
            .tanks
            .iter()
            .filter(|(_, t)| t.room_id == id)
            .map(|(tank_id, _)| *tank_id)
            .collect();
        for tank_id in tank_ids {
            self.remove_tank(tank_id);
        }
        self.rooms.remove(&id);
    }

    fn remove_department(&mut self, id: i32) {
        let room_ids: Vec<i32> = self
            .rooms
            .iter()
            .filter(|(_, r)| r.department_id == id)
            .map(|(room_id, _)| *room_id)
            .collect();
        for room_id in room_ids {
            self.remove_room(room_id);
        }
        self.departments.remove(&id);
    }

    fn scoped_tank_ids(&self, scope: Scope) -> Vec<i32> {
        match scope {
            Scope::Tank(id) => vec![id],
            Scope::Room(id) => self
                .tanks
                .iter()
                .filter(|(_, t)| t.room_id == id)
                .map(|(tank_id, _)| *tank_id)
                .collect(),
            Scope::Department(id) => {
                let room_ids: Vec<i32> = self
                    .rooms
                    .iter()
                    .filter(|(_, r)| r.department_id == id)
                    .map(|(room_id, _)| *room_id)
                    .collect();
                self.tanks
                    .iter()
                    .filter(|(_, t)| room_ids.contains(&t.room_id))
                    .map(|(tank_id, _)| *tank_id)
                    .collect()
            }
        }
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn find_all_departments(&self) -> Result<Vec<Department>, DBError> {
        let inner = self.inner.read();
        let mut ids: Vec<i32> = inner.departments.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids
            .iter()
            .map(|id| inner.assemble_department(*id, &inner.departments[id]))
            .collect())
    }

    async fn find_department_by_id(&self, id: i32) -> Result<Option<Department>, DBError> {
        let inner = self.inner.read();
        Ok(inner
            .departments
            .get(&id)
            .map(|name| inner.assemble_department(id, name)))
    }

    async fn delete_department(&self, id: i32) -> Result<(), DBError> {
        self.inner.write().remove_department(id);
        Ok(())
    }

    async fn find_room_by_id(&self, id: i32) -> Result<Option<Room>, DBError> {
        let inner = self.inner.read();
        Ok(inner
            .rooms
            .get(&id)
            .map(|record| inner.assemble_room(id, record)))
    }

    async fn find_all_tanks(&self) -> Result<Vec<Tank>, DBError> {
        let inner = self.inner.read();
        let mut ids: Vec<i32> = inner.tanks.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids
            .iter()
            .map(|id| Tank {
                id: Some(*id),
                name: inner.tanks[id].name.clone(),
                room_id: Some(inner.tanks[id].room_id),
            })
            .collect())
    }

    async fn find_tank_by_id(&self, id: i32) -> Result<Option<Tank>, DBError> {
        let inner = self.inner.read();
        Ok(inner.tanks.get(&id).map(|record| Tank {
            id: Some(id),
            name: record.name.clone(),
            room_id: Some(record.room_id),
        }))
    }

    async fn save_tank(&self, tank: Tank) -> Result<Tank, DBError> {
        let mut inner = self.inner.write();
        let room_id = tank.room_id.unwrap_or(-1);
        if !inner.rooms.contains_key(&room_id) {
            return Err(DBError::RoomNotFound(room_id));
        }
        let id = inner.upsert_tank(tank.id, &tank.name, room_id);
        Ok(Tank {
            id: Some(id),
            name: tank.name,
            room_id: Some(room_id),
        })
    }

    async fn delete_tank(&self, id: i32) -> Result<(), DBError> {
        self.inner.write().remove_tank(id);
        Ok(())
    }

    async fn find_all_attributes(&self) -> Result<Vec<Attribute>, DBError> {
        let inner = self.inner.read();
        let mut ids: Vec<i32> = inner.attributes.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids
            .iter()
            .map(|id| Attribute {
                id: Some(*id),
                name: inner.attributes[id].clone(),
            })
            .collect())
    }

    async fn find_attribute_by_id(&self, id: i32) -> Result<Option<Attribute>, DBError> {
        let inner = self.inner.read();
        Ok(inner.attributes.get(&id).map(|name| Attribute {
            id: Some(id),
            name: name.clone(),
        }))
    }

    async fn save_attribute(&self, attribute: Attribute) -> Result<Attribute, DBError> {
        let mut inner = self.inner.write();
        let id = match attribute.id {
            Some(id) => {
                inner.claim_id(id);
                id
            }
            None => inner.alloc_id(),
        };
        inner.attributes.insert(id, attribute.name.clone());
        Ok(Attribute {
            id: Some(id),
            name: attribute.name,
        })
    }

    async fn delete_attribute(&self, id: i32) -> Result<(), DBError> {
        self.inner.write().attributes.remove(&id);
        Ok(())
    }

    async fn commit_reconcile(&self, plan: ReconcilePlan) -> Result<Vec<Department>, DBError> {
        let mut inner = self.inner.write();
        let mut saved = Vec::with_capacity(plan.departments.len());

        for mut department in plan.departments {
            let department_id = inner.upsert_department(department.id, &department.name);
            department.id = Some(department_id);
            for room in department.rooms.iter_mut() {
                let room_id = inner.upsert_room(room.id, &room.name, department_id);
                room.id = Some(room_id);
                room.department_id = Some(department_id);
                for tank in room.tanks.iter_mut() {
                    let tank_id = inner.upsert_tank(tank.id, &tank.name, room_id);
                    tank.id = Some(tank_id);
                    tank.room_id = Some(room_id);
                }
            }
            saved.push(department);
        }

        for id in plan.delete_tanks {
            inner.remove_tank(id);
        }
        for id in plan.delete_rooms {
            inner.remove_room(id);
        }
        for id in plan.delete_departments {
            inner.remove_department(id);
        }
        Ok(saved)
    }

    async fn health_check(&self) -> Result<(), DBError> {
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn find_in_range(
        &self,
        scope: Scope,
        attribute_id: Option<i32>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Reading>, DBError> {
        let inner = self.inner.read();
        let tank_ids = inner.scoped_tank_ids(scope);
        let mut readings: Vec<Reading> = inner
            .readings
            .iter()
            .filter(|r| tank_ids.contains(&r.tank_id))
            .filter(|r| attribute_id.map_or(true, |id| r.attribute_id == id))
            .filter(|r| r.timestamp >= from && r.timestamp < until)
            .cloned()
            .collect();
        readings.sort_by_key(|r| r.timestamp);
        Ok(readings)
    }

    async fn find_for_tank_on_day(
        &self,
        tank_id: i32,
        day: NaiveDate,
    ) -> Result<Vec<Reading>, DBError> {
        let (from, until) = day_bounds(day);
        self.find_in_range(Scope::Tank(tank_id), None, from, until)
            .await
    }

    async fn replace_day(
        &self,
        tank_id: i32,
        day: NaiveDate,
        readings: Vec<Reading>,
    ) -> Result<(), DBError> {
        let (from, until) = day_bounds(day);
        let mut inner = self.inner.write();
        inner
            .readings
            .retain(|r| r.tank_id != tank_id || r.timestamp < from || r.timestamp >= until);
        for mut reading in readings {
            reading.id = Some(inner.alloc_id());
            inner.readings.push(reading);
        }
        Ok(())
    }
}
