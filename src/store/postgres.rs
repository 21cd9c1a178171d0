use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgPool;
use sqlx::{PgConnection, Postgres, Transaction};
use std::collections::HashMap;

use super::{day_bounds, HierarchyStore, ReadingStore, ReconcilePlan};
use crate::config::CONFIG;
use crate::error::DBError;
use crate::models::{Attribute, Department, Reading, Room, Scope, Tank};

pub async fn establish_db_connection() -> Option<PgPool> {
    let database_url = CONFIG.database_url();
    sqlx::postgres::PgPoolOptions::new()
        .connect(&database_url)
        .await
        .ok()
}

pub async fn run_migrations(conn: &PgPool) -> Result<(), DBError> {
    sqlx::migrate!()
        .run(conn)
        .await
        .map_err(|e| DBError::SQLError(e.into()))?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct DepartmentRow {
    id: i32,
    name: String,
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i32,
    name: String,
    department_id: i32,
}

#[derive(sqlx::FromRow)]
struct TankRow {
    id: i32,
    name: String,
    room_id: i32,
}

#[derive(sqlx::FromRow)]
struct AttributeRow {
    id: i32,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    id: i32,
    tank_id: i32,
    attribute_id: i32,
    timestamp: NaiveDateTime,
    value: f64,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: Some(row.id),
            tank_id: row.tank_id,
            attribute_id: row.attribute_id,
            timestamp: row.timestamp,
            value: row.value,
        }
    }
}

impl From<TankRow> for Tank {
    fn from(row: TankRow) -> Self {
        Tank {
            id: Some(row.id),
            name: row.name,
            room_id: Some(row.room_id),
        }
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresStore { pool }
    }

    /// Fetches the rooms of the given departments with their tanks attached.
    async fn fetch_rooms(&self, department_ids: &[i32]) -> Result<Vec<Room>, DBError> {
        let room_rows = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, department_id FROM rooms WHERE department_id = ANY($1) ORDER BY id",
        )
        .bind(department_ids)
        .fetch_all(&self.pool)
        .await?;

        let room_ids: Vec<i32> = room_rows.iter().map(|r| r.id).collect();
        let tank_rows = sqlx::query_as::<_, TankRow>(
            "SELECT id, name, room_id FROM tanks WHERE room_id = ANY($1) ORDER BY id",
        )
        .bind(&room_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tanks_by_room: HashMap<i32, Vec<Tank>> = HashMap::new();
        for row in tank_rows {
            tanks_by_room
                .entry(row.room_id)
                .or_default()
                .push(row.into());
        }

        Ok(room_rows
            .into_iter()
            .map(|row| Room {
                id: Some(row.id),
                name: row.name,
                department_id: Some(row.department_id),
                tanks: tanks_by_room.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn assemble_departments(
        &self,
        rows: Vec<DepartmentRow>,
    ) -> Result<Vec<Department>, DBError> {
        let department_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut rooms_by_department: HashMap<i32, Vec<Room>> = HashMap::new();
        for room in self.fetch_rooms(&department_ids).await? {
            // department_id is always set on a fetched room
            if let Some(department_id) = room.department_id {
                rooms_by_department
                    .entry(department_id)
                    .or_default()
                    .push(room);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| Department {
                id: Some(row.id),
                name: row.name,
                rooms: rooms_by_department.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}

/// UPDATE by id, falling back to an INSERT that keeps the supplied id when
/// the update misses. Ids flagged as existing by a client are preserved
/// even when the record is gone, matching reconcile semantics.
async fn upsert_named(
    conn: &mut PgConnection,
    table: &str,
    parent_col: Option<(&str, i32)>,
    id: Option<i32>,
    name: &str,
) -> Result<i32, DBError> {
    match (id, parent_col) {
        (Some(id), None) => {
            let updated = sqlx::query(&format!("UPDATE {} SET name = $2 WHERE id = $1", table))
                .bind(id)
                .bind(name)
                .execute(&mut *conn)
                .await?;
            if updated.rows_affected() == 0 {
                sqlx::query(&format!("INSERT INTO {} (id, name) VALUES ($1, $2)", table))
                    .bind(id)
                    .bind(name)
                    .execute(&mut *conn)
                    .await?;
            }
            Ok(id)
        }
        (Some(id), Some((col, parent_id))) => {
            let updated = sqlx::query(&format!(
                "UPDATE {} SET name = $2, {} = $3 WHERE id = $1",
                table, col
            ))
            .bind(id)
            .bind(name)
            .bind(parent_id)
            .execute(&mut *conn)
            .await?;
            if updated.rows_affected() == 0 {
                sqlx::query(&format!(
                    "INSERT INTO {} (id, name, {}) VALUES ($1, $2, $3)",
                    table, col
                ))
                .bind(id)
                .bind(name)
                .bind(parent_id)
                .execute(&mut *conn)
                .await?;
            }
            Ok(id)
        }
        (None, None) => {
            let (id,): (i32,) =
                sqlx::query_as(&format!("INSERT INTO {} (name) VALUES ($1) RETURNING id", table))
                    .bind(name)
                    .fetch_one(&mut *conn)
                    .await?;
            Ok(id)
        }
        (None, Some((col, parent_id))) => {
            let (id,): (i32,) = sqlx::query_as(&format!(
                "INSERT INTO {} (name, {}) VALUES ($1, $2) RETURNING id",
                table, col
            ))
            .bind(name)
            .bind(parent_id)
            .fetch_one(&mut *conn)
            .await?;
            Ok(id)
        }
    }
}

async fn save_department_tree(
    tx: &mut Transaction<'_, Postgres>,
    mut department: Department,
) -> Result<Department, DBError> {
    let department_id =
        upsert_named(&mut **tx, "departments", None, department.id, &department.name).await?;
    department.id = Some(department_id);

    for room in department.rooms.iter_mut() {
        let room_id = upsert_named(
            &mut **tx,
            "rooms",
            Some(("department_id", department_id)),
            room.id,
            &room.name,
        )
        .await?;
        room.id = Some(room_id);
        room.department_id = Some(department_id);

        for tank in room.tanks.iter_mut() {
            let tank_id = upsert_named(
                &mut **tx,
                "tanks",
                Some(("room_id", room_id)),
                tank.id,
                &tank.name,
            )
            .await?;
            tank.id = Some(tank_id);
            tank.room_id = Some(room_id);
        }
    }
    Ok(department)
}

#[async_trait]
impl HierarchyStore for PostgresStore {
    async fn find_all_departments(&self) -> Result<Vec<Department>, DBError> {
        let rows =
            sqlx::query_as::<_, DepartmentRow>("SELECT id, name FROM departments ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        self.assemble_departments(rows).await
    }

    async fn find_department_by_id(&self, id: i32) -> Result<Option<Department>, DBError> {
        let row =
            sqlx::query_as::<_, DepartmentRow>("SELECT id, name FROM departments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(self.assemble_departments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_department(&self, id: i32) -> Result<(), DBError> {
        sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_room_by_id(&self, id: i32) -> Result<Option<Room>, DBError> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, department_id FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let tank_rows = sqlx::query_as::<_, TankRow>(
            "SELECT id, name, room_id FROM tanks WHERE room_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Room {
            id: Some(row.id),
            name: row.name,
            department_id: Some(row.department_id),
            tanks: tank_rows.into_iter().map(Tank::from).collect(),
        }))
    }

    async fn find_all_tanks(&self) -> Result<Vec<Tank>, DBError> {
        let rows =
            sqlx::query_as::<_, TankRow>("SELECT id, name, room_id FROM tanks ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Tank::from).collect())
    }

    async fn find_tank_by_id(&self, id: i32) -> Result<Option<Tank>, DBError> {
        let row =
            sqlx::query_as::<_, TankRow>("SELECT id, name, room_id FROM tanks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Tank::from))
    }

    async fn save_tank(&self, tank: Tank) -> Result<Tank, DBError> {
        let mut conn = self.pool.acquire().await?;
        let room_id = tank.room_id.unwrap_or(-1);
        let id = upsert_named(
            &mut *conn,
            "tanks",
            Some(("room_id", room_id)),
            tank.id,
            &tank.name,
        )
        .await?;
        Ok(Tank {
            id: Some(id),
            name: tank.name,
            room_id: Some(room_id),
        })
    }

    async fn delete_tank(&self, id: i32) -> Result<(), DBError> {
        sqlx::query("DELETE FROM tanks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_all_attributes(&self) -> Result<Vec<Attribute>, DBError> {
        let rows =
            sqlx::query_as::<_, AttributeRow>("SELECT id, name FROM attributes ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|row| Attribute {
                id: Some(row.id),
                name: row.name,
            })
            .collect())
    }

    async fn find_attribute_by_id(&self, id: i32) -> Result<Option<Attribute>, DBError> {
        let row = sqlx::query_as::<_, AttributeRow>("SELECT id, name FROM attributes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| Attribute {
            id: Some(row.id),
            name: row.name,
        }))
    }

    async fn save_attribute(&self, attribute: Attribute) -> Result<Attribute, DBError> {
        let mut conn = self.pool.acquire().await?;
        let id = upsert_named(&mut *conn, "attributes", None, attribute.id, &attribute.name).await?;
        Ok(Attribute {
            id: Some(id),
            name: attribute.name,
        })
    }

    async fn delete_attribute(&self, id: i32) -> Result<(), DBError> {
        sqlx::query("DELETE FROM attributes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit_reconcile(&self, plan: ReconcilePlan) -> Result<Vec<Department>, DBError> {
        let mut tx = self.pool.begin().await?;

        let mut saved = Vec::with_capacity(plan.departments.len());
        for department in plan.departments {
            saved.push(save_department_tree(&mut tx, department).await?);
        }

        sqlx::query("DELETE FROM tanks WHERE id = ANY($1)")
            .bind(&plan.delete_tanks)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM rooms WHERE id = ANY($1)")
            .bind(&plan.delete_rooms)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM departments WHERE id = ANY($1)")
            .bind(&plan.delete_departments)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn health_check(&self) -> Result<(), DBError> {
        sqlx::query("SELECT count(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for PostgresStore {
    async fn find_in_range(
        &self,
        scope: Scope,
        attribute_id: Option<i32>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Reading>, DBError> {
        let (stmt, scope_id) = match scope {
            Scope::Tank(id) => (
                r#"SELECT id, tank_id, attribute_id, timestamp, value
                    FROM readings
                    WHERE tank_id = $1
                    AND ($2::int4 IS NULL OR attribute_id = $2)
                    AND timestamp >= $3 AND timestamp < $4
                    ORDER BY timestamp ASC"#,
                id,
            ),
            Scope::Room(id) => (
                r#"SELECT r.id, r.tank_id, r.attribute_id, r.timestamp, r.value
                    FROM readings AS r
                    JOIN tanks ON (r.tank_id = tanks.id)
                    WHERE tanks.room_id = $1
                    AND ($2::int4 IS NULL OR r.attribute_id = $2)
                    AND r.timestamp >= $3 AND r.timestamp < $4
                    ORDER BY r.timestamp ASC"#,
                id,
            ),
            Scope::Department(id) => (
                r#"SELECT r.id, r.tank_id, r.attribute_id, r.timestamp, r.value
                    FROM readings AS r
                    JOIN tanks ON (r.tank_id = tanks.id)
                    JOIN rooms ON (tanks.room_id = rooms.id)
                    WHERE rooms.department_id = $1
                    AND ($2::int4 IS NULL OR r.attribute_id = $2)
                    AND r.timestamp >= $3 AND r.timestamp < $4
                    ORDER BY r.timestamp ASC"#,
                id,
            ),
        };

        let rows = sqlx::query_as::<_, ReadingRow>(stmt)
            .bind(scope_id)
            .bind(attribute_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Reading::from).collect())
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
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM readings WHERE tank_id = $1 AND timestamp >= $2 AND timestamp < $3")
            .bind(tank_id)
            .bind(from)
            .bind(until)
            .execute(&mut *tx)
            .await?;

        for reading in readings {
            sqlx::query(
                r#"INSERT INTO readings (tank_id, attribute_id, timestamp, value)
                    VALUES ($1, $2, $3, $4)"#,
            )
            .bind(reading.tank_id)
            .bind(reading.attribute_id)
            .bind(reading.timestamp)
            .bind(reading.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
