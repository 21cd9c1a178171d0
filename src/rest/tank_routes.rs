use std::sync::Arc;

use chrono::NaiveDate;
use warp::Filter;

use super::{build_response, query::DayQuery};
use crate::facility::ingest::ReadingEntry;
use crate::facility::FacilityService;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_tanks(service.clone())
        .or(create_tank(service.clone()))
        .or(get_tank(service.clone()))
        .or(delete_tank(service.clone()))
        .or(save_tank_values(service.clone()))
        .or(get_tank_values(service.clone()))
}

/// GET /api/tank
fn get_tanks(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "tank"))
        .and_then(|service: Arc<FacilityService>| async move {
            let resp = service.tanks().await;
            build_response(resp)
        })
        .boxed()
}

/// POST /api/tank
///
/// Create a single tank inside an existing room
fn create_tank(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::post())
        .and(warp::path!("api" / "tank"))
        .and(warp::body::json())
        .and_then(
            |service: Arc<FacilityService>, body: dto::CreateTankDto| async move {
                let resp = service.create_tank(body.name, body.room_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/tank/:id
fn get_tank(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "tank" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.tank(id).await;
            build_response(resp)
        })
        .boxed()
}

/// DELETE /api/tank/:id
///
/// Deletes the tank and its readings
fn delete_tank(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::delete())
        .and(warp::path!("api" / "tank" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.delete_tank(id).await;
            build_response(resp)
        })
        .boxed()
}

/// POST /api/tank/:id/values?date=YYYY-MM-DD
///
/// Replace all readings of the tank on the given day with the posted
/// measurements; days not named by the query stay untouched
///
/// Returns the tank the readings now belong to
fn save_tank_values(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::post())
        .and(warp::path!("api" / "tank" / i32 / "values"))
        .and(warp::query::<DayQuery>())
        .and(warp::body::json())
        .and_then(
            |service: Arc<FacilityService>,
             tank_id: i32,
             day: DayQuery,
             body: Vec<dto::ReadingEntryDto>| async move {
                let entries = body
                    .into_iter()
                    .map(|entry| ReadingEntry {
                        attribute_id: entry.attribute_id,
                        timestamp: entry.timestamp,
                        value: entry.value,
                    })
                    .collect();
                let resp = service.replace_tank_day(tank_id, entries, day.date()).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/tank/:id/values/:date
///
/// All readings of the tank on one day, ordered by timestamp
fn get_tank_values(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "tank" / i32 / "values" / NaiveDate))
        .and_then(
            |service: Arc<FacilityService>, tank_id: i32, day: chrono::NaiveDate| async move {
                let resp = service.tank_readings_on_day(tank_id, day).await;
                build_response(resp)
            },
        )
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreateTankDto {
        pub name: String,
        pub room_id: i32,
    }

    /// Incoming measurement; a supplied id is ignored, the day-replace
    /// call only ever creates readings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingEntryDto {
        #[serde(default)]
        pub id: Option<i32>,
        pub attribute_id: i32,
        pub timestamp: NaiveDateTime,
        pub value: f64,
    }
}
