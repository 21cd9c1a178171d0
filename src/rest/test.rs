use std::sync::Arc;

use super::*;
use crate::models::{Attribute, Department, Reading, Room, Tank};
use crate::store::memory::MemoryStore;

fn build_mocked_service() -> Arc<FacilityService> {
    let store = Arc::new(MemoryStore::new());
    FacilityService::new(store.clone(), store)
}

fn forest_payload() -> Vec<Department> {
    vec![Department {
        id: None,
        name: "Breeding".to_owned(),
        rooms: vec![Room {
            id: None,
            name: "North".to_owned(),
            department_id: None,
            tanks: vec![Tank {
                id: None,
                name: "T-1".to_owned(),
                room_id: None,
            }],
        }],
    }]
}

async fn seed_forest(service: &FacilityService) -> Vec<Department> {
    service
        .create_or_update_departments(forest_payload())
        .await
        .unwrap()
}

async fn seed_attribute(service: &FacilityService) -> Attribute {
    service
        .save_attribute(Attribute {
            id: None,
            name: "temperature".to_owned(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_rest_save_and_get_departments() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let res = warp::test::request()
        .path("/api/department")
        .method("POST")
        .json(&forest_payload())
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    let saved: Vec<Department> = serde_json::from_slice(res.body()).unwrap();
    assert!(saved[0].id.is_some());

    let res = warp::test::request()
        .path("/api/department")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let fetched: Vec<Department> = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(saved, fetched);
}

#[tokio::test]
async fn test_rest_get_unknown_department_fails() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let res = warp::test::request()
        .path("/api/department/4711")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 400);
    let _: dto::ErrorResponseDto = serde_json::from_slice(res.body()).unwrap();
}

#[tokio::test]
async fn test_rest_create_and_delete_tank() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);
    let saved = seed_forest(&service).await;
    let room_id = saved[0].rooms[0].id.unwrap();

    // Execute
    let body = tank_routes::dto::CreateTankDto {
        name: "T-2".to_owned(),
        room_id,
    };
    let res = warp::test::request()
        .path("/api/tank")
        .method("POST")
        .json(&body)
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    let tank: Tank = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(Some(room_id), tank.room_id);

    let res = warp::test::request()
        .path(&format!("/api/tank/{}", tank.id.unwrap()))
        .method("DELETE")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);

    let res = warp::test::request()
        .path(&format!("/api/tank/{}", tank.id.unwrap()))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_rest_save_and_fetch_tank_values() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);
    let saved = seed_forest(&service).await;
    let attribute = seed_attribute(&service).await;
    let tank_id = saved[0].rooms[0].tanks[0].id.unwrap();

    // Execute
    let body = vec![
        tank_routes::dto::ReadingEntryDto {
            id: None,
            attribute_id: attribute.id.unwrap(),
            timestamp: "2024-01-01T08:00:00".parse().unwrap(),
            value: 21.5,
        },
        tank_routes::dto::ReadingEntryDto {
            id: None,
            attribute_id: attribute.id.unwrap(),
            timestamp: "2024-01-01T20:00:00".parse().unwrap(),
            value: 22.5,
        },
    ];
    let res = warp::test::request()
        .path(&format!("/api/tank/{}/values?date=2024-01-01", tank_id))
        .method("POST")
        .json(&body)
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    let tank: Tank = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(Some(tank_id), tank.id);

    let res = warp::test::request()
        .path(&format!("/api/tank/{}/values/2024-01-01", tank_id))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let readings: Vec<Reading> = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(2, readings.len());
    assert_eq!(21.5, readings[0].value);
}

#[tokio::test]
async fn test_rest_save_tank_values_unknown_tank_fails() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let res = warp::test::request()
        .path("/api/tank/4711/values?date=2024-01-01")
        .method("POST")
        .json(&Vec::<tank_routes::dto::ReadingEntryDto>::new())
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_rest_attribute_crud() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let body = Attribute {
        id: None,
        name: "pH".to_owned(),
    };
    let res = warp::test::request()
        .path("/api/attribute")
        .method("POST")
        .json(&body)
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    let attribute: Attribute = serde_json::from_slice(res.body()).unwrap();
    assert!(attribute.id.is_some());

    let res = warp::test::request()
        .path("/api/attribute")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let all: Vec<Attribute> = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(vec![attribute.clone()], all);

    let res = warp::test::request()
        .path(&format!("/api/attribute/{}", attribute.id.unwrap()))
        .method("DELETE")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_rest_daily_average() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);
    let saved = seed_forest(&service).await;
    let attribute = seed_attribute(&service).await;
    let tank_id = saved[0].rooms[0].tanks[0].id.unwrap();
    service
        .replace_tank_day(
            tank_id,
            vec![
                crate::facility::ingest::ReadingEntry {
                    attribute_id: attribute.id.unwrap(),
                    timestamp: "2024-01-01T08:00:00".parse().unwrap(),
                    value: 10.0,
                },
                crate::facility::ingest::ReadingEntry {
                    attribute_id: attribute.id.unwrap(),
                    timestamp: "2024-01-01T20:00:00".parse().unwrap(),
                    value: 20.0,
                },
            ],
            "2024-01-01".parse().unwrap(),
        )
        .await
        .unwrap();

    // Execute
    let res = warp::test::request()
        .path(&format!(
            "/api/stats/tank/{}/attribute/{}/daily-average?from=2024-01-01&until=2024-01-02",
            tank_id,
            attribute.id.unwrap()
        ))
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    let series: stats_routes::dto::AttributeSeriesDto =
        serde_json::from_slice(res.body()).unwrap();
    assert_eq!("temperature", series.attribute.name);
    assert_eq!(1, series.data_points.len());
    assert_eq!(15.0, series.data_points[0].value);

    let res = warp::test::request()
        .path(&format!(
            "/api/stats/tank/{}/daily-average?from=2024-01-01&until=2024-01-02",
            tank_id
        ))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let all: Vec<stats_routes::dto::AttributeSeriesDto> =
        serde_json::from_slice(res.body()).unwrap();
    assert_eq!(1, all.len());
}

#[tokio::test]
async fn test_rest_daily_average_rejects_inverted_range() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);
    let saved = seed_forest(&service).await;
    let attribute = seed_attribute(&service).await;
    let tank_id = saved[0].rooms[0].tanks[0].id.unwrap();

    // Execute
    let res = warp::test::request()
        .path(&format!(
            "/api/stats/tank/{}/attribute/{}/daily-average?from=2024-01-02&until=2024-01-01",
            tank_id,
            attribute.id.unwrap()
        ))
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_rest_daily_average_rejects_unknown_scope_kind() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let res = warp::test::request()
        .path("/api/stats/aquarium/1/daily-average?from=2024-01-01&until=2024-01-02")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_rest_health() {
    // Prepare
    let service = build_mocked_service();
    let routes = routes(&service);

    // Execute
    let res = warp::test::request().path("/api/health").reply(&routes).await;

    // Validate
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(Some(true), body["healthy"].as_bool());
}
