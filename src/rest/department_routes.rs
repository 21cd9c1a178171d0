use std::sync::Arc;

use warp::Filter;

use super::build_response;
use crate::facility::FacilityService;
use crate::models::Department;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_departments(service.clone())
        .or(save_departments(service.clone()))
        .or(get_department(service.clone()))
        .or(delete_department(service.clone()))
}

/// GET /api/department
///
/// Fetch the whole department forest, rooms and tanks included
fn get_departments(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "department"))
        .and_then(|service: Arc<FacilityService>| async move {
            let resp = service.departments().await;
            build_response(resp)
        })
        .boxed()
}

/// POST /api/department
///
/// Merge the posted forest into persisted state: nodes without an id are
/// created, matched nodes are renamed, and persisted nodes missing from
/// the payload are deleted with their subtree and readings
///
/// Returns the saved forest with every id assigned
fn save_departments(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::post())
        .and(warp::path!("api" / "department"))
        .and(warp::body::json())
        .and_then(
            |service: Arc<FacilityService>, body: Vec<Department>| async move {
                let resp = service.create_or_update_departments(body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/department/:id
fn get_department(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "department" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.department(id).await;
            build_response(resp)
        })
        .boxed()
}

/// DELETE /api/department/:id
///
/// Deletes the department with its rooms, tanks and readings
fn delete_department(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::delete())
        .and(warp::path!("api" / "department" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.delete_department(id).await;
            build_response(resp)
        })
        .boxed()
}
