use std::sync::Arc;

use warp::Filter;

use super::build_response;
use crate::facility::FacilityService;
use crate::models::Attribute;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_attributes(service.clone())
        .or(save_attribute(service.clone()))
        .or(get_attribute(service.clone()))
        .or(delete_attribute(service.clone()))
}

/// GET /api/attribute
fn get_attributes(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "attribute"))
        .and_then(|service: Arc<FacilityService>| async move {
            let resp = service.attributes().await;
            build_response(resp)
        })
        .boxed()
}

/// POST /api/attribute
///
/// Create a catalog attribute, or rename one when the body carries an id
fn save_attribute(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::post())
        .and(warp::path!("api" / "attribute"))
        .and(warp::body::json())
        .and_then(
            |service: Arc<FacilityService>, body: Attribute| async move {
                let resp = service.save_attribute(body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/attribute/:id
fn get_attribute(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "attribute" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.attribute(id).await;
            build_response(resp)
        })
        .boxed()
}

/// DELETE /api/attribute/:id
fn delete_attribute(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::delete())
        .and(warp::path!("api" / "attribute" / i32))
        .and_then(|service: Arc<FacilityService>, id: i32| async move {
            let resp = service.delete_attribute(id).await;
            build_response(resp)
        })
        .boxed()
}
