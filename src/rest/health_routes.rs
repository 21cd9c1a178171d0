use std::sync::Arc;

use warp::Filter;

use super::build_response;
use crate::facility::FacilityService;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(service.clone())
}

/// GET /api/health
fn health(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("api" / "health"))
        .and_then(|service: Arc<FacilityService>| async move {
            let department_count = service
                .departments()
                .await
                .map(|departments| departments.len())
                .unwrap_or(0);
            let database_state = service.check_db().await;
            let ret = dto::HealthyDto {
                healthy: database_state == "healthy",
                database_state,
                department_count,
            };
            build_response(Ok(ret))
        })
        .boxed()
}

mod dto {
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    pub struct HealthyDto {
        pub healthy: bool,
        pub database_state: String,
        pub department_count: usize,
    }
}
