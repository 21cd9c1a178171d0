use std::sync::Arc;

use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

use crate::config::CONFIG;
use crate::error::ServiceError;
use crate::facility::FacilityService;

mod attribute_routes;
mod department_routes;
mod health_routes;
pub(crate) mod query;
mod stats_routes;
mod tank_routes;

#[cfg(test)]
mod test;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    department_routes::routes(service)
        .or(tank_routes::routes(service))
        .or(attribute_routes::routes(service))
        .or(stats_routes::routes(service))
        .or(health_routes::routes(service))
}

pub(crate) fn build_response<T: serde::Serialize>(
    resp: Result<T, ServiceError>,
) -> Result<Box<dyn warp::Reply>, warp::Rejection> {
    match resp {
        Ok(data) => Ok(Box::new(warp::reply::json(&data))),
        Err(ServiceError::User(err)) => {
            warn!("{}", err);
            let body = warp::reply::json(&dto::ErrorResponseDto {
                error: format!("{}", err),
            });
            Ok(Box::new(warp::reply::with_status(
                body,
                StatusCode::BAD_REQUEST,
            )))
        }
        Err(ServiceError::Internal(err)) => {
            error!("{}", err);
            Ok(Box::new(warp::reply::with_status(
                warp::reply(),
                StatusCode::INTERNAL_SERVER_ERROR,
            )))
        }
    }
}

pub async fn dispatch_server_daemon(service: Arc<FacilityService>) {
    let port: u16 = CONFIG
        .server_port()
        .parse()
        .expect("SERVER_PORT must be a port number");

    info!("Starting webserver at 0.0.0.0:{}", port);
    warp::serve(routes(&service)).run(([0, 0, 0, 0], port)).await;
}

pub mod dto {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorResponseDto {
        pub error: String,
    }
}
