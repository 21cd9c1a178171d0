use std::sync::Arc;

use warp::Filter;

use super::{build_response, query::DateQuery};
use crate::error::{ApiError, ServiceError};
use crate::facility::FacilityService;
use crate::models::Scope;

pub fn routes(
    service: &Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    scoped_average(service.clone()).or(scoped_average_all(service.clone()))
}

/// GET /api/stats/{tank|room|department}/:id/attribute/:attr/daily-average?from=&until=
///
/// One mean per calendar day for a single attribute, readings pooled over
/// every tank inside the scope. Days without readings are absent
fn scoped_average(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!(
            "api" / "stats" / String / i32 / "attribute" / i32 / "daily-average"
        ))
        .and(warp::query::<DateQuery>())
        .and_then(
            |service: Arc<FacilityService>,
             kind: String,
             id: i32,
             attribute_id: i32,
             range: DateQuery| async move {
                let resp = async {
                    let scope = parse_scope(&kind, id)?;
                    if !range.is_valid() {
                        return Err(ApiError::ArgumentError().into());
                    }
                    let (attribute, averages) = service
                        .daily_average(scope, attribute_id, range.from(), range.until())
                        .await?;
                    Ok::<_, ServiceError>(dto::AttributeSeriesDto::new(attribute, averages))
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/stats/{tank|room|department}/:id/daily-average?from=&until=
///
/// Same aggregation for every catalog attribute, one series each
fn scoped_average_all(
    service: Arc<FacilityService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::get())
        .and(warp::path!("api" / "stats" / String / i32 / "daily-average"))
        .and(warp::query::<DateQuery>())
        .and_then(
            |service: Arc<FacilityService>, kind: String, id: i32, range: DateQuery| async move {
                let resp = async {
                    let scope = parse_scope(&kind, id)?;
                    if !range.is_valid() {
                        return Err(ApiError::ArgumentError().into());
                    }
                    let series = service
                        .daily_average_all(scope, range.from(), range.until())
                        .await?;
                    Ok::<_, ServiceError>(
                        series
                            .into_iter()
                            .map(|(attribute, averages)| {
                                dto::AttributeSeriesDto::new(attribute, averages)
                            })
                            .collect::<Vec<_>>(),
                    )
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

fn parse_scope(kind: &str, id: i32) -> Result<Scope, ApiError> {
    match kind {
        "tank" => Ok(Scope::Tank(id)),
        "room" => Ok(Scope::Room(id)),
        "department" => Ok(Scope::Department(id)),
        _ => Err(ApiError::ArgumentError()),
    }
}

///
/// DTO
///
pub mod dto {
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};

    use crate::facility::aggregate::DailyAverages;
    use crate::models::Attribute;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AttributeSeriesDto {
        pub attribute: Attribute,
        pub data_points: Vec<DataPointDto>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DataPointDto {
        pub timestamp: NaiveDate,
        pub value: f64,
    }

    impl AttributeSeriesDto {
        pub fn new(attribute: Attribute, averages: DailyAverages) -> Self {
            AttributeSeriesDto {
                attribute,
                data_points: averages
                    .into_iter()
                    .map(|(timestamp, value)| DataPointDto { timestamp, value })
                    .collect(),
            }
        }
    }
}
