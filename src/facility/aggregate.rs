use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::FacilityService;
use crate::error::ServiceError;
use crate::models::{Attribute, Reading, Scope};

/// One mean value per UTC calendar day, keyed by date. Days without
/// readings are absent, never emitted as zero.
pub type DailyAverages = BTreeMap<NaiveDate, f64>;

impl FacilityService {
    /// Daily averages of a single attribute over the given scope and
    /// inclusive date range.
    pub async fn daily_average(
        &self,
        scope: Scope,
        attribute_id: i32,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<(Attribute, DailyAverages), ServiceError> {
        self.resolve_scope(scope).await?;
        let attribute = self.attribute(attribute_id).await?;

        let (start, end) = range_bounds(from, until);
        let readings = self
            .readings
            .find_in_range(scope, attribute.id, start, end)
            .await?;
        Ok((attribute, daily_averages(&readings)))
    }

    /// Daily averages of every catalog attribute over the same scope and
    /// range, one series per attribute.
    pub async fn daily_average_all(
        &self,
        scope: Scope,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<(Attribute, DailyAverages)>, ServiceError> {
        self.resolve_scope(scope).await?;

        let (start, end) = range_bounds(from, until);
        let mut series = Vec::new();
        for attribute in self.hierarchy.find_all_attributes().await? {
            let readings = self
                .readings
                .find_in_range(scope, attribute.id, start, end)
                .await?;
            series.push((attribute, daily_averages(&readings)));
        }
        Ok(series)
    }
}

/// Half-open UTC bounds of an inclusive date range.
fn range_bounds(from: NaiveDate, until: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        from.and_time(NaiveTime::MIN),
        (until + Duration::days(1)).and_time(NaiveTime::MIN),
    )
}

/// Groups readings by their UTC calendar date and folds each group into
/// its arithmetic mean. Duplicate (tank, attribute, timestamp) readings
/// contribute separately.
pub(crate) fn daily_averages(readings: &[Reading]) -> DailyAverages {
    let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for reading in readings {
        let entry = sums.entry(reading.timestamp.date()).or_insert((0.0, 0));
        entry.0 += reading.value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(day: &str, time: &str, value: f64) -> Reading {
        Reading {
            id: None,
            tank_id: 1,
            attribute_id: 1,
            timestamp: format!("{}T{}", day, time).parse().unwrap(),
            value,
        }
    }

    #[test]
    fn averages_group_by_calendar_date() {
        let readings = vec![
            reading("2024-01-01", "08:00:00", 10.0),
            reading("2024-01-01", "20:00:00", 20.0),
            reading("2024-01-02", "12:00:00", 5.0),
        ];

        let averages = daily_averages(&readings);
        assert_eq!(2, averages.len());
        assert_eq!(15.0, averages[&"2024-01-01".parse().unwrap()]);
        assert_eq!(5.0, averages[&"2024-01-02".parse().unwrap()]);
    }

    #[test]
    fn averages_skip_empty_days() {
        let readings = vec![
            reading("2024-01-01", "08:00:00", 1.0),
            reading("2024-01-03", "08:00:00", 3.0),
        ];

        let averages = daily_averages(&readings);
        assert_eq!(2, averages.len());
        assert!(!averages.contains_key(&"2024-01-02".parse::<NaiveDate>().unwrap()));
    }

    #[test]
    fn averages_of_no_readings_are_empty() {
        assert!(daily_averages(&[]).is_empty());
    }

    #[test]
    fn duplicate_timestamps_contribute_separately() {
        let readings = vec![
            reading("2024-01-01", "08:00:00", 10.0),
            reading("2024-01-01", "08:00:00", 20.0),
            reading("2024-01-01", "08:00:00", 60.0),
        ];

        let averages = daily_averages(&readings);
        assert_eq!(30.0, averages[&"2024-01-01".parse().unwrap()]);
    }

    #[test]
    fn range_bounds_cover_the_until_day() {
        let (start, end) = range_bounds(
            "2024-01-01".parse().unwrap(),
            "2024-01-02".parse().unwrap(),
        );
        assert_eq!("2024-01-01T00:00:00".parse::<NaiveDateTime>().unwrap(), start);
        assert_eq!("2024-01-03T00:00:00".parse::<NaiveDateTime>().unwrap(), end);
    }
}
