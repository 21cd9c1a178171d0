#[derive(serde::Serialize, serde::Deserialize)]
pub struct DateQuery {
    from: chrono::NaiveDate,
    until: chrono::NaiveDate,
}

impl DateQuery {
    pub fn from(&self) -> chrono::NaiveDate {
        self.from
    }

    pub fn until(&self) -> chrono::NaiveDate {
        self.until
    }

    // both bounds are inclusive days, a single-day range is fine
    pub fn is_valid(&self) -> bool {
        self.from <= self.until
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct DayQuery {
    date: chrono::NaiveDate,
}

impl DayQuery {
    pub fn date(&self) -> chrono::NaiveDate {
        self.date
    }
}
