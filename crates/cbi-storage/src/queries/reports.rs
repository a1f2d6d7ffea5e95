//! Typed reads of the report tables.

use cbi_core::errors::StorageError;
use cbi_core::Table;
use rusqlite::Connection;
use serde::Serialize;

use super::sqlite_err;
use crate::sql::Statement;

/// The three forward-projection granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastHorizon {
    Daily,
    Weekly,
    Monthly,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    pub const fn table(self) -> Table {
        match self {
            Self::Daily => Table::DailyTrips,
            Self::Weekly => Table::WeeklyTrips,
            Self::Monthly => Table::MonthlyTrips,
        }
    }

    /// The bucket column shared by the alerts table and the forecast table.
    pub const fn bucket_column(self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week_start",
            Self::Monthly => "month_start",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisadvantagedRow {
    pub community_area: String,
    pub below_poverty_level: Option<f64>,
    pub unemployment: Option<f64>,
    pub zip_code: String,
    pub top_5_poverty: bool,
    pub top_5_unemployment: bool,
    pub disadvantaged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitReportRow {
    pub id: String,
    pub community_area: Option<String>,
    /// GeoJSON point, NULL when either coordinate is missing.
    pub point: Option<String>,
    pub zip_code: String,
    pub top_5_poverty: bool,
    pub top_5_unemployment: bool,
    pub waived_fee: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovidCategoryRow {
    pub zip_code: String,
    pub week_start: String,
    pub case_rate_weekly: Option<f64>,
    pub covid_cat: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverAlertRow {
    pub trip_id: String,
    pub pickup_zip_code: Option<String>,
    pub dropoff_zip_code: Option<String>,
    pub airport_pickup: bool,
    pub airport_dropoff: bool,
    pub day: Option<String>,
    pub week_start: Option<String>,
    pub month_start: Option<String>,
    pub pickup_covid_cat: Option<String>,
    pub dropoff_covid_cat: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentAlertRow {
    pub zip_code: String,
    pub week_start: String,
    pub covid_cat: Option<String>,
    pub weekly_pickups: i64,
    pub weekly_dropoffs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportTripRow {
    pub zip_code: String,
    pub week_start: String,
    pub covid_cat: Option<String>,
    pub trips_to_airport: i64,
    pub trips_from_airport: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CcviTripRow {
    pub community_area_or_zip: String,
    pub ccvi_category: Option<String>,
    pub week_start: String,
    pub weekly_trips: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub zip_code: Option<String>,
    pub bucket: Option<String>,
    pub trips: f64,
}

pub fn disadvantaged_rows(conn: &Connection) -> Result<Vec<DisadvantagedRow>, StorageError> {
    let sql = Statement::new(
        "SELECT community_area, below_poverty_level, unemployment, zip_code, \
         top_5_poverty, top_5_unemployment, disadvantaged FROM ",
    )
    .table(Table::Disadvantaged)
    .kw(" ORDER BY CAST(community_area AS INTEGER), community_area");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DisadvantagedRow {
                community_area: row.get(0)?,
                below_poverty_level: row.get(1)?,
                unemployment: row.get(2)?,
                zip_code: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                top_5_poverty: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
                top_5_unemployment: row.get::<_, Option<bool>>(5)?.unwrap_or(false),
                disadvantaged: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn permit_report_rows(conn: &Connection) -> Result<Vec<PermitReportRow>, StorageError> {
    let sql = Statement::new(
        "SELECT id, community_area, point, zip_code, top_5_poverty, top_5_unemployment, waived_fee FROM ",
    )
    .table(Table::DisadvantagedPermits)
    .kw(" ORDER BY id");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PermitReportRow {
                id: row.get(0)?,
                community_area: row.get(1)?,
                point: row.get(2)?,
                zip_code: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                top_5_poverty: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
                top_5_unemployment: row.get::<_, Option<bool>>(5)?.unwrap_or(false),
                waived_fee: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn covid_category_rows(conn: &Connection) -> Result<Vec<CovidCategoryRow>, StorageError> {
    let sql = Statement::new("SELECT zip_code, week_start, case_rate_weekly, covid_cat FROM ")
        .table(Table::CovidCategories)
        .kw(" ORDER BY zip_code, week_start");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CovidCategoryRow {
                zip_code: row.get(0)?,
                week_start: row.get(1)?,
                case_rate_weekly: row.get(2)?,
                covid_cat: row.get(3)?,
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn driver_alert_rows(conn: &Connection) -> Result<Vec<DriverAlertRow>, StorageError> {
    let sql = Statement::new(
        "SELECT trip_id, pickup_zip_code, dropoff_zip_code, airport_pickup, airport_dropoff, \
         day, week_start, month_start, pickup_covid_cat, dropoff_covid_cat FROM ",
    )
    .table(Table::DriverAlerts)
    .kw(" ORDER BY trip_id");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DriverAlertRow {
                trip_id: row.get(0)?,
                pickup_zip_code: row.get(1)?,
                dropoff_zip_code: row.get(2)?,
                airport_pickup: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
                airport_dropoff: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
                day: row.get(5)?,
                week_start: row.get(6)?,
                month_start: row.get(7)?,
                pickup_covid_cat: row.get(8)?,
                dropoff_covid_cat: row.get(9)?,
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn resident_alert_rows(conn: &Connection) -> Result<Vec<ResidentAlertRow>, StorageError> {
    let sql = Statement::new(
        "SELECT zip_code, week_start, covid_cat, weekly_pickups, weekly_dropoffs FROM ",
    )
    .table(Table::ResidentAlerts)
    .kw(" ORDER BY zip_code, week_start");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ResidentAlertRow {
                zip_code: row.get(0)?,
                week_start: row.get(1)?,
                covid_cat: row.get(2)?,
                weekly_pickups: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                weekly_dropoffs: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// Airport trip counts in stored order.
pub fn airport_trip_rows(conn: &Connection) -> Result<Vec<AirportTripRow>, StorageError> {
    let sql = Statement::new(
        "SELECT zip_code, week_start, covid_cat, trips_to_airport, trips_from_airport FROM ",
    )
    .table(Table::AirportTrips)
    .kw(" ORDER BY rowid");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AirportTripRow {
                zip_code: row.get(0)?,
                week_start: row.get(1)?,
                covid_cat: row.get(2)?,
                trips_to_airport: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                trips_from_airport: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// High-risk CCVI trip volumes in stored order.
pub fn ccvi_trip_rows(conn: &Connection) -> Result<Vec<CcviTripRow>, StorageError> {
    let sql = Statement::new(
        "SELECT community_area_or_zip, ccvi_category, week_start, weekly_trips FROM ",
    )
    .table(Table::CcviTrips)
    .kw(" ORDER BY rowid");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CcviTripRow {
                community_area_or_zip: row.get(0)?,
                ccvi_category: row.get(1)?,
                week_start: row.get(2)?,
                weekly_trips: row.get(3)?,
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn forecast_rows(
    conn: &Connection,
    horizon: ForecastHorizon,
) -> Result<Vec<ForecastRow>, StorageError> {
    let sql = match horizon {
        ForecastHorizon::Daily => Statement::new("SELECT zip_code, day, trips FROM "),
        ForecastHorizon::Weekly => Statement::new("SELECT zip_code, week_start, trips FROM "),
        ForecastHorizon::Monthly => Statement::new("SELECT zip_code, month_start, trips FROM "),
    }
    .table(horizon.table())
    .kw(" ORDER BY zip_code");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ForecastRow {
                zip_code: row.get(0)?,
                bucket: row.get(1)?,
                trips: row.get(2)?,
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}
