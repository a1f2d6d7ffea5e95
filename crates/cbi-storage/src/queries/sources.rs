//! Writes to the collector source tables.
//!
//! Each table keeps the conflict policy its collector relies on: trips and
//! permits are insert-if-absent, the indicator tables are upserts.

use cbi_core::errors::StorageError;
use rusqlite::{params, Connection};

use super::sqlite_err;

#[derive(Debug, Clone, Default)]
pub struct TaxiTripRecord {
    pub trip_id: String,
    pub trip_start_timestamp: Option<String>,
    pub trip_end_timestamp: Option<String>,
    pub pickup_centroid_latitude: Option<f64>,
    pub pickup_centroid_longitude: Option<f64>,
    pub dropoff_centroid_latitude: Option<f64>,
    pub dropoff_centroid_longitude: Option<f64>,
    pub pickup_community_area: Option<String>,
    pub dropoff_community_area: Option<String>,
    pub pickup_zip_code: Option<String>,
    pub dropoff_zip_code: Option<String>,
    pub trip_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildingPermitRecord {
    pub id: String,
    pub permit_id: Option<String>,
    pub permit_type: Option<String>,
    pub issue_date: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub community_area: Option<String>,
    pub census_tract: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PublicHealthRecord {
    pub community_area: String,
    pub below_poverty_level: Option<f64>,
    pub unemployment: Option<f64>,
    pub per_capita_income: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CcviRecord {
    pub geography_type: Option<String>,
    pub community_area_or_zip: String,
    pub community_area_name: Option<String>,
    pub ccvi_score: Option<f64>,
    pub ccvi_category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CovidRecord {
    pub zip_code: String,
    pub week_start: String,
    pub week_end: String,
    pub case_rate_weekly: Option<f64>,
    pub percent_tested_positive_weekly: Option<f64>,
}

/// Insert a trip unless one with the same `trip_id` exists. Returns true when
/// a row was written.
pub fn insert_taxi_trip(conn: &Connection, trip: &TaxiTripRecord) -> Result<bool, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO taxi_trips (
                trip_id, trip_start_timestamp, trip_end_timestamp,
                pickup_centroid_latitude, pickup_centroid_longitude,
                dropoff_centroid_latitude, dropoff_centroid_longitude,
                pickup_community_area, dropoff_community_area,
                pickup_zip_code, dropoff_zip_code, trip_type
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (trip_id) DO NOTHING",
        )
        .map_err(sqlite_err)?;
    let changed = stmt
        .execute(params![
            trip.trip_id,
            trip.trip_start_timestamp,
            trip.trip_end_timestamp,
            trip.pickup_centroid_latitude,
            trip.pickup_centroid_longitude,
            trip.dropoff_centroid_latitude,
            trip.dropoff_centroid_longitude,
            trip.pickup_community_area,
            trip.dropoff_community_area,
            trip.pickup_zip_code,
            trip.dropoff_zip_code,
            trip.trip_type,
        ])
        .map_err(sqlite_err)?;
    Ok(changed > 0)
}

/// Insert a permit unless one with the same `id` or `permit_id` exists.
pub fn insert_building_permit(
    conn: &Connection,
    permit: &BuildingPermitRecord,
) -> Result<bool, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO building_permits (
                id, permit_id, permit_type, issue_date, street_number, street_name,
                latitude, longitude, community_area, census_tract
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .map_err(sqlite_err)?;
    let changed = stmt
        .execute(params![
            permit.id,
            permit.permit_id,
            permit.permit_type,
            permit.issue_date,
            permit.street_number,
            permit.street_name,
            permit.latitude,
            permit.longitude,
            permit.community_area,
            permit.census_tract,
        ])
        .map_err(sqlite_err)?;
    Ok(changed > 0)
}

pub fn upsert_public_health(
    conn: &Connection,
    record: &PublicHealthRecord,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO public_health (community_area, below_poverty_level, unemployment, per_capita_income)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (community_area) DO UPDATE SET
            below_poverty_level = excluded.below_poverty_level,
            unemployment = excluded.unemployment,
            per_capita_income = excluded.per_capita_income",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.community_area,
            record.below_poverty_level,
            record.unemployment,
            record.per_capita_income,
        ])
    })
    .map_err(sqlite_err)?;
    Ok(())
}

pub fn upsert_ccvi(conn: &Connection, record: &CcviRecord) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO ccvi (geography_type, community_area_or_zip, community_area_name, ccvi_score, ccvi_category)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (community_area_or_zip) DO UPDATE SET
            geography_type = excluded.geography_type,
            community_area_name = excluded.community_area_name,
            ccvi_score = excluded.ccvi_score,
            ccvi_category = excluded.ccvi_category",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.geography_type,
            record.community_area_or_zip,
            record.community_area_name,
            record.ccvi_score,
            record.ccvi_category,
        ])
    })
    .map_err(sqlite_err)?;
    Ok(())
}

pub fn upsert_covid(conn: &Connection, record: &CovidRecord) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO covid (zip_code, week_start, week_end, case_rate_weekly, percent_tested_positive_weekly)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (zip_code, week_start, week_end) DO UPDATE SET
            case_rate_weekly = excluded.case_rate_weekly,
            percent_tested_positive_weekly = excluded.percent_tested_positive_weekly",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.zip_code,
            record.week_start,
            record.week_end,
            record.case_rate_weekly,
            record.percent_tested_positive_weekly,
        ])
    })
    .map_err(sqlite_err)?;
    Ok(())
}
