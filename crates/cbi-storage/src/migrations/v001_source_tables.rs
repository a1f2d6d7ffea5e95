//! v001: the five collector source tables.
//!
//! `IF NOT EXISTS` throughout so a database already populated by the
//! collectors is left untouched.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS taxi_trips (
    id INTEGER PRIMARY KEY,
    trip_id TEXT UNIQUE,
    trip_start_timestamp TEXT,
    trip_end_timestamp TEXT,
    pickup_centroid_latitude REAL,
    pickup_centroid_longitude REAL,
    dropoff_centroid_latitude REAL,
    dropoff_centroid_longitude REAL,
    pickup_community_area TEXT,
    dropoff_community_area TEXT,
    pickup_zip_code TEXT,
    dropoff_zip_code TEXT,
    trip_type TEXT
);

CREATE TABLE IF NOT EXISTS building_permits (
    id TEXT PRIMARY KEY,
    permit_id TEXT UNIQUE,
    permit_type TEXT,
    issue_date TEXT,
    street_number TEXT,
    street_name TEXT,
    latitude REAL,
    longitude REAL,
    community_area TEXT,
    census_tract TEXT
);

CREATE TABLE IF NOT EXISTS public_health (
    community_area TEXT PRIMARY KEY,
    below_poverty_level REAL,
    unemployment REAL,
    per_capita_income REAL
);

CREATE TABLE IF NOT EXISTS ccvi (
    id INTEGER PRIMARY KEY,
    geography_type TEXT,
    community_area_or_zip TEXT UNIQUE,
    community_area_name TEXT,
    ccvi_score REAL,
    ccvi_category TEXT
);

CREATE TABLE IF NOT EXISTS covid (
    id INTEGER PRIMARY KEY,
    zip_code TEXT,
    week_start TEXT,
    week_end TEXT,
    case_rate_weekly REAL,
    percent_tested_positive_weekly REAL,
    UNIQUE (zip_code, week_start, week_end)
);
"#;
