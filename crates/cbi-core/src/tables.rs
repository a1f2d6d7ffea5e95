//! Registry of every table the pipeline reads or writes.
//!
//! Source tables are owned by the collectors and are read-only here. Report
//! tables are owned by exactly one builder each. The string names are the
//! public contract consumed by downstream browsing and BI layers.

use std::fmt;
use std::str::FromStr;

/// A table known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    // ---- Source tables ----
    TaxiTrips,
    BuildingPermits,
    PublicHealth,
    Ccvi,
    Covid,

    // ---- Report tables ----
    Disadvantaged,
    DisadvantagedPermits,
    CovidCategories,
    DriverAlerts,
    ResidentAlerts,
    AirportTrips,
    CcviTrips,
    DailyTrips,
    WeeklyTrips,
    MonthlyTrips,
    WeeklyPickups,
    WeeklyDropoffs,
}

/// Source tables in the order the start-up gate checks them.
pub const SOURCE_TABLES: [Table; 5] = [
    Table::BuildingPermits,
    Table::Ccvi,
    Table::Covid,
    Table::PublicHealth,
    Table::TaxiTrips,
];

/// Every report table.
pub const REPORT_TABLES: [Table; 12] = [
    Table::Disadvantaged,
    Table::DisadvantagedPermits,
    Table::CovidCategories,
    Table::DriverAlerts,
    Table::ResidentAlerts,
    Table::AirportTrips,
    Table::CcviTrips,
    Table::DailyTrips,
    Table::WeeklyTrips,
    Table::MonthlyTrips,
    Table::WeeklyPickups,
    Table::WeeklyDropoffs,
];

impl Table {
    /// The table's name in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaxiTrips => "taxi_trips",
            Self::BuildingPermits => "building_permits",
            Self::PublicHealth => "public_health",
            Self::Ccvi => "ccvi",
            Self::Covid => "covid",
            Self::Disadvantaged => "disadvantaged",
            Self::DisadvantagedPermits => "report_7_disadv_perm",
            Self::CovidCategories => "covid_rep_cats",
            Self::DriverAlerts => "req_1a_covid_alerts_drivers",
            Self::ResidentAlerts => "req_1b_covid_alerts_residents",
            Self::AirportTrips => "req_2_airport_trips",
            Self::CcviTrips => "req_3_ccvi_trips",
            Self::DailyTrips => "req_4_daily_trips",
            Self::WeeklyTrips => "req_4_weekly_trips",
            Self::MonthlyTrips => "req_4_monthly_trips",
            Self::WeeklyPickups => "weekly_trips_by_pickup_and_zip",
            Self::WeeklyDropoffs => "weekly_trips_by_dropoff_and_zip",
        }
    }

    /// True for tables written by collectors.
    pub const fn is_source(self) -> bool {
        matches!(
            self,
            Self::TaxiTrips | Self::BuildingPermits | Self::PublicHealth | Self::Ccvi | Self::Covid
        )
    }

    /// Name of the scratch table used to rematerialize this table in sorted order.
    pub fn sorted_scratch_name(self) -> String {
        format!("{}_sorted", self.as_str())
    }

    /// All registered tables, sources first.
    pub fn all() -> impl Iterator<Item = Table> {
        SOURCE_TABLES.into_iter().chain(REPORT_TABLES)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a name is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table: {0}")]
pub struct UnknownTable(pub String);

impl FromStr for Table {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::all()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for table in Table::all() {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
    }

    #[test]
    fn source_and_report_lists_are_disjoint() {
        assert!(SOURCE_TABLES.iter().all(|t| t.is_source()));
        assert!(REPORT_TABLES.iter().all(|t| !t.is_source()));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("trips".parse::<Table>().is_err());
    }
}
