//! `covid_rep_cats`: the weekly COVID table with a low/medium/high category.

use cbi_core::constants::{COVID_HIGH_THRESHOLD, COVID_MEDIUM_THRESHOLD};
use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::sql::{Literal, Statement};
use rusqlite::Connection;

use super::step::{add_column, copy_table, drop_table};
use super::{ReportBuilder, Step, StepPlan};

/// Weekly case-rate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CovidCategory {
    Low,
    Medium,
    High,
}

impl CovidCategory {
    /// `None` for negative, NaN or missing rates.
    pub fn from_rate(rate: Option<f64>) -> Option<Self> {
        let rate = rate?;
        if rate >= COVID_HIGH_THRESHOLD {
            Some(Self::High)
        } else if rate >= COVID_MEDIUM_THRESHOLD {
            Some(Self::Medium)
        } else if rate >= 0.0 {
            Some(Self::Low)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Default)]
pub struct CovidCategoriesBuilder;

const DEPENDENCIES: [Table; 1] = [Table::Covid];
const OUTPUTS: [Table; 1] = [Table::CovidCategories];

impl CovidCategoriesBuilder {
    /// The feed sends `2024-01-07T00:00:00.000`; trip weeks are plain dates.
    fn normalize_weeks_statement() -> Statement {
        Statement::new("UPDATE ")
            .table(Table::CovidCategories)
            .kw(" SET week_start = COALESCE(date(week_start), week_start),")
            .kw(" week_end = COALESCE(date(week_end), week_end)")
    }

    fn bucket_statement() -> Statement {
        let medium = Literal::Real(COVID_MEDIUM_THRESHOLD);
        let high = Literal::Real(COVID_HIGH_THRESHOLD);
        Statement::new("UPDATE ")
            .table(Table::CovidCategories)
            .kw(" SET covid_cat = CASE")
            .kw(" WHEN case_rate_weekly >= 0 AND case_rate_weekly < ")
            .literal(&medium)
            .kw(" THEN 'low'")
            .kw(" WHEN case_rate_weekly >= ")
            .literal(&medium)
            .kw(" AND case_rate_weekly < ")
            .literal(&high)
            .kw(" THEN 'medium'")
            .kw(" WHEN case_rate_weekly >= ")
            .literal(&high)
            .kw(" THEN 'high'")
            .kw(" END")
    }
}

impl ReportBuilder for CovidCategoriesBuilder {
    fn name(&self) -> &'static str {
        "covid_categories"
    }

    fn dependencies(&self) -> &[Table] {
        &DEPENDENCIES
    }

    fn outputs(&self) -> &[Table] {
        &OUTPUTS
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        let target = Table::CovidCategories;
        Ok(StepPlan::new()
            .sql("drop_target", drop_table(target))
            .sql("copy_covid", copy_table(target, Table::Covid))
            .sql("normalize_week_dates", Self::normalize_weeks_statement())
            .sql("add_covid_cat", add_column(target, "covid_cat TEXT"))
            .sql("bucket_case_rate", Self::bucket_statement())
            .into_steps())
    }
}
