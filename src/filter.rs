// 📅 Period Filter - Date-range and category scoping
// Selects the event subset the Aggregation Engine or an export consumes.
//
// The empty-set law: a categorical filter left empty means "no
// restriction", NOT "restrict to nothing". The entry UI pre-selects all
// categories, so a user clearing a multiselect must not silently produce
// an empty report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::{IntakeEvent, OuttakeEvent};
use crate::validation::ValidationError;

// ============================================================================
// MONTH RANGE
// ============================================================================

/// First and last calendar day of (year, month), proleptic Gregorian.
/// Handles variable month lengths and leap years. None for month ∉ 1..=12.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month.pred_opt()?;
    Some((first, last))
}

// ============================================================================
// PERIOD FILTER
// ============================================================================

/// Inclusive date range plus optional categorical restrictions.
///
/// `date >= date_from AND date <= date_to`; each non-empty category set
/// restricts to membership, an empty set passes everything through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,

    /// Empty = all materials
    pub materials: Vec<String>,

    /// Empty = all origins (intakes only)
    pub origins: Vec<String>,

    /// Empty = all recyclers (intakes only)
    pub recyclers: Vec<String>,
}

impl PeriodFilter {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        PeriodFilter {
            date_from,
            date_to,
            materials: Vec::new(),
            origins: Vec::new(),
            recyclers: Vec::new(),
        }
    }

    /// Filter covering a whole calendar month.
    pub fn for_month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let (first, last) = month_range(year, month).ok_or_else(|| {
            ValidationError::new(
                "month",
                format!("No such calendar month: {}-{:02}", year, month),
                "Periodo",
            )
        })?;
        Ok(PeriodFilter::new(first, last))
    }

    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = materials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recyclers<I, S>(mut self, recyclers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recyclers = recyclers.into_iter().map(Into::into).collect();
        self
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to
    }

    pub fn matches_intake(&self, event: &IntakeEvent) -> bool {
        self.in_range(event.date)
            && set_allows(&self.materials, &event.material)
            && set_allows(&self.origins, &event.origin)
            && set_allows(&self.recyclers, &event.recycler)
    }

    /// Outtakes carry no origin/recycler - only the date range and the
    /// material set apply.
    pub fn matches_outtake(&self, event: &OuttakeEvent) -> bool {
        self.in_range(event.date) && set_allows(&self.materials, &event.material)
    }

    pub fn filter_intakes(&self, events: &[IntakeEvent]) -> Vec<IntakeEvent> {
        events
            .iter()
            .filter(|e| self.matches_intake(e))
            .cloned()
            .collect()
    }

    pub fn filter_outtakes(&self, events: &[OuttakeEvent]) -> Vec<OuttakeEvent> {
        events
            .iter()
            .filter(|e| self.matches_outtake(e))
            .cloned()
            .collect()
    }
}

/// Empty selection = pass-through, otherwise membership.
fn set_allows(set: &[String], value: &str) -> bool {
    set.is_empty() || set.iter().any(|s| s == value)
}

// ============================================================================
// TESTS
// ============================================================================
