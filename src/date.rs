//! CSL date variables.
//!
//! A date is a single date or a range, given as `date-parts`, and may also
//! carry a season, an approximation flag, a free-text literal, and the raw
//! text it was parsed from.

use crate::convert::{Value, field_error, unexpected_field};
use crate::error::{CslError, Result};
use crate::schema::SchemaKind;
use crate::{CslObject, Flag, NumOrStr};
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;

/// One component of `date-parts`: a year, month or day.
pub type DatePart = NumOrStr;

/// A CSL date variable.
///
/// `date-parts` holds one entry for a single date or two for a range, each
/// entry being `[year]`, `[year, month]` or `[year, month, day]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Date {
    date_parts: Option<Vec<Vec<DatePart>>>,
    season: Option<NumOrStr>,
    circa: Option<Flag>,
    literal: Option<String>,
    raw: Option<String>,
}

impl Date {
    /// A date from `date-parts`.
    ///
    /// # Errors
    ///
    /// Returns [`CslError::InvalidDateParts`] if there are more than two
    /// entries, or an entry is empty or has more than three components.
    pub fn new(date_parts: Vec<Vec<DatePart>>) -> Result<Self> {
        check_date_parts(&date_parts)?;
        Ok(Self {
            date_parts: Some(date_parts),
            ..Self::default()
        })
    }

    /// A date given as free text.
    pub fn literal(literal: impl Into<String>) -> Self {
        Self {
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    /// A single date, or a range when `end` is given.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pkgcite::Date;
    ///
    /// let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    /// let date = Date::from_date(start, Some(end));
    /// assert_eq!(date.date_parts().unwrap().len(), 2);
    /// ```
    pub fn from_date(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let date_parts: Vec<Vec<DatePart>> = std::iter::once(start)
            .chain(end)
            .map(|d| vec![d.year().into(), d.month().into(), d.day().into()])
            .collect();
        Self {
            date_parts: Some(date_parts),
            ..Self::default()
        }
    }

    pub fn with_season(mut self, season: impl Into<NumOrStr>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn with_circa(mut self, circa: impl Into<Flag>) -> Self {
        self.circa = Some(circa.into());
        self
    }

    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    /// Keep the unparsed source text alongside the structured date.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn date_parts(&self) -> Option<&[Vec<DatePart>]> {
        self.date_parts.as_deref()
    }

    pub fn season(&self) -> Option<&NumOrStr> {
        self.season.as_ref()
    }

    pub fn circa(&self) -> Option<&Flag> {
        self.circa.as_ref()
    }

    pub fn literal_text(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Whether this date spans two `date-parts` entries.
    pub fn is_range(&self) -> bool {
        self.date_parts.as_ref().is_some_and(|parts| parts.len() == 2)
    }

    /// The start date, if its components are numeric and form a valid
    /// calendar date. Missing month or day default to 1.
    pub fn start(&self) -> Option<NaiveDate> {
        let first = self.date_parts.as_ref()?.first()?;
        let number = |i: usize, default: i64| match first.get(i) {
            None => Some(default),
            Some(NumOrStr::Number(n)) => n.as_i64(),
            Some(NumOrStr::Str(s)) => s.trim().parse().ok(),
        };
        let year = i32::try_from(number(0, 0)?).ok()?;
        let month = u32::try_from(number(1, 1)?).ok()?;
        let day = u32::try_from(number(2, 1)?).ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn check_date_parts(date_parts: &[Vec<DatePart>]) -> Result<()> {
    if date_parts.len() > 2 {
        return Err(CslError::InvalidDateParts(format!(
            "expected at most 2 dates, found {}",
            date_parts.len()
        )));
    }
    if let Some(part) = date_parts.iter().find(|p| p.is_empty() || p.len() > 3) {
        return Err(CslError::InvalidDateParts(format!(
            "expected 1 to 3 components, found {}",
            part.len()
        )));
    }
    Ok(())
}

fn parts_from_value(value: Value, field: &str) -> Result<Option<Vec<Vec<DatePart>>>> {
    const KIND: SchemaKind = SchemaKind::Date;
    let outer = match value {
        Value::Null => return Ok(None),
        Value::List(outer) => outer,
        other => return Err(field_error(KIND, field, "a list of lists", &other)),
    };
    let parts: Vec<Vec<DatePart>> = outer
        .into_iter()
        .map(|inner| match inner {
            Value::List(components) => components
                .into_iter()
                .map(|c| match NumOrStr::from_value(c, KIND, field)? {
                    Some(part) => Ok(part),
                    None => Err(field_error(KIND, field, "a string or number", &Value::Null)),
                })
                .try_collect(),
            other => Err(field_error(KIND, field, "a list of lists", &other)),
        })
        .try_collect()?;
    check_date_parts(&parts)?;
    Ok(Some(parts))
}

impl CslObject for Date {
    const KIND: SchemaKind = SchemaKind::Date;

    fn to_internal(&self) -> Value {
        let date_parts = self.date_parts.as_ref().map(|parts| {
            Value::List(
                parts
                    .iter()
                    .map(|p| Value::List(p.iter().cloned().map(Value::from).collect()))
                    .collect(),
            )
        });
        Value::map([
            ("date_parts", date_parts.into()),
            ("season", self.season.clone().into()),
            ("circa", self.circa.clone().into()),
            ("literal", self.literal.clone().into()),
            ("raw", self.raw.clone().into()),
        ])
    }

    fn from_internal(value: Value) -> Result<Self> {
        const KIND: SchemaKind = SchemaKind::Date;
        let mut date = Date::default();
        for (key, value) in value.into_entries(KIND)? {
            match key.as_str() {
                "date_parts" => date.date_parts = parts_from_value(value, &key)?,
                "season" => date.season = NumOrStr::from_value(value, KIND, &key)?,
                "circa" => date.circa = Flag::from_value(value, KIND, &key)?,
                "literal" => date.literal = value.into_string(KIND, &key)?,
                "raw" => date.raw = value.into_string(KIND, &key)?,
                _ => return Err(unexpected_field(KIND, &key)),
            }
        }
        date.to_external()?;
        Ok(date)
    }
}
