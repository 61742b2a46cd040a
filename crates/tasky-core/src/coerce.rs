use chrono::{Datelike, Local, NaiveDate, TimeZone};
use regex::Regex;

use crate::schema::{AttrKind, AttributeSpec};
use crate::task::{AttrValue, TaskError};

/// Hour of day applied to abbreviated `DDMM` due dates.
pub const DUE_HOUR: u32 = 18;

/// Display form shared by due dates, creation times and event times.
pub const DISPLAY_FORMAT: &str = "%H:%M %d/%m/%y";

pub fn is_none_literal(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("none")
}

pub fn format_instant(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Converts raw token text into an attribute's declared type.
///
/// `DDMM` dates carry no year, so the year they resolve into is held here
/// explicitly instead of being baked into the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coercer {
    reference_year: i32,
}

impl Coercer {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn for_current_year() -> Self {
        Self::new(Local::now().year())
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Returns `Ok(None)` for the `none` literal on nullable attributes.
    pub fn coerce(
        &self,
        spec: &AttributeSpec,
        raw: &str,
    ) -> Result<Option<AttrValue>, TaskError> {
        if is_none_literal(raw) {
            if spec.nullable {
                return Ok(None);
            }
            return Err(TaskError::invalid_assignment(
                spec.name,
                "attribute cannot be cleared",
            ));
        }
        let value = match spec.kind {
            AttrKind::Text => AttrValue::Text(raw.to_string()),
            // Non-finite values serialize as JSON null and could not be read back.
            AttrKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(AttrValue::Number)
                .ok_or_else(|| TaskError::invalid_value(spec.name, raw, "expected a number"))?,
            AttrKind::Instant => AttrValue::Instant(self.parse_day_month(spec.name, raw)?),
        };
        Ok(Some(value))
    }

    fn parse_day_month(&self, attr: &str, raw: &str) -> Result<i64, TaskError> {
        let re = Regex::new(r"^([0-9]{2})([0-9]{2})$").expect("regex");
        let caps = re
            .captures(raw)
            .ok_or_else(|| TaskError::invalid_value(attr, raw, "expected a DDMM date"))?;
        let day: u32 = caps[1]
            .parse()
            .map_err(|_| TaskError::invalid_value(attr, raw, "unparsable day"))?;
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| TaskError::invalid_value(attr, raw, "unparsable month"))?;
        let naive = NaiveDate::from_ymd_opt(self.reference_year, month, day)
            .and_then(|date| date.and_hms_opt(DUE_HOUR, 0, 0))
            .ok_or_else(|| {
                TaskError::invalid_value(
                    attr,
                    raw,
                    format!("no such date in {}", self.reference_year),
                )
            })?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| TaskError::invalid_value(attr, raw, "time does not exist locally"))?;
        Ok(local.timestamp())
    }
}

impl Default for Coercer {
    fn default() -> Self {
        Self::for_current_year()
    }
}
