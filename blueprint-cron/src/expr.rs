use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CronError, CronResult};

/// Which slot of a cron expression a field occupies.
///
/// Expressions carry 5 or 6 whitespace-separated fields; the optional sixth
/// is a seconds field prepended at the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Seconds,
    Minutes,
    Hours,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl FieldKind {
    /// Inclusive value range for this field.
    ///
    /// Day-of-week allows both 0 and 7 for Sunday.
    pub fn range(self) -> (u32, u32) {
        match self {
            Self::Seconds => (0, 59),
            Self::Minutes => (0, 59),
            Self::Hours => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 7),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
        }
    }
}

/// One parsed cron field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CronField {
    /// `*`
    All,
    /// `?` - accepted everywhere, equivalent to `*`
    Any,
    /// A single value
    Value(u32),
    /// `a-b`, inclusive
    Range(u32, u32),
    /// `base/step` where base is `*`, a value, or a range
    Step(Box<CronField>, u32),
    /// Comma list of the above
    List(Vec<CronField>),
}

impl CronField {
    /// Expand to the concrete set of values this field matches.
    fn expand(&self, kind: FieldKind, out: &mut BTreeSet<u32>) {
        let (min, max) = kind.range();
        match self {
            Self::All | Self::Any => out.extend(min..=max),
            Self::Value(v) => {
                out.insert(*v);
            }
            Self::Range(a, b) => out.extend(*a..=*b),
            Self::Step(base, step) => {
                let (start, end) = match base.as_ref() {
                    Self::Value(v) => (*v, max),
                    Self::Range(a, b) => (*a, *b),
                    _ => (min, max),
                };
                out.extend((start..=end).step_by(*step as usize));
            }
            Self::List(items) => {
                for item in items {
                    item.expand(kind, out);
                }
            }
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, Self::All | Self::Any)
    }
}

/// A validated cron expression.
///
/// Grammar per field: `*`, `?`, a value, a range `a-b`, a step `a/b` or
/// `*/b`, and comma lists of those. Every concrete value is checked against
/// the field's range at parse time, so a stored `CronExpr` is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpr {
    source: String,
    seconds: CronField,
    minutes: CronField,
    hours: CronField,
    days_of_month: CronField,
    months: CronField,
    days_of_week: CronField,
}

impl CronExpr {
    /// Parse and validate an expression.
    ///
    /// A 5-field expression pins seconds to 0; 6 fields read the first as
    /// seconds.
    pub fn parse(source: &str) -> CronResult<Self> {
        let fields: Vec<&str> = source.split_whitespace().collect();
        let (seconds, rest) = match fields.len() {
            5 => (CronField::Value(0), &fields[..]),
            6 => (parse_field(FieldKind::Seconds, fields[0])?, &fields[1..]),
            n => return Err(CronError::FieldCount(n)),
        };

        Ok(Self {
            source: source.trim().to_string(),
            seconds,
            minutes: parse_field(FieldKind::Minutes, rest[0])?,
            hours: parse_field(FieldKind::Hours, rest[1])?,
            days_of_month: parse_field(FieldKind::DayOfMonth, rest[2])?,
            months: parse_field(FieldKind::Month, rest[3])?,
            days_of_week: parse_field(FieldKind::DayOfWeek, rest[4])?,
        })
    }

    /// The expression as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn field(&self, kind: FieldKind) -> &CronField {
        match kind {
            FieldKind::Seconds => &self.seconds,
            FieldKind::Minutes => &self.minutes,
            FieldKind::Hours => &self.hours,
            FieldKind::DayOfMonth => &self.days_of_month,
            FieldKind::Month => &self.months,
            FieldKind::DayOfWeek => &self.days_of_week,
        }
    }

    /// Concrete values a field matches.
    ///
    /// Day-of-week values are normalized so 7 folds into 0 (Sunday).
    pub fn field_values(&self, kind: FieldKind) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        self.field(kind).expand(kind, &mut out);
        if kind == FieldKind::DayOfWeek {
            out = out.into_iter().map(|v| v % 7).collect();
        }
        out
    }

    /// Compile to a [`cron::Schedule`] for interval timing.
    ///
    /// The runtime crate numbers days-of-week 1-7, so that field is rendered
    /// as day names; every other field is rendered as its expanded value
    /// list. Wildcards stay `*`.
    pub fn schedule(&self) -> CronResult<cron::Schedule> {
        let rendered = self.render_for_runtime();
        cron::Schedule::from_str(&rendered).map_err(|e| CronError::Compile(e.to_string()))
    }

    fn render_for_runtime(&self) -> String {
        const DOW_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

        let plain = |kind: FieldKind| -> String {
            if self.field(kind).is_wildcard() {
                return "*".to_string();
            }
            self.field_values(kind)
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        let dow = if self.days_of_week.is_wildcard() {
            "*".to_string()
        } else {
            self.field_values(FieldKind::DayOfWeek)
                .iter()
                .map(|v| DOW_NAMES[*v as usize])
                .collect::<Vec<_>>()
                .join(",")
        };

        format!(
            "{} {} {} {} {} {}",
            plain(FieldKind::Seconds),
            plain(FieldKind::Minutes),
            plain(FieldKind::Hours),
            plain(FieldKind::DayOfMonth),
            plain(FieldKind::Month),
            dow,
        )
    }
}

fn parse_field(kind: FieldKind, token: &str) -> CronResult<CronField> {
    if token.is_empty() {
        return Err(CronError::Malformed {
            field: kind.name(),
            token: token.to_string(),
        });
    }

    if token.contains(',') {
        let items = token
            .split(',')
            .map(|atom| parse_atom(kind, atom))
            .collect::<CronResult<Vec<_>>>()?;
        return Ok(CronField::List(items));
    }

    parse_atom(kind, token)
}

fn parse_atom(kind: FieldKind, token: &str) -> CronResult<CronField> {
    if let Some((base, step)) = token.split_once('/') {
        let step: u32 = step.parse().map_err(|_| CronError::Malformed {
            field: kind.name(),
            token: token.to_string(),
        })?;
        if step == 0 {
            return Err(CronError::ZeroStep { field: kind.name() });
        }
        let base = parse_simple(kind, base)?;
        return Ok(CronField::Step(Box::new(base), step));
    }

    parse_simple(kind, token)
}

fn parse_simple(kind: FieldKind, token: &str) -> CronResult<CronField> {
    match token {
        "*" => Ok(CronField::All),
        "?" => Ok(CronField::Any),
        _ if token.contains('-') => {
            let (a, b) = token.split_once('-').expect("checked above");
            let start = parse_value(kind, a, token)?;
            let end = parse_value(kind, b, token)?;
            if start > end {
                return Err(CronError::InvertedRange {
                    field: kind.name(),
                    start,
                    end,
                });
            }
            Ok(CronField::Range(start, end))
        }
        _ => Ok(CronField::Value(parse_value(kind, token, token)?)),
    }
}

fn parse_value(kind: FieldKind, digits: &str, token: &str) -> CronResult<u32> {
    let value: u32 = digits.parse().map_err(|_| CronError::Malformed {
        field: kind.name(),
        token: token.to_string(),
    })?;
    let (min, max) = kind.range();
    if value < min || value > max {
        return Err(CronError::OutOfRange {
            field: kind.name(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

impl FromStr for CronExpr {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronExpr {
    type Error = CronError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CronExpr> for String {
    fn from(expr: CronExpr) -> Self {
        expr.source
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_field_expression_pins_seconds_to_zero() {
        let expr = CronExpr::parse("30 4 * * *").unwrap();
        assert_eq!(expr.field(FieldKind::Seconds), &CronField::Value(0));
        assert_eq!(expr.field(FieldKind::Minutes), &CronField::Value(30));
        assert_eq!(expr.field(FieldKind::Hours), &CronField::Value(4));
    }

    #[test]
    fn six_field_expression_reads_leading_seconds() {
        let expr = CronExpr::parse("15 30 4 * * *").unwrap();
        assert_eq!(expr.field(FieldKind::Seconds), &CronField::Value(15));
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert_eq!(
            CronExpr::parse("* * * *").unwrap_err(),
            CronError::FieldCount(4)
        );
        assert_eq!(
            CronExpr::parse("* * * * * * *").unwrap_err(),
            CronError::FieldCount(7)
        );
    }

    #[test]
    fn ranges_steps_and_lists_parse() {
        let expr = CronExpr::parse("0 9-17 * * 1-5").unwrap();
        assert_eq!(expr.field(FieldKind::Hours), &CronField::Range(9, 17));

        let expr = CronExpr::parse("*/15 * * * *").unwrap();
        assert_eq!(
            expr.field(FieldKind::Minutes),
            &CronField::Step(Box::new(CronField::All), 15)
        );

        let expr = CronExpr::parse("1,15,30 * * * *").unwrap();
        assert_eq!(
            expr.field(FieldKind::Minutes),
            &CronField::List(vec![
                CronField::Value(1),
                CronField::Value(15),
                CronField::Value(30),
            ])
        );
    }

    #[test]
    fn question_mark_is_wildcard() {
        let expr = CronExpr::parse("0 0 ? * ?").unwrap();
        assert_eq!(expr.field(FieldKind::DayOfMonth), &CronField::Any);
        let all: Vec<u32> = expr.field_values(FieldKind::DayOfMonth).into_iter().collect();
        assert_eq!(all.len(), 31);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            CronExpr::parse("60 * * * *").unwrap_err(),
            CronError::OutOfRange { field: "minutes", value: 60, .. }
        ));
        assert!(matches!(
            CronExpr::parse("0 24 * * *").unwrap_err(),
            CronError::OutOfRange { field: "hours", value: 24, .. }
        ));
        assert!(matches!(
            CronExpr::parse("0 0 0 * *").unwrap_err(),
            CronError::OutOfRange { field: "day-of-month", value: 0, .. }
        ));
        assert!(matches!(
            CronExpr::parse("0 0 * 13 *").unwrap_err(),
            CronError::OutOfRange { field: "month", value: 13, .. }
        ));
        assert!(matches!(
            CronExpr::parse("0 0 * * 8").unwrap_err(),
            CronError::OutOfRange { field: "day-of-week", value: 8, .. }
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(
            CronExpr::parse("a * * * *").unwrap_err(),
            CronError::Malformed { field: "minutes", .. }
        ));
        assert!(matches!(
            CronExpr::parse("*/0 * * * *").unwrap_err(),
            CronError::ZeroStep { field: "minutes" }
        ));
        assert!(matches!(
            CronExpr::parse("10-5 * * * *").unwrap_err(),
            CronError::InvertedRange { field: "minutes", start: 10, end: 5 }
        ));
    }

    #[test]
    fn step_expansion_starts_at_base() {
        let expr = CronExpr::parse("5/15 * * * *").unwrap();
        let values: Vec<u32> = expr.field_values(FieldKind::Minutes).into_iter().collect();
        assert_eq!(values, vec![5, 20, 35, 50]);

        let expr = CronExpr::parse("10-30/10 * * * *").unwrap();
        let values: Vec<u32> = expr.field_values(FieldKind::Minutes).into_iter().collect();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn sunday_aliases_fold_together() {
        let expr = CronExpr::parse("0 0 * * 7").unwrap();
        let values: Vec<u32> = expr.field_values(FieldKind::DayOfWeek).into_iter().collect();
        assert_eq!(values, vec![0]);
    }

    #[test]
    fn compiles_to_runtime_schedule() {
        let expr = CronExpr::parse("*/5 9-17 * * 1-5").unwrap();
        let schedule = expr.schedule().unwrap();
        assert!(schedule.upcoming(chrono::Utc).next().is_some());

        // dow 0 and 7 both mean Sunday and must survive the numbering bridge
        let sunday = CronExpr::parse("0 12 * * 0").unwrap();
        assert!(sunday.schedule().is_ok());
        let sunday = CronExpr::parse("0 12 * * 7").unwrap();
        assert!(sunday.schedule().is_ok());
    }

    #[test]
    fn serde_round_trips_through_source() {
        let expr = CronExpr::parse("0 3 * * 1").unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"0 3 * * 1\"");
        let back: CronExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);

        assert!(serde_json::from_str::<CronExpr>("\"not a cron\"").is_err());
    }
}
