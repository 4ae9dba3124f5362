//! Availability expressions.
//!
//! An expression lists the instants at which a scheduled task may fire, at
//! minute resolution, as five or six whitespace separated fields:
//!
//! ```text
//! minute hour day-of-month month day-of-week [year]
//! ```
//!
//! Each field accepts `*`, single values, ranges (`1-5`), lists (`1,15`) and
//! steps (`*/10`). Weekdays run from 0 (Sunday) to 6 (Saturday); names such as
//! `Mon` also work. Evaluation is delegated to the `cron` crate with the
//! seconds field pinned to zero, so an instant is eligible when the minute it
//! falls in matches every field.

use chrono::{DateTime, Timelike, Utc};
use cron::Schedule;
use std::str::FromStr;
use thiserror::Error;

/// Why an availability expression was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("expected 5 or 6 fields (minute hour day month weekday [year]), found {0}")]
    FieldCount(usize),

    #[error("could not parse {expression:?}: {message}")]
    Syntax { expression: String, message: String },
}

/// A parsed availability expression.
#[derive(Debug, Clone)]
pub struct Availability {
    expression: String,
    schedule: Schedule,
}

impl Availability {
    /// Parse and validate an expression.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let mut fields: Vec<String> = expression.split_whitespace().map(String::from).collect();

        match fields.len() {
            0 => return Err(ExpressionError::Empty),
            5 => fields.push("*".to_string()),
            6 => {}
            n => return Err(ExpressionError::FieldCount(n)),
        }
        fields[4] = shift_weekdays(&fields[4]);
        let cron_expr = format!("0 {}", fields.join(" "));

        let schedule = Schedule::from_str(&cron_expr).map_err(|e| ExpressionError::Syntax {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// Whether `instant` falls in an eligible minute.
    pub fn is_eligible(&self, instant: DateTime<Utc>) -> bool {
        let minute = instant
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(instant);
        self.schedule.includes(minute)
    }

    /// The expression as originally written.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// Weekday numbers count from 0 here and from 1 in the `cron` crate.
fn shift_weekdays(field: &str) -> String {
    field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let range = range
                .split('-')
                .map(|part| match part.parse::<u32>() {
                    Ok(n) => (n + 1).to_string(),
                    Err(_) => part.to_string(),
                })
                .collect::<Vec<_>>()
                .join("-");
            match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
