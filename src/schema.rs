//! Batch record validation.
//!
//! `validate` checks a single draft and reports every failing field;
//! `validate_list` guards the store against malformed list payloads and
//! rejects the whole payload on the first bad element.

use chrono::{DateTime, Utc};
use cron::Schedule;
use reqwest::Url;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{BatchDraft, BatchRecord, Field, FieldErrors};

pub const MAX_JOB_NAME_CHARS: usize = 100;

pub const MSG_JOB_NAME_REQUIRED: &str = "Job name is required";
pub const MSG_JOB_NAME_TOO_LONG: &str = "Job name is too long";
pub const MSG_INVALID_CRON: &str = "Invalid cron expression";
pub const MSG_INVALID_URL: &str = "Invalid URL format";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("expected a JSON array of batch records, got {0}")]
    NotAnArray(&'static str),
    #[error("element {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("element {index} is invalid: {errors}")]
    Invalid { index: usize, errors: FieldErrors },
    #[error("element {index} repeats server id {id}")]
    DuplicateId { index: usize, id: i64 },
}

/// Validate a draft; all failing fields are reported together.
pub fn validate(candidate: &BatchDraft) -> Result<BatchRecord, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name_len = candidate.job_name.chars().count();
    if name_len == 0 {
        errors.add(Field::JobName, MSG_JOB_NAME_REQUIRED);
    } else if name_len > MAX_JOB_NAME_CHARS {
        errors.add(Field::JobName, MSG_JOB_NAME_TOO_LONG);
    }

    if parse_cron(&candidate.cron_expression).is_none() {
        errors.add(Field::CronExpression, MSG_INVALID_CRON);
    }

    if !is_absolute_url(&candidate.target_url) {
        errors.add(Field::TargetUrl, MSG_INVALID_URL);
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(BatchRecord {
        id: None,
        job_name: candidate.job_name.clone(),
        cron_expression: candidate.cron_expression.clone(),
        target_url: candidate.target_url.clone(),
        enabled: candidate.enabled,
    })
}

/// Type and validate a list payload as returned by the batch API.
pub fn validate_list(payload: &Value) -> Result<Vec<BatchRecord>, SchemaError> {
    let items = match payload {
        Value::Array(items) => items,
        other => return Err(SchemaError::NotAnArray(json_kind(other))),
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let record: BatchRecord = serde_json::from_value(item.clone())
            .map_err(|source| SchemaError::Malformed { index, source })?;
        validate(&record.draft()).map_err(|errors| SchemaError::Invalid { index, errors })?;
        if let Some(id) = record.id {
            if !seen.insert(id) {
                return Err(SchemaError::DuplicateId { index, id });
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Whether the expression is a valid five- or six-field cron schedule.
pub fn is_valid_cron(expression: &str) -> bool {
    parse_cron(expression).is_some()
}

/// Next fire time of a valid expression; display only.
pub fn next_run(expression: &str) -> Option<DateTime<Utc>> {
    parse_cron(expression)?.upcoming(Utc).next()
}

pub fn is_absolute_url(candidate: &str) -> bool {
    Url::parse(candidate).is_ok()
}

fn parse_cron(expression: &str) -> Option<Schedule> {
    let normalized = normalize_cron(expression)?;
    Schedule::from_str(&normalized).ok()
}

/// Rewrite standard cron syntax into the seconds-first form the `cron` crate
/// parses. Five fields get a zero seconds field; numeric day-of-week values
/// (0-7, Sunday is 0 or 7) become day names.
fn normalize_cron(expression: &str) -> Option<String> {
    let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();
    match fields.len() {
        5 => fields.insert(0, "0".to_string()),
        6 => {}
        _ => return None,
    }
    let dow = fields.last_mut()?;
    *dow = normalize_day_of_week(dow)?;
    Some(fields.join(" "))
}

const DAY_NAMES: [&str; 8] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn normalize_day_of_week(field: &str) -> Option<String> {
    let mut items = Vec::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };
        let with_step = |s: String| match step {
            Some(step) => format!("{}/{}", s, step),
            None => s,
        };
        match range.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (day_name(start)?, day_name(end)?);
                if end.1 == 7 && start.1 <= 7 {
                    // The parser has no day after Sat, so spell the days out.
                    let step = match step {
                        Some(step) => step.parse::<usize>().ok().filter(|n| *n > 0)?,
                        None => 1,
                    };
                    for day in (start.1 as usize..=7).step_by(step) {
                        let name = DAY_NAMES[day % 7].to_string();
                        if !items.contains(&name) {
                            items.push(name);
                        }
                    }
                } else {
                    items.push(with_step(format!("{}-{}", start.0, end.0)));
                }
            }
            None => items.push(with_step(day_name(range)?.0)),
        }
    }
    Some(items.join(","))
}

/// Map a day to its name and number; unknown names pass through unnumbered.
fn day_name(token: &str) -> Option<(String, u32)> {
    match token.parse::<u32>() {
        Ok(n) => DAY_NAMES
            .get(n as usize)
            .map(|name| (name.to_string(), n)),
        Err(_) if token.is_empty() => None,
        Err(_) => {
            let n = DAY_NAMES[..7]
                .iter()
                .position(|name| name.eq_ignore_ascii_case(token))
                .map_or(u32::MAX, |n| n as u32);
            Some((token.to_string(), n))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
