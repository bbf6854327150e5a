use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A declarative description of a scheduled job as exchanged with the batch API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub job_name: String,
    pub cron_expression: String,
    pub target_url: String,
    pub enabled: bool,
}

impl BatchRecord {
    /// Business fields only; the shape sent on create and update.
    pub fn draft(&self) -> BatchDraft {
        BatchDraft {
            job_name: self.job_name.clone(),
            cron_expression: self.cron_expression.clone(),
            target_url: self.target_url.clone(),
            enabled: self.enabled,
        }
    }
}

/// Unvalidated field values, as held by the form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraft {
    pub job_name: String,
    pub cron_expression: String,
    pub target_url: String,
    pub enabled: bool,
}

impl Default for BatchDraft {
    fn default() -> Self {
        Self {
            job_name: String::new(),
            cron_expression: String::new(),
            target_url: String::new(),
            enabled: true,
        }
    }
}

impl BatchDraft {
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::JobName(v) => self.job_name = v,
            FieldValue::CronExpression(v) => self.cron_expression = v,
            FieldValue::TargetUrl(v) => self.target_url = v,
            FieldValue::Enabled(v) => self.enabled = v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    JobName,
    CronExpression,
    TargetUrl,
    Enabled,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::JobName => "jobName",
            Field::CronExpression => "cronExpression",
            Field::TargetUrl => "targetUrl",
            Field::Enabled => "enabled",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single form edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    JobName(String),
    CronExpression(String),
    TargetUrl(String),
    Enabled(bool),
}

/// Field name -> first failing rule's message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; later failures for the same field are dropped.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Client-side identity of a listed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Server-issued id; valid as an update/delete target.
    Server(i64),
    /// Synthetic key for records the server returned without an id.
    Local { session: String, seq: u64 },
}

impl EntryKey {
    pub fn server_id(&self) -> Option<i64> {
        match self {
            EntryKey::Server(id) => Some(*id),
            EntryKey::Local { .. } => None,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Server(id) => write!(f, "s{}", id),
            EntryKey::Local { session, seq } => write!(f, "l{}-{}", session, seq),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry key: {0}")]
pub struct ParseEntryKeyError(String);

impl FromStr for EntryKey {
    type Err = ParseEntryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEntryKeyError(s.to_string());
        if let Some(id) = s.strip_prefix('s') {
            return id.parse().map(EntryKey::Server).map_err(|_| err());
        }
        if let Some(rest) = s.strip_prefix('l') {
            let (session, seq) = rest.rsplit_once('-').ok_or_else(err)?;
            if session.is_empty() {
                return Err(err());
            }
            let seq = seq.parse().map_err(|_| err())?;
            return Ok(EntryKey::Local {
                session: session.to_string(),
                seq,
            });
        }
        Err(err())
    }
}

/// A listed record together with its client-side key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub key: EntryKey,
    pub record: BatchRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_uses_camel_case_on_the_wire() {
        let record = BatchRecord {
            id: None,
            job_name: "Daily Sync".into(),
            cron_expression: "0 0 * * *".into(),
            target_url: "https://x.example/hook".into(),
            enabled: true,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "jobName": "Daily Sync",
                "cronExpression": "0 0 * * *",
                "targetUrl": "https://x.example/hook",
                "enabled": true,
            })
        );
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add(Field::JobName, "Job name is required");
        errors.add(Field::JobName, "Job name is too long");
        assert_eq!(errors.get(Field::JobName), Some("Job name is required"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "jobName: Job name is required");
    }

    #[test]
    fn entry_key_parses_its_display_form() {
        let server = EntryKey::Server(17);
        assert_eq!(server.to_string(), "s17");
        assert_eq!("s17".parse::<EntryKey>().unwrap(), server);

        let local = EntryKey::Local {
            session: "9f1c2a7b".into(),
            seq: 3,
        };
        assert_eq!(local.to_string(), "l9f1c2a7b-3");
        assert_eq!("l9f1c2a7b-3".parse::<EntryKey>().unwrap(), local);
        assert_eq!(local.server_id(), None);

        assert!("x1".parse::<EntryKey>().is_err());
        assert!("l-3".parse::<EntryKey>().is_err());
        assert!("sabc".parse::<EntryKey>().is_err());
    }
}
