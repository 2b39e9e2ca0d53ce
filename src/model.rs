use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One to-do item as stored in the task slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "opt_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at,
            completed_at: None,
            edited_at: None,
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.completed {
            "[x]"
        } else {
            "[ ]"
        }
    }

    pub fn status_str(&self) -> &'static str {
        if self.completed {
            "completed"
        } else {
            "active"
        }
    }
}

/// Which subset of the collection the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => anyhow::bail!("invalid filter '{s}': must be all, active, or completed"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(e) => chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| e),
    }
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

mod opt_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format_timestamp(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|raw| super::parse_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn serializes_with_camel_case_and_iso_timestamps() {
        let task = Task::new(TaskId(1_700_000_000_000), "Buy milk".into(), at(0));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], 1_700_000_000_000_i64);
        assert_eq!(json["text"], "Buy milk");
        assert_eq!(json["completed"], false);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00.000Z");
        assert!(json["completedAt"].is_null());
        assert!(json.get("editedAt").is_none());
    }

    #[test]
    fn accepts_null_and_missing_optional_timestamps() {
        let raw = r#"[
            {"id": 1, "text": "a", "completed": false, "createdAt": "2024-01-01T10:00:00.000Z", "completedAt": null},
            {"id": 2, "text": "b", "completed": true, "createdAt": "2024-01-01T10:00:00Z",
             "completedAt": "2024-01-02T10:00:00.500Z", "editedAt": "2024-01-03T00:00:00+02:00"}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(raw).unwrap();
        assert_eq!(tasks[0].completed_at, None);
        assert_eq!(tasks[0].edited_at, None);
        assert!(tasks[1].completed_at.is_some());
        assert_eq!(
            format_timestamp(&tasks[1].edited_at.unwrap()),
            "2024-01-02T22:00:00.000Z"
        );
    }

    #[test]
    fn timestamps_without_offset_are_utc() {
        let raw = r#"{"id": 1, "text": "a", "createdAt": "2024-01-01T10:00:00",
                      "completedAt": "2024-01-01T11:30:00.250"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(format_timestamp(&task.created_at), "2024-01-01T10:00:00.000Z");
        assert_eq!(
            format_timestamp(&task.completed_at.unwrap()),
            "2024-01-01T11:30:00.250Z"
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn filter_parse_and_cycle() {
        assert_eq!(Filter::parse("active").unwrap(), Filter::Active);
        assert!(Filter::parse("done").is_err());
        assert_eq!(Filter::All.next().next().next(), Filter::All);
    }
}
