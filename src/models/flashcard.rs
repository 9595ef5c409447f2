// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flashcard model: a titled, colored card holding an ordered task list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Separator of the legacy single-string task representation.
pub const TASK_DELIMITER: char = ',';

/// Maximum title length accepted from clients.
pub const MAX_TITLE_LEN: usize = 200;

/// Flashcard stored in Firestore (`flashcards` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Flashcard {
    /// Store-generated document ID
    pub id: String,
    /// Owner's uid
    pub uid: String,
    pub title: String,
    pub tasks: TaskList,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub color: CardColor,
    /// Due date, serialized as `YYYY-MM-DD`
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: CompletionStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

// ─── Task List ───────────────────────────────────────────────

/// Ordered list of tasks on a card.
///
/// Deserializes from either an array of strings or the legacy comma-joined
/// string. Entries are trimmed and blank entries dropped in both cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct TaskList(Vec<String>);

impl TaskList {
    /// Build a task list, normalizing each entry.
    pub fn new<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tasks
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Parse the legacy comma-joined form.
    pub fn parse_joined(joined: &str) -> Self {
        Self::new(joined.split(TASK_DELIMITER))
    }

    /// Display form; `parse_joined` recovers the same list.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for TaskList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Items(Vec<String>),
            Joined(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Items(items) => TaskList::new(items),
            Raw::Joined(joined) => TaskList::parse_joined(&joined),
        })
    }
}

fn validate_tasks(tasks: &TaskList) -> Result<(), ValidationError> {
    if tasks.is_empty() {
        return Err(ValidationError::new("tasks_empty")
            .with_message("a flashcard needs at least one task".into()));
    }
    if tasks.as_slice().iter().any(|t| t.contains(TASK_DELIMITER)) {
        return Err(ValidationError::new("task_delimiter")
            .with_message("task text must not contain a comma".into()));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(ValidationError::new("title_length")
            .with_message(format!("title must be 1 to {MAX_TITLE_LEN} characters").into()));
    }
    Ok(())
}

// ─── Color ───────────────────────────────────────────────────

/// Card color from the fixed palette. Stored as its hex value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CardColor {
    #[default]
    Red,
    Yellow,
    Orange,
    Green,
    Blue,
}

impl CardColor {
    pub const ALL: [CardColor; 5] = [
        CardColor::Red,
        CardColor::Yellow,
        CardColor::Orange,
        CardColor::Green,
        CardColor::Blue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CardColor::Red => "red",
            CardColor::Yellow => "yellow",
            CardColor::Orange => "orange",
            CardColor::Green => "green",
            CardColor::Blue => "blue",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            CardColor::Red => "#ffcccc",
            CardColor::Yellow => "#ffffcc",
            CardColor::Orange => "#ffe5cc",
            CardColor::Green => "#ccffcc",
            CardColor::Blue => "#cce5ff",
        }
    }
}

impl TryFrom<String> for CardColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let wanted = value.trim().to_ascii_lowercase();
        CardColor::ALL
            .into_iter()
            .find(|c| c.name() == wanted || c.hex() == wanted)
            .ok_or_else(|| format!("unknown card color {value:?}"))
    }
}

impl From<CardColor> for String {
    fn from(color: CardColor) -> Self {
        color.hex().to_string()
    }
}

// ─── Status ──────────────────────────────────────────────────

/// Completion status. The only allowed change is `NotDone -> Complete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum CompletionStatus {
    #[default]
    #[serde(rename = "not done", alias = "incomplete")]
    NotDone,
    #[serde(rename = "complete")]
    Complete,
}

impl CompletionStatus {
    pub fn can_transition_to(self, next: CompletionStatus) -> bool {
        self == next || (self == CompletionStatus::NotDone && next == CompletionStatus::Complete)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionStatus::NotDone => f.write_str("not done"),
            CompletionStatus::Complete => f.write_str("complete"),
        }
    }
}

/// Attempted `Complete -> NotDone` change.
#[derive(Debug, thiserror::Error)]
#[error("flashcard status cannot move from {from} back to {to}")]
pub struct StatusRegression {
    pub from: CompletionStatus,
    pub to: CompletionStatus,
}

// ─── Inputs ──────────────────────────────────────────────────

/// Fields supplied when creating a card. Owner, ID and status are assigned
/// by the data-access layer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardDraft {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(custom(function = "validate_tasks"))]
    pub tasks: TaskList,
    #[serde(default)]
    pub color: CardColor,
    pub due_date: NaiveDate,
}

impl FlashcardDraft {
    /// Materialize the stored record for `uid`.
    pub fn into_flashcard(self, id: String, uid: &str, now: &str) -> Flashcard {
        Flashcard {
            id,
            uid: uid.to_string(),
            title: self.title.trim().to_string(),
            tasks: self.tasks,
            color: self.color,
            due_date: self.due_date,
            status: CompletionStatus::NotDone,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardPatch {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_tasks"))]
    pub tasks: Option<TaskList>,
    pub color: Option<CardColor>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<CompletionStatus>,
}

impl FlashcardPatch {
    pub fn complete() -> Self {
        Self {
            status: Some(CompletionStatus::Complete),
            ..Default::default()
        }
    }

    /// Merge into `card`. Nothing is changed if the status would regress.
    pub fn apply_to(self, card: &mut Flashcard, now: &str) -> Result<(), StatusRegression> {
        if let Some(status) = self.status {
            if !card.status.can_transition_to(status) {
                return Err(StatusRegression {
                    from: card.status,
                    to: status,
                });
            }
            card.status = status;
        }
        if let Some(title) = self.title {
            card.title = title.trim().to_string();
        }
        if let Some(tasks) = self.tasks {
            card.tasks = tasks;
        }
        if let Some(color) = self.color {
            card.color = color;
        }
        if let Some(due_date) = self.due_date {
            card.due_date = due_date;
        }
        card.updated_at = now.to_string();
        Ok(())
    }
}
