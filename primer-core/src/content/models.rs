//! Content, quiz, user, and progress records.
//!
//! JSON field names are camelCase to match the web client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chapter of the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: u32,
    pub title: String,
    pub slug: String,
    pub order: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub title: String,
    pub description: String,
    pub last_updated: DateTime<Utc>,
}

/// Everything `/api/content` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBundle {
    pub sections: Vec<Section>,
    pub metadata: ContentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    pub explanation: String,
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub question_id: u32,
    pub selected: String,
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// A registered learner. The password never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: u32,
    pub user_id: u32,
    /// Overall completion, 0-100.
    pub progress: u8,
    pub completed_sections: Vec<String>,
    pub quiz_scores: BTreeMap<String, u32>,
    pub section_progress: BTreeMap<String, u8>,
    pub last_accessed: DateTime<Utc>,
}

/// Partial update merged into a [`UserProgress`]; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub completed_sections: Option<Vec<String>>,
    #[serde(default)]
    pub quiz_scores: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub section_progress: Option<BTreeMap<String, u8>>,
}

/// A section matching a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub slug: String,
    pub title: String,
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: 1,
            username: "ada".into(),
            email: None,
            password: "hunter2".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("email").is_none());
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn test_progress_update_camel_case() {
        let update: ProgressUpdate = serde_json::from_str(
            r#"{"completedSections": ["introduction"], "quizScores": {"quiz1": 85}}"#,
        )
        .unwrap();
        assert_eq!(update.progress, None);
        assert_eq!(update.completed_sections.unwrap(), vec!["introduction"]);
        assert_eq!(update.quiz_scores.unwrap()["quiz1"], 85);
    }
}
