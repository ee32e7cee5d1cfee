//! Content store trait and its in-memory implementation.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use super::models::{
    AnswerOutcome, ContentBundle, ContentMetadata, NewUser, ProgressUpdate, QuizQuestion,
    SearchHit, Section, User, UserProgress,
};
use super::seed;
use crate::error::ContentError;

/// Maximum characters of section content shown in a search hit.
const SNIPPET_CHARS: usize = 120;

/// Storage for course content, quiz questions, users, and progress.
pub trait ContentStore: Send + Sync {
    /// All sections plus course metadata.
    fn content(&self) -> ContentBundle;

    /// Sections ordered by their `order` field.
    fn all_sections(&self) -> Vec<Section>;

    fn section(&self, slug: &str) -> Option<Section>;

    fn quiz_questions(&self) -> Vec<QuizQuestion>;

    /// Grade `option_id` as an answer to question `question_id`.
    fn check_answer(&self, question_id: u32, option_id: &str)
    -> Result<AnswerOutcome, ContentError>;

    /// Case-insensitive substring search over section titles and content.
    fn search(&self, query: &str) -> Vec<SearchHit>;

    fn user(&self, id: u32) -> Option<User>;

    fn user_by_username(&self, username: &str) -> Option<User>;

    fn create_user(&mut self, new_user: NewUser) -> Result<User, ContentError>;

    fn user_progress(&self, user_id: u32) -> Option<UserProgress>;

    /// Merge `update` into the user's progress, creating the record if needed.
    fn update_user_progress(
        &mut self,
        user_id: u32,
        update: ProgressUpdate,
    ) -> Result<UserProgress, ContentError>;
}

/// Process-memory store seeded with the built-in course.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    users: HashMap<u32, User>,
    sections: HashMap<String, Section>,
    quiz_questions: Vec<QuizQuestion>,
    user_progress: HashMap<u32, UserProgress>,
    next_user_id: u32,
    next_progress_id: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store holding the built-in sections and quiz questions.
    pub fn new() -> Self {
        let mut store = Self::empty();
        for section in seed::sections() {
            store.sections.insert(section.slug.clone(), section);
        }
        store.quiz_questions = seed::quiz_questions();
        store
    }

    /// A store with no content at all.
    pub fn empty() -> Self {
        Self {
            users: HashMap::new(),
            sections: HashMap::new(),
            quiz_questions: Vec::new(),
            user_progress: HashMap::new(),
            next_user_id: 1,
            next_progress_id: 1,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl ContentStore for MemoryStore {
    fn content(&self) -> ContentBundle {
        ContentBundle {
            sections: self.all_sections(),
            metadata: ContentMetadata {
                title: seed::COURSE_TITLE.to_string(),
                description: seed::COURSE_DESCRIPTION.to_string(),
                last_updated: Utc::now(),
            },
        }
    }

    fn all_sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = self.sections.values().cloned().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    fn section(&self, slug: &str) -> Option<Section> {
        self.sections.get(slug).cloned()
    }

    fn quiz_questions(&self) -> Vec<QuizQuestion> {
        self.quiz_questions.clone()
    }

    fn check_answer(
        &self,
        question_id: u32,
        option_id: &str,
    ) -> Result<AnswerOutcome, ContentError> {
        let question = self
            .quiz_questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(ContentError::QuestionNotFound { id: question_id })?;
        if !question.options.iter().any(|o| o.id == option_id) {
            return Err(ContentError::UnknownOption {
                question: question_id,
                option: option_id.to_string(),
            });
        }
        Ok(AnswerOutcome {
            question_id,
            selected: option_id.to_string(),
            correct: question.correct_answer == option_id,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
        })
    }

    fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.all_sections()
            .into_iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&needle)
                    || s.content.to_lowercase().contains(&needle)
            })
            .map(|s| SearchHit {
                snippet: snippet(&s.content),
                slug: s.slug,
                title: s.title,
            })
            .collect()
    }

    fn user(&self, id: u32) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    fn create_user(&mut self, new_user: NewUser) -> Result<User, ContentError> {
        if self.user_by_username(&new_user.username).is_some() {
            return Err(ContentError::UsernameTaken {
                username: new_user.username,
            });
        }
        let id = self.next_user_id;
        self.next_user_id += 1;
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
        };
        self.users.insert(id, user.clone());
        debug!(user_id = id, "Created user");
        Ok(user)
    }

    fn user_progress(&self, user_id: u32) -> Option<UserProgress> {
        self.user_progress.get(&user_id).cloned()
    }

    fn update_user_progress(
        &mut self,
        user_id: u32,
        update: ProgressUpdate,
    ) -> Result<UserProgress, ContentError> {
        let progress_value = match update.progress {
            Some(value) if !(0..=100).contains(&value) => {
                return Err(ContentError::InvalidProgress { value });
            }
            Some(value) => Some(value as u8),
            None => None,
        };

        let now = Utc::now();
        let next_id = &mut self.next_progress_id;
        let record = self.user_progress.entry(user_id).or_insert_with(|| {
            let id = *next_id;
            *next_id += 1;
            UserProgress {
                id,
                user_id,
                progress: 0,
                completed_sections: Vec::new(),
                quiz_scores: Default::default(),
                section_progress: Default::default(),
                last_accessed: now,
            }
        });

        if let Some(value) = progress_value {
            record.progress = value;
        }
        if let Some(sections) = update.completed_sections {
            record.completed_sections = sections;
        }
        if let Some(scores) = update.quiz_scores {
            record.quiz_scores = scores;
        }
        if let Some(per_section) = update.section_progress {
            record.section_progress = per_section;
        }
        record.last_accessed = now;

        Ok(record.clone())
    }
}

fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}
