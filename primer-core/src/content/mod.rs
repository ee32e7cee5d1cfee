//! Course content, quiz questions, learners, and their progress.

mod models;
mod seed;
mod store;

pub use models::{
    AnswerOutcome, ContentBundle, ContentMetadata, NewUser, ProgressUpdate, QuizOption,
    QuizQuestion, SearchHit, Section, User, UserProgress,
};
pub use store::{ContentStore, MemoryStore};
