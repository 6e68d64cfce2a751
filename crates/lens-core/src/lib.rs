//! # lens-core
//!
//! Core domain types for convolens: conversation records loaded from a chat
//! export archive, and the per-conversation / per-run outcome types the
//! analysis pipeline aggregates.

pub mod conversation;
pub mod outcome;

pub use conversation::{ConversationRecord, Message, Role};
pub use outcome::{
    AnalysisResult, AnalysisStatus, FailedItem, FailureReason, RunSummary, SkipReason,
};
