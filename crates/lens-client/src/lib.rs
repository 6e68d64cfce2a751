//! # lens-client
//!
//! The analysis client: builds the rubric prompt for one conversation,
//! exchanges it with an OpenAI-compatible chat-completion endpoint, and
//! handles retry, backoff, timeouts, and the shared outbound rate ceiling.

mod client;
mod error;
mod prompt;
mod rate;

pub use client::{Analyze, ChatClient, ClientOptions};
pub use error::ClientError;
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
pub use rate::RateGate;
