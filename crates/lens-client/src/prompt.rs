//! Rubric prompt construction.
//!
//! The system prompt carries the fixed five-step AI Decision Loop template;
//! the user content is the conversation transcript, truncated when needed.
//!
//! Truncation policy (explicit, since the report quality depends on it):
//! the budget is an estimated token count (chars / 4). When a transcript
//! exceeds it, system/instruction messages are always kept, and the
//! remaining budget is filled with the *newest* user/assistant turns, so
//! oldest messages are dropped first. Kept messages are rendered in their
//! original causal order.

use lens_core::{ConversationRecord, Message, Role};

/// The fixed five-step rubric the endpoint is asked to apply.
pub const SYSTEM_PROMPT: &str = r"You are an expert analyst focused on evaluating how effectively users interact with AI systems. Analyze the USER's behavior in the following conversation. YOU MUST USE THE EXACT SECTION HEADINGS AND FORMAT PROVIDED BELOW:

# 1. Brief Summary
[Provide a concise overview of the USER's objectives and approach]

# 2. Five-Step Decision Loop Analysis

## Step 1: Problem Framing & Initial Prompting
- Effectiveness: [How well did the USER define and communicate their needs?]
- Evidence: [Specific examples of clear/unclear problem framing]
- Impact: [How this affected the conversation flow]

## Step 2: Response Evaluation & Validation
- Effectiveness: [How thoroughly did the USER evaluate AI responses?]
- Evidence: [Examples of verification, questioning, or acceptance]
- Impact: [How this shaped solution quality]

## Step 3: Expertise Application
- Effectiveness: [How well did the USER leverage their domain knowledge?]
- Evidence: [Examples of constraints or guidance provided]
- Impact: [How this improved solution relevance]

## Step 4: Critical Assessment
- Effectiveness: [How well did the USER assess limitations and risks?]
- Evidence: [Examples of testing assumptions or identifying issues]
- Impact: [How this prevented potential problems]

### 4.1 Loop Completion Analysis
- **Did the USER complete all five steps of the AI Decision Loop?**
  - [Yes/No]
- [Which steps were skipped or weak?]

### 4.2 Breakdown Analysis
- [Where did the collaboration break down, if anywhere?]
- [What triggered the breakdown?]

## Step 5: Process Improvement
- Effectiveness: [How did the USER refine and improve their approach?]
- Evidence: [Examples of learning and adaptation]
- Impact: [How this led to better outcomes]

# 3. Collaborative Pattern Analysis

## Observed Patterns
- [List and analyze patterns the USER employed]
- [Evaluate effectiveness of collaboration]
- [Provide specific examples]

## Novel Patterns
- [Identify any unique approaches]
- [Assess their effectiveness]
- [Discuss potential benefits for others]

# 4. Recommendations
- [Specific suggestions for improvement]
- [Actionable steps for better AI collaboration]
- [Strategic adjustments to enhance outcomes]

You must maintain this exact structure and these exact headings in your response. Replace the text in brackets with your analysis while keeping the heading hierarchy and formatting consistent.";

/// Builds the user-content transcript under a token budget.
#[derive(Clone, Copy, Debug)]
pub struct PromptBuilder {
    max_prompt_tokens: usize,
}

impl PromptBuilder {
    #[must_use]
    pub const fn new(max_prompt_tokens: usize) -> Self {
        Self { max_prompt_tokens }
    }

    /// Render the transcript, truncating oldest non-system messages first
    /// to fit the budget.
    #[must_use]
    pub fn build(&self, conv: &ConversationRecord) -> String {
        if conv.estimated_tokens() <= self.max_prompt_tokens {
            return conv.transcript();
        }

        let mut keep = vec![false; conv.messages.len()];
        let mut used = 0usize;
        for (i, msg) in conv.messages.iter().enumerate() {
            if msg.role == Role::System {
                keep[i] = true;
                used += estimate(msg);
            }
        }
        // Newest turns first, until the budget is spent.
        for (i, msg) in conv.messages.iter().enumerate().rev() {
            if keep[i] {
                continue;
            }
            let cost = estimate(msg);
            if used + cost > self.max_prompt_tokens {
                continue;
            }
            keep[i] = true;
            used += cost;
        }

        let mut out = String::new();
        for (i, msg) in conv.messages.iter().enumerate() {
            if keep[i] {
                out.push_str(msg.role.as_str());
                out.push_str(": ");
                out.push_str(&msg.text);
                out.push('\n');
            }
        }
        out
    }
}

fn estimate(msg: &Message) -> usize {
    (msg.text.len() + msg.role.as_str().len() + 3) / 4
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn conv(messages: Vec<(Role, &str)>) -> ConversationRecord {
        ConversationRecord {
            id: "c".to_string(),
            title: None,
            created_at: Utc::now(),
            messages: messages
                .into_iter()
                .map(|(role, text)| Message {
                    role,
                    text: text.to_string(),
                    timestamp: None,
                })
                .collect(),
        }
    }

    #[test]
    fn short_transcript_is_untouched() {
        let c = conv(vec![(Role::User, "hello"), (Role::Assistant, "hi")]);
        let built = PromptBuilder::new(1000).build(&c);
        assert_eq!(built, c.transcript());
    }

    #[test]
    fn oldest_turns_drop_first() {
        let old = "old ".repeat(100);
        let new = "new ".repeat(100);
        let c = conv(vec![(Role::User, &old), (Role::Assistant, &new)]);
        // Budget fits one turn, not two.
        let built = PromptBuilder::new(110).build(&c);
        assert!(built.contains("new"));
        assert!(!built.contains("old"));
    }

    #[test]
    fn system_messages_survive_truncation() {
        let filler = "x".repeat(2000);
        let c = conv(vec![
            (Role::System, "always answer in French"),
            (Role::User, &filler),
            (Role::Assistant, &filler),
            (Role::User, "latest question"),
        ]);
        let built = PromptBuilder::new(100).build(&c);
        assert!(built.contains("always answer in French"));
        assert!(built.contains("latest question"));
        assert!(!built.contains(&filler));
    }

    #[test]
    fn kept_messages_stay_in_causal_order() {
        let filler = "y".repeat(4000);
        let c = conv(vec![
            (Role::User, &filler),
            (Role::User, "first kept"),
            (Role::Assistant, "second kept"),
        ]);
        let built = PromptBuilder::new(50).build(&c);
        let first = built.find("first kept").unwrap();
        let second = built.find("second kept").unwrap();
        assert!(first < second);
    }

    #[test]
    fn rubric_contains_every_required_heading() {
        for heading in [
            "# 1. Brief Summary",
            "# 2. Five-Step Decision Loop Analysis",
            "### 4.1 Loop Completion Analysis",
            "# 3. Collaborative Pattern Analysis",
            "# 4. Recommendations",
        ] {
            assert!(SYSTEM_PROMPT.contains(heading), "missing {heading}");
        }
    }
}
