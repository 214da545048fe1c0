//! Tail-trimming token-budget truncator (spec §4.2).
//!
//! Direct translation of `original_source/backend/utils/truncation.py`'s
//! `truncate_messages`: only the final message is ever shortened, and only
//! by exactly the excess over the budget.

use crate::tokenizer::Tokenizer;
use crate::types::chat::Message;

/// Truncates `messages` so their total encoded length is at most
/// `max_length`, by trimming the tail of the final message's content.
/// Leading messages are returned untouched.
pub fn truncate(tokenizer: &Tokenizer, messages: Vec<Message>, max_length: usize) -> Vec<Message> {
    let total: usize = messages
        .iter()
        .map(|m| tokenizer.encode(&m.content).len())
        .sum();

    if total <= max_length || messages.is_empty() {
        return messages;
    }

    let excess = total - max_length;
    let mut messages = messages;
    let last = messages.last_mut().expect("checked non-empty above");
    let last_tokens = tokenizer.encode(&last.content);

    last.content = if excess >= last_tokens.len() {
        String::new()
    } else {
        let keep = last_tokens.len() - excess;
        tokenizer.decode(&last_tokens[..keep])
    };

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chat::Role;

    fn msg(role: Role, content: &str) -> Message {
        Message {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn leaves_short_input_untouched() {
        let tok = Tokenizer::load();
        let messages = vec![msg(Role::User, "hello")];
        let out = truncate(&tok, messages.clone(), MAX_INPUT_LENGTH_FOR_TEST);
        assert_eq!(out, messages);
    }

    #[test]
    fn truncates_only_the_last_message() {
        let tok = Tokenizer::load();
        let long = "word ".repeat(2000);
        let messages = vec![
            msg(Role::System, "system prompt"),
            msg(Role::User, &long),
        ];
        let out = truncate(&tok, messages.clone(), 50);
        assert_eq!(out[0].content, messages[0].content);
        assert!(tok.encode(&out[1].content).len() <= tok.encode(&out[0].content).len() + 50);
        let total: usize = out.iter().map(|m| tok.encode(&m.content).len()).sum();
        assert!(total <= 50);
    }

    #[test]
    fn empty_excess_collapses_last_message() {
        let tok = Tokenizer::load();
        let messages = vec![msg(Role::User, "just one short message")];
        let out = truncate(&tok, messages, 1);
        let total: usize = out.iter().map(|m| tok.encode(&m.content).len()).sum();
        assert!(total <= 1);
    }

    #[test]
    fn idempotent() {
        let tok = Tokenizer::load();
        let long = "token ".repeat(3000);
        let messages = vec![msg(Role::User, &long)];
        let once = truncate(&tok, messages, MAX_INPUT_LENGTH_FOR_TEST);
        let twice = truncate(&tok, once.clone(), MAX_INPUT_LENGTH_FOR_TEST);
        assert_eq!(once, twice);
    }

    const MAX_INPUT_LENGTH_FOR_TEST: usize = 4096;
}
