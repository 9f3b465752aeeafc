//! Chat history turns.

use serde::{Deserialize, Serialize};

/// One question/answer exchange. Chat history is an append-only list of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_shape() {
        let turn = ChatTurn::new("hello", "hi there");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"question": "hello", "answer": "hi there"}));
    }
}
