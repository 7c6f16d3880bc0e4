//! Per-session conversation memory

/// One question and the answer it got
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Ordered question/answer history owned by a single QA session
#[derive(Debug, Default, Clone)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// `Human: ...` / `Assistant: ...` transcript, oldest first
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Human: {}\nAssistant: {}\n", t.question, t.answer.trim()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_order() {
        let mut memory = ConversationMemory::new();
        assert_eq!(memory.render(), "");

        memory.push("First?", "One. ");
        memory.push("Second?", "Two.");
        assert_eq!(
            memory.render(),
            "Human: First?\nAssistant: One.\nHuman: Second?\nAssistant: Two.\n"
        );
        assert_eq!(memory.len(), 2);
    }
}
