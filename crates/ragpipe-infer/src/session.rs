//! Explicit conversation state. A `Session` is owned by the caller and
//! passed by reference into each inference call; there is no global chat
//! state anywhere in the pipeline.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub query: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_turn(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn { query: query.into(), answer: answer.into() });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Render prior turns for inclusion ahead of the assembled prompt.
    /// Returns `None` for an empty session.
    pub fn render(&self) -> Option<String> {
        if self.turns.is_empty() {
            return None;
        }
        let mut out = String::from("Previous conversation:\n");
        for turn in &self.turns {
            out.push_str(&format!("User: {}\nAssistant: {}\n", turn.query, turn.answer));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_session_renders_nothing() {
        assert!(Session::new().render().is_none());
    }

    #[test]
    fn turns_render_in_order() {
        let mut s = Session::new();
        s.push_turn("first?", "one.");
        s.push_turn("second?", "two.");
        let rendered = s.render().expect("rendered");
        let a = rendered.find("first?").expect("first");
        let b = rendered.find("second?").expect("second");
        assert!(a < b);
        assert_eq!(s.len(), 2);
    }
}
