//! Game-notation transcript rendering.
//!
//! Builds a PGN document from header key/value metadata and a SAN move log.
//! Transcripts are regenerated from the move log on demand rather than
//! incrementally patched, so the output is always internally consistent.

/// A PGN transcript under construction.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    headers: Vec<(String, String)>,
}

impl Transcript {
    /// Start an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header tag pair. Tags render in insertion order.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Render the full transcript: tag section, blank line, movetext and the
    /// result token (`*` for an unfinished game).
    #[must_use]
    pub fn render(&self, moves: &[String], result_token: &str) -> String {
        let mut out = String::new();
        for (key, value) in &self.headers {
            out.push_str(&format!("[{key} \"{value}\"]\n"));
        }
        if !self.headers.is_empty() {
            out.push('\n');
        }

        let mut tokens: Vec<String> = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);
        for (i, san) in moves.iter().enumerate() {
            if i % 2 == 0 {
                tokens.push(format!("{}.", i / 2 + 1));
            }
            tokens.push(san.clone());
        }
        tokens.push(result_token.to_string());

        out.push_str(&tokens.join(" "));
        out.push('\n');
        out
    }
}
