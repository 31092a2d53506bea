use std::path::Path;

use anyhow::{bail, Context, Result};

/// Name of the single interpolation point in a classification prompt.
pub const COMMENTS_VAR: &str = "comments";

/// Classification prompt split around its one `{{comments}}` marker.
///
/// `\{{` in the file produces a literal `{{`. Any other `{{name}}` is rejected
/// at load time so a typo never reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    before: String,
    after: String,
}

impl PromptTemplate {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            bail!("Prompt template is empty");
        }

        let mut before = String::with_capacity(text.len());
        let mut after = String::new();
        let mut seen_marker = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if seen_marker { &mut after } else { &mut before };

            if c == '\\' && chars.peek() == Some(&'{') {
                chars.next();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push_str("{{");
                } else {
                    out.push_str("\\{");
                }
                continue;
            }

            if c == '{' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                loop {
                    match chars.next() {
                        Some('}') if chars.peek() == Some(&'}') => {
                            chars.next();
                            break;
                        }
                        Some(ch) => var_name.push(ch),
                        None => bail!("Unclosed template variable: {{{{{}", var_name),
                    }
                }

                let var_name = var_name.trim();
                if var_name != COMMENTS_VAR {
                    bail!("Unknown template variable: {{{{{var_name}}}}}");
                }
                if seen_marker {
                    bail!("Template variable {{{{{COMMENTS_VAR}}}}} appears more than once");
                }
                seen_marker = true;
                continue;
            }

            out.push(c);
        }

        if !seen_marker {
            bail!("Prompt template has no {{{{{COMMENTS_VAR}}}}} marker");
        }

        Ok(Self { before, after })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid prompt template: {}", path.display()))
    }

    /// Prompt with `comments` interpolated as a compact JSON array. Non-ASCII
    /// text is kept as-is rather than `\u`-escaped.
    pub fn render(&self, comments: &[String]) -> String {
        let json = serde_json::Value::from(comments.to_vec()).to_string();
        let mut prompt = String::with_capacity(self.before.len() + json.len() + self.after.len());
        prompt.push_str(&self.before);
        prompt.push_str(&json);
        prompt.push_str(&self.after);
        prompt
    }
}
