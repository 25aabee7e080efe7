
use crate::{RagError, Result};

/// Template used when none is configured
pub const DEFAULT_TEMPLATE: &str = "You are a strict Code Analyzer. Use ONLY the provided RULES context.

RULES (Context):
{context}

CODE TO ANALYZE (Question):
{input}

DECISION: Allow or Forbid the use of the '|' operator in the code and justify it based on the rules.";

const CONTEXT_SLOT: &str = "context";
const INPUT_SLOT: &str = "input";

/// Prompt with `{context}` and `{input}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Both slots must appear in `template`
    #[inline]
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();

        for slot in [CONTEXT_SLOT, INPUT_SLOT] {
            if !template.contains(&format!("{{{slot}}}")) {
                return Err(RagError::Config(format!(
                    "Prompt template is missing the {{{slot}}} slot"
                )));
            }
        }

        Ok(Self { template })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill the slots in one pass. Braces inside `context` or `input` are
    /// copied verbatim, and unknown `{...}` groups in the template are kept.
    #[inline]
    pub fn render(&self, context: &str, input: &str) -> String {
        let mut rendered = String::with_capacity(self.template.len() + context.len() + input.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after_open = &rest[open + 1..];

            let value = after_open.find('}').and_then(|close| {
                match &after_open[..close] {
                    CONTEXT_SLOT => Some((context, close)),
                    INPUT_SLOT => Some((input, close)),
                    _ => None,
                }
            });

            match value {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &after_open[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after_open;
                }
            }
        }

        rendered.push_str(rest);
        rendered
    }
}
