//! Prompt substyles and the template builder behind them.
//!
//! A substyle decides how the persona instruction and the user's input are
//! laid out in the final completion prompt. Templates use `{{key}}`
//! placeholders which [`PromptBuilder::build`] fills in a single pass, so a
//! placeholder typed by a user is never expanded.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

const SEPARATOR: &str = "\n\n";

const ALPACA_INSTRUCT_PREAMBLE: &str = "Below is an instruction that describes a task, \
paired with an input that provides further context. \
Write a response that appropriately completes the request.";

const ALPACA_INSTRUCT_PREAMBLE_NO_INPUT: &str = "Below is an instruction that describes a task. \
Write a response that appropriately completes the request.";

const ALPACA_INSTRUCTION: &str = "### Instruction:\n\n{{persona}}";
const ALPACA_INPUT: &str = "### Input:\n\n{{input}}";
const ALPACA_RESPONSE: &str = "### Response:\n";

const VICUNA_BODY: &str = "USER: {{input}}\nASSISTANT:";

// ── Substyle ──────────────────────────────────────────────────────────────────

/// Named prompt-formatting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substyle {
    /// Bare Alpaca sections: instruction, optional input, response cue.
    Alpaca,
    /// Alpaca sections preceded by the stock instruct preamble.
    AlpacaInstruct,
    /// Vicuna `USER:` / `ASSISTANT:` turns with the persona as system text.
    Vicuna,
}

impl Substyle {
    pub fn name(self) -> &'static str {
        match self {
            Substyle::Alpaca => "ALPACA",
            Substyle::AlpacaInstruct => "ALPACA_INSTRUCT",
            Substyle::Vicuna => "VICUNA",
        }
    }
}

impl fmt::Display for Substyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Substyle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ALPACA" => Ok(Substyle::Alpaca),
            "ALPACA_INSTRUCT" => Ok(Substyle::AlpacaInstruct),
            "VICUNA" => Ok(Substyle::Vicuna),
            _ => Err(AppError::Config(format!(
                "unknown prompt substyle '{s}' (expected ALPACA, ALPACA_INSTRUCT or VICUNA)"
            ))),
        }
    }
}

/// Combine `persona` and `input` into the final completion prompt.
pub fn make_prompt(persona: &str, input: &str, substyle: Substyle) -> String {
    let has_input = !input.trim().is_empty();

    let builder = match substyle {
        Substyle::Alpaca => alpaca_sections(PromptBuilder::new(), has_input),
        Substyle::AlpacaInstruct => {
            let preamble = if has_input {
                ALPACA_INSTRUCT_PREAMBLE
            } else {
                ALPACA_INSTRUCT_PREAMBLE_NO_INPUT
            };
            alpaca_sections(PromptBuilder::new().append(preamble), has_input)
        }
        Substyle::Vicuna => PromptBuilder::new().append("{{persona}}").append(VICUNA_BODY),
    };

    builder.var("persona", persona.trim()).var("input", input.trim()).build()
}

fn alpaca_sections(builder: PromptBuilder, has_input: bool) -> PromptBuilder {
    let builder = builder.append(ALPACA_INSTRUCTION);
    let builder = if has_input { builder.append(ALPACA_INPUT) } else { builder };
    builder.append(ALPACA_RESPONSE)
}

// ── PromptBuilder ─────────────────────────────────────────────────────────────

/// Fluent builder that joins template fragments and substitutes variables.
#[derive(Debug, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Leading whitespace is dropped; blank fragments are skipped.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim_start();
        if !trimmed.trim().is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register a single `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join all fragments with blank lines and substitute variables.
    ///
    /// Unknown placeholders are left as they are.
    pub fn build(self) -> String {
        let template = self.parts.join(SEPARATOR);
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match self.vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("{{");
                            out.push_str(key);
                            out.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
