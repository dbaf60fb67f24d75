//! Prompt actions — the closed set of analysis modes.
//!
//! Each action maps to a fixed (system prompt, temperature) pair.
//! Explanatory actions run cooler than transformation actions so the
//! output stays close to the input code.

use serde::{Deserialize, Serialize};

/// What the caller wants done with a piece of submitted code or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptAction {
    /// Explain what the input does, step by step.
    Explain,
    /// Produce documentation comments / reference docs for the input.
    Document,
    /// Rewrite the input to be simpler while preserving behaviour.
    Simplify,
    /// Rewrite the input for performance while preserving behaviour.
    Optimize,
}

impl PromptAction {
    /// The system prompt sent to the generation collaborator for this action.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Explain => {
                "You are a senior engineer explaining code to a colleague. \
                 Walk through the provided input step by step, describing what \
                 it does and why. Call out non-obvious behaviour and edge cases."
            }
            Self::Document => {
                "You are a technical writer producing reference documentation. \
                 Generate clear documentation for the provided input: purpose, \
                 parameters, return values, and failure modes."
            }
            Self::Simplify => {
                "You are a senior engineer refactoring for clarity. Rewrite the \
                 provided input to be as simple as possible while preserving its \
                 exact behaviour. Explain each simplification briefly."
            }
            Self::Optimize => {
                "You are a performance engineer. Rewrite the provided input for \
                 efficiency while preserving its exact behaviour. State the \
                 expected impact of each change."
            }
        }
    }

    /// The sampling temperature used with this action. Explanatory output
    /// tolerates more variation than behaviour-preserving rewrites.
    pub fn temperature(&self) -> f32 {
        match self {
            Self::Explain | Self::Document => 0.7,
            Self::Simplify | Self::Optimize => 0.3,
        }
    }
}

impl std::fmt::Display for PromptAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Explain => "explain",
            Self::Document => "document",
            Self::Simplify => "simplify",
            Self::Optimize => "optimize",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for PromptAction {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explain" => Ok(Self::Explain),
            "document" => Ok(Self::Document),
            "simplify" => Ok(Self::Simplify),
            "optimize" => Ok(Self::Optimize),
            other => Err(crate::error::Error::Config {
                message: format!("unknown prompt action: {other}"),
            }),
        }
    }
}
