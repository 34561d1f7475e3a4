//! Sequence validation and parsing.
//!
//! A sequence is a compact string such as `!b2i2g2r4i4`: one character per
//! command, each optionally followed by a single digit that is appended to
//! the command text. The refund marker may only appear first.

use std::fmt;

use crate::{
    command::{Command, REFUND_KEY},
    domain::UserId,
    errors::Error,
    Result,
};

/// One parsed unit of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub command: Command,
    pub amount: Option<char>,
}

impl Step {
    /// Command text with amount and user id applied (no bot prefix).
    pub fn text(&self, user_id: &UserId) -> String {
        let mut text = self.command.text(user_id);
        if let Some(amount) = self.amount {
            text.push(' ');
            text.push(amount);
        }
        text
    }

    pub fn confirmation(&self) -> &'static str {
        self.command.confirmation()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command.is_refund() {
            return f.write_str("Refunding badges");
        }
        write!(f, "Getting {}", self.command.name())?;
        if let Some(amount) = self.amount {
            write!(f, " {amount}")?;
        }
        Ok(())
    }
}

/// A validated sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    raw: String,
    steps: Vec<Step>,
}

impl Sequence {
    /// Validate and split `raw` into steps in a single left-to-right scan.
    ///
    /// The empty string is accepted; callers reject it before dispatch.
    pub fn parse(raw: &str) -> Result<Self> {
        let chars: Vec<char> = raw.chars().collect();
        let mut steps = Vec::new();

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == REFUND_KEY && i > 0 {
                return Err(invalid(i, "refund marker is only allowed first"));
            }
            let Some(command) = Command::from_key(c) else {
                let reason = if c.is_ascii_digit() {
                    format!("digit '{c}' does not follow a command")
                } else {
                    format!("unknown character '{c}'")
                };
                return Err(invalid(i, reason));
            };

            let mut amount = None;
            if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                amount = Some(chars[i + 1]);
                i += 1;
            }

            steps.push(Step { command, amount });
            i += 1;
        }

        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn starts_with_refund(&self) -> bool {
        self.steps
            .first()
            .is_some_and(|s| s.command.is_refund())
    }

    /// Same sequence without its leading refund step, if any.
    pub fn without_refund(&self) -> Self {
        if !self.starts_with_refund() {
            return self.clone();
        }
        let mut chars = self.raw.chars();
        chars.next();
        let mut steps = self.steps.clone();
        // `!2` consumes two characters.
        if steps.remove(0).amount.is_some() {
            chars.next();
        }
        Self {
            raw: chars.as_str().to_string(),
            steps,
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Pure predicate form of [`Sequence::parse`].
pub fn validate(sequence: &str) -> bool {
    Sequence::parse(sequence).is_ok()
}

fn invalid(position: usize, reason: impl Into<String>) -> Error {
    Error::InvalidSequence {
        position,
        reason: reason.into(),
    }
}
