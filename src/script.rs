//! The generated script document.

use crate::defaults::{INTERPRETER, SCRIPT_STRICT_MODE};

/// Shell script assembled fragment by fragment.
///
/// The body always opens with the tracing strict-mode directive. Rendering
/// consumes the document so a rendered script cannot be extended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptDocument {
    interpreter: String,
    head_comment: String,
    body: String,
}

impl ScriptDocument {
    /// Starts a `#!/bin/bash` script whose header reads `head_comment`.
    #[must_use]
    pub fn new(head_comment: impl Into<String>) -> Self {
        Self {
            interpreter: String::from(INTERPRETER),
            head_comment: head_comment.into(),
            body: format!("{SCRIPT_STRICT_MODE}\n"),
        }
    }

    /// Appends a fragment to the body.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.body.push_str(fragment);
        self
    }

    /// Returns the body accumulated so far.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the header comment line.
    #[must_use]
    pub fn head_comment(&self) -> &str {
        &self.head_comment
    }

    /// Serialises the interpreter line, header comment and body.
    #[must_use]
    pub fn render(self) -> String {
        let Self {
            interpreter,
            head_comment,
            body,
        } = self;
        format!("{interpreter}\n{head_comment}\n{body}")
    }
}
