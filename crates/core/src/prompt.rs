//! System prompt assembly.
//!
//! The prompt is the instruction template, one newline, then one grounding
//! line per catalog product in snapshot order. It is built once at startup
//! and shared read-only by every chat turn.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::domain::product::ProductRecord;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("could not read instruction file `{path}`: {source}")]
    ReadInstructions { path: PathBuf, source: std::io::Error },
}

/// Where the static instruction template comes from.
pub trait InstructionSource: Send + Sync {
    fn read_instructions(&self) -> Result<String, PromptError>;
}

/// UTF-8 instruction file on disk. CRLF line endings are normalized to LF.
#[derive(Clone, Debug)]
pub struct FileInstructions {
    path: PathBuf,
}

impl FileInstructions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InstructionSource for FileInstructions {
    fn read_instructions(&self) -> Result<String, PromptError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| PromptError::ReadInstructions { path: self.path.clone(), source })?;
        Ok(raw.replace("\r\n", "\n"))
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticInstructions(pub String);

impl InstructionSource for StaticInstructions {
    fn read_instructions(&self) -> Result<String, PromptError> {
        Ok(self.0.clone())
    }
}

/// Immutable compiled system prompt. Cloning shares the underlying text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemPrompt(Arc<str>);

impl SystemPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SystemPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SystemPrompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Joins the grounding lines of `products` with newlines.
pub fn render_catalog(products: &[ProductRecord]) -> String {
    products.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

pub fn render(template: &str, products: &[ProductRecord]) -> SystemPrompt {
    let catalog = render_catalog(products);
    let mut prompt = String::with_capacity(template.len() + 1 + catalog.len());
    prompt.push_str(template);
    prompt.push('\n');
    prompt.push_str(&catalog);
    SystemPrompt(prompt.into())
}

/// Reads the template and renders the prompt. An unreadable template is a
/// startup configuration error.
pub fn compile(
    instructions: &dyn InstructionSource,
    products: &[ProductRecord],
) -> Result<SystemPrompt, PromptError> {
    let template = instructions.read_instructions()?;
    Ok(render(&template, products))
}
