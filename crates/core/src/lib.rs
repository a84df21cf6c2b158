pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod prompt;

pub use catalog::{load_snapshot, CatalogError, CatalogSnapshot, CatalogSource, StaticCatalog};
pub use domain::chat::{ChatTurn, ChatTurnId, NewChatTurn};
pub use domain::product::{ProductId, ProductRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use prompt::{
    compile, FileInstructions, InstructionSource, PromptError, StaticInstructions, SystemPrompt,
};
