pub mod error;
pub mod message;
pub mod openrouter;
pub mod util;

pub use error::AiError;
pub use message::{Message, MessageRole};
pub use openrouter::OpenRouter;
pub use util::{strip_code_blocks, truncate_to_char_boundary};
