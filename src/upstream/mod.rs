pub mod chat;
pub mod moondream;
pub mod wikipedia;

pub use chat::{ChatClient, ChatRequest, ResponseFormat};
pub use moondream::MoondreamClient;
pub use wikipedia::{ArticleText, TermCheck, WikipediaClient};
