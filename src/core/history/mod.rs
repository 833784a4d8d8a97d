mod tokenizer;
mod tracker;

pub use tokenizer::{CharTokenizer, Tokenizer, WordTokenizer, tokenizer_for};
pub use tracker::{ConversationHistory, HistoryEntry, MessageRole};
