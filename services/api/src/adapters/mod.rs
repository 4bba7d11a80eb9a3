pub mod db;
pub mod extract;
pub mod keywords;
pub mod memory;

pub use db::DbAdapter;
pub use extract::DocumentTextExtractor;
pub use keywords::OpenAiKeywordAdapter;
pub use memory::MemoryStore;
