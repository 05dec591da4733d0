pub mod index;
pub mod search;
pub mod tokenizer;

pub use index::{IndexStats, InvertedIndex, PageEntry};
pub use search::{search, SearchResult};

pub type PageNumber = u32;
