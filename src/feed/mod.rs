mod parser;

pub use parser::{Feed, FeedError};
