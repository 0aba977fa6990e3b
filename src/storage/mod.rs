mod articles;
mod publishers;
mod schema;
mod types;

pub use schema::Database;
pub use types::{Article, DatabaseError, NewArticle, Publisher};
