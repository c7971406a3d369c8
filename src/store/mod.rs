pub mod query;
pub mod schema;
pub mod sqlite;

pub use query::*;
pub use sqlite::*;
