//! Hotfix search: filter composition, pattern matching and paged execution
//!
//! Free-text fields are matched case-insensitively as "contains all words in
//! order" patterns; version and module lists are exact set membership. Results
//! are always returned in canonical hotfix-number order.

mod engine;
mod error;
mod filter;
mod pattern;

pub use engine::{
    current_generation, pin_generation, query_all_in, query_count_in, query_page_in, PageRequest, QueryEngine,
    QueryOperation,
};
pub use error::{QueryError, QueryResult};
pub use filter::{compose, HotfixFilter, MembershipFilter, Predicate, TextField};
pub use pattern::{compile, MatchPattern};
