pub mod presenter;
pub mod schema;
pub mod types;

pub use presenter::{error_response, execute, present};
pub use schema::{create_schema, GraphQLSchema, Mutation, Query};
