// Library exports for testing
pub mod api;
pub mod background;
pub mod config;
pub mod db;
pub mod errors;
pub mod graphql;
pub mod metrics;
pub mod models;
pub mod service;

#[cfg(test)]
mod test_util;
