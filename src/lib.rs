pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dates;
pub mod encoding;
pub mod enrich;
pub mod html;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod store;
