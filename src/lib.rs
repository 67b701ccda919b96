pub mod combine;
pub mod config;
pub mod fetch;
pub mod geo;
pub mod pipeline;
pub mod process;
pub mod store;
