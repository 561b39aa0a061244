pub mod cascade;
pub mod hierarchy;
pub mod stats;
pub mod store;
