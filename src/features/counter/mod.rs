pub mod engine;
pub mod handler;
pub mod models;
pub mod store;

pub use engine::CounterEngine;
pub use models::CounterRecord;
pub use store::CounterStore;
