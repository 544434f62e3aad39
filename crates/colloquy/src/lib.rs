pub mod accumulator;
pub mod agents;
pub mod errors;
pub mod models;
pub mod mux;
pub mod prompt_template;
pub mod providers;
pub mod stage;
pub mod wire;
