pub(crate) mod activations;
pub mod config;
pub(crate) mod dropout;
pub mod error;
pub mod resources;
pub mod weights;

pub use activations::Activation;
pub use config::Config;
pub use weights::load_weights;
