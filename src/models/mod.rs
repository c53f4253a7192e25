//! Calendar models
//!
//! A model is a directory under the models root holding the split day PDFs,
//! the uploaded sources, `tokens.json` and the generated QR sheet.

pub mod name;
pub mod service;
pub mod staging;
pub mod types;

pub use name::{InvalidModelName, ModelName};
pub use service::{day_numbers, ModelService};
pub use staging::StagedModelDir;
pub use types::*;
