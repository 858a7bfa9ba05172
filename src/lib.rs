pub mod binding;
pub mod error;
pub mod history;
pub mod id;
pub mod kernel;
pub mod matching;
pub mod math;
pub mod store;
pub mod update;

pub use binding::FeatureBinding;
pub use error::{Result, ToponymError};
pub use id::ShapeId;
