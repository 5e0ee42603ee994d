pub mod settings;
pub mod registry;

pub use settings::*;
pub use registry::*;
