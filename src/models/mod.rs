pub mod matching;
pub mod profile;
pub mod stats_models;

pub use matching::*;
pub use profile::*;
