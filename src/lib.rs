// src/lib.rs
pub mod candidate_generation;
pub mod explanation;
pub mod matching;
pub mod models;
pub mod utils;
