//! Application services

pub mod curriculum;

pub use curriculum::{CurriculumService, CurriculumView, ToggleOutcome, ViewOptions};
