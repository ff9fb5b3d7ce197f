pub mod jobs;
pub mod labels;
