pub mod labels;
pub mod project;
