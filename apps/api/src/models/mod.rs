pub mod cv;
pub mod rows;
