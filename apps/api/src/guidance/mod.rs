// Rule-based career guidance derived from the saved CV and tracked applications.

pub mod career_path;
pub mod handlers;
pub mod next_action;
