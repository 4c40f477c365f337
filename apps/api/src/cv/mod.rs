// CV scoring, normalization, persistence and review.
// Scoring is pure and synchronous; only the store and the optional AI reviewer do I/O.

pub mod handlers;
pub mod normalize;
pub mod placeholder;
pub mod prompts;
pub mod review;
pub mod scoring;
pub mod store;
