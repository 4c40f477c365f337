// Document import: extract text from an uploaded CV or cover letter, then
// segment it into pages for the editor.
// Extraction and segmentation are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod archive;
pub mod extract;
pub mod handlers;
pub mod html;
pub mod segmenter;

pub use archive::UploadArchive;
