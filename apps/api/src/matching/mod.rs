// Transcript-to-career matching engine.
// Implements: grade normalization, profile extraction, embedding retrieval, hybrid scoring.
// All embedding calls go through the `embedding` module's provider trait.

pub mod grades;
pub mod handlers;
pub mod hybrid;
pub mod profile;
pub mod recommender;
pub mod retriever;
pub mod similarity;
pub mod subjects;
