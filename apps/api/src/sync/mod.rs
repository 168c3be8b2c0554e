//! Gmail sync engine: pulls a user's sent mail since the last checkpoint,
//! reconciles each message against CRM entities, records outreach events
//! exactly once, and advances the checkpoint only after a clean run.

pub mod attachments;
pub mod checkpoint;
pub mod engine;
pub mod handlers;
pub mod recipients;
pub mod recorder;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub mod testing;
