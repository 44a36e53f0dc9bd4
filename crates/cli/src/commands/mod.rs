//! Command handlers for the lawqa CLI.

pub mod articles;
pub mod ask;
pub mod consult;
pub mod ingest;
pub mod sources;

pub use articles::ArticlesCommand;
pub use ask::AskCommand;
pub use consult::ConsultCommand;
pub use ingest::IngestCommand;
pub use sources::SourcesCommand;
