mod contrast;
mod indexer;
mod merge;
mod pairing;
mod rotation;
mod run;
mod split;
mod tools;
mod workspace;

pub use run::run;
pub use tools::ToolError;
pub use workspace::manifest_path;
