/// Core functionality modules
///
/// Contains the main business logic: curating history lines, ignore rules,
/// history ingestion, searching and the last-results file.

pub mod curator;
pub mod history;
pub mod ignore_rules;
pub mod last_search;
pub mod searcher;

pub use curator::curate;
pub use history::{start_history_processing, HistoryFileType, HistoryProcessor, IngestReport};
pub use ignore_rules::IgnoreRules;
pub use searcher::{SearchQuery, Searcher};
