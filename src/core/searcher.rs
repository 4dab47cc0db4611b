/// Command searcher with term-count reranking
///
/// The store does the filtering and base ordering. Results are then
/// regrouped so commands containing more of the search terms come first.

use crate::db::{Command, Store};
use crate::error::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Options for one search
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub starts_with: bool,
    pub sort_by_relevance: bool,
    pub search_info: bool,
    pub max_results: Option<usize>,
}

impl SearchQuery {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            starts_with: false,
            sort_by_relevance: true,
            search_info: false,
            max_results: None,
        }
    }
}

/// Handles command searching
pub struct Searcher {
    store: Arc<Store>,
}

impl Searcher {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Run a search and cut the ranked results down to `max_results`
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Command>> {
        let start = Instant::now();

        let results = self
            .store
            .search(
                query.terms.as_slice(),
                query.starts_with,
                query.sort_by_relevance,
                query.search_info,
            )
            .await?;

        debug!(
            terms = ?query.terms,
            found = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(match query.max_results {
            Some(max) => truncate_results(results, max),
            None => results,
        })
    }

    /// Commands run in a directory, optionally filtered by terms
    pub async fn search_directory(&self, directory: &str, terms: &[String]) -> Result<Vec<Command>> {
        self.store.commands_in_directory(directory, terms).await
    }
}

/// Group commands by how many of the terms their text contains, most first
///
/// Order inside a group is kept. A command matching none of the terms in
/// its text (found through its annotation) goes with the all-term matches.
pub fn rerank<S: AsRef<str>>(commands: Vec<Command>, terms: &[S]) -> Vec<Command> {
    if terms.len() < 2 {
        return commands;
    }

    let top = terms.len() - 1;
    let mut buckets: Vec<Vec<Command>> = vec![Vec::new(); terms.len()];
    for command in commands {
        let bucket = match terms_matched(&command.full_command, terms) {
            0 => top,
            matched => matched - 1,
        };
        buckets[bucket].push(command);
    }

    buckets.into_iter().rev().flatten().collect()
}

/// Number of terms found in `text`
pub fn terms_matched<S: AsRef<str>>(text: &str, terms: &[S]) -> usize {
    terms
        .iter()
        .filter(|term| {
            let term: &str = (*term).as_ref();
            text.contains(term)
        })
        .count()
}

/// Keep at most `max` results
pub fn truncate_results(mut results: Vec<Command>, max: usize) -> Vec<Command> {
    if results.len() > max {
        debug!(total = results.len(), max, "truncating results");
        results.truncate(max);
    }
    results
}
