/// SQL query functions for store operations
///
/// Search terms are always bound as parameters and matched with `instr`,
/// which is case-sensitive and treats `%` and `_` literally.

use crate::core::searcher::rerank;
use crate::db::models::*;
use crate::db::Store;
use crate::error::{RememberError, Result};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

impl Store {
    /// Record one observation of a command
    ///
    /// Inserts the command with a count of one or bumps the existing row.
    /// With a directory context the directory and the command/directory
    /// pairing are upserted too. Everything happens in one transaction.
    ///
    /// # Arguments
    /// * `input` - Curated command, observation time and optional directory
    ///
    /// # Returns
    /// * `Ok(i64)` - The command ID
    /// * `Err(RememberError)` - If the command is empty or the write fails
    pub async fn add_command(&self, input: CommandInput) -> Result<i64> {
        let mut tx = self.pool().begin().await?;
        let command_id = record_observation(&mut *tx, &input).await?;
        tx.commit().await?;

        Ok(command_id)
    }

    /// Delete a command by its curated text
    ///
    /// Directory associations go with it. Returns whether a row was removed.
    pub async fn delete_command(&self, full_command: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM commands WHERE full_command = ?")
            .bind(full_command)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether a command is in the store
    pub async fn has_command(&self, full_command: &str) -> Result<bool> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM commands WHERE full_command = ?")
            .bind(full_command)
            .fetch_optional(self.pool())
            .await?;

        Ok(id.is_some())
    }

    /// Get a single command by its curated text
    pub async fn get_command(&self, full_command: &str) -> Result<Option<Command>> {
        let command = sqlx::query_as::<_, Command>(
            "SELECT full_command, count_seen, last_used, command_info FROM commands WHERE full_command = ?",
        )
        .bind(full_command)
        .fetch_optional(self.pool())
        .await?;

        Ok(command)
    }

    /// Set the annotation of a command
    ///
    /// Count and last use are left alone. Returns false when no such command exists.
    pub async fn update_command_info(&self, full_command: &str, info: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE commands SET command_info = ? WHERE full_command = ?")
            .bind(info)
            .bind(full_command)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of distinct commands
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commands")
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    /// Search commands
    ///
    /// # Arguments
    /// * `terms` - Any of these may match (OR); no terms returns everything
    /// * `starts_with` - Terms must be a prefix instead of a substring
    /// * `sort_by_relevance` - Order by times seen, then last use
    /// * `search_info` - Also match terms against the annotation
    ///
    /// # Returns
    /// * `Ok(Vec<Command>)` - Results, reranked so commands containing more
    ///   of the terms come first
    pub async fn search<S: AsRef<str>>(
        &self,
        terms: &[S],
        starts_with: bool,
        sort_by_relevance: bool,
        search_info: bool,
    ) -> Result<Vec<Command>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT full_command, count_seen, last_used, command_info FROM commands",
        );

        if !terms.is_empty() {
            let mut columns = vec!["full_command"];
            if search_info {
                columns.push("command_info");
            }
            builder.push(" WHERE ");
            push_term_filter(&mut builder, &columns, terms, starts_with);
        }

        if sort_by_relevance {
            builder.push(" ORDER BY count_seen DESC, last_used DESC");
        } else {
            builder.push(" ORDER BY id");
        }

        let commands = builder
            .build_query_as::<Command>()
            .fetch_all(self.pool())
            .await?;

        Ok(rerank(commands, terms))
    }

    /// Commands ever run in a directory, most recent first
    ///
    /// # Arguments
    /// * `directory` - Exact directory path
    /// * `terms` - Optional substring filter on the command text (OR)
    pub async fn commands_in_directory<S: AsRef<str>>(
        &self,
        directory: &str,
        terms: &[S],
    ) -> Result<Vec<Command>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                commands.full_command,
                commands.count_seen,
                commands.last_used,
                commands.command_info,
                directories.dir_path AS directory_context,
                command_context.num_occurrences
            FROM directories
            INNER JOIN command_context ON directories.id = command_context.context_id
            INNER JOIN commands ON commands.id = command_context.command_id
            WHERE directories.dir_path = "#,
        );
        builder.push_bind(directory.to_string());

        if !terms.is_empty() {
            builder.push(" AND ");
            push_term_filter(&mut builder, &["commands.full_command"], terms, false);
        }

        builder.push(" ORDER BY commands.last_used DESC");

        let commands = builder
            .build_query_as::<Command>()
            .fetch_all(self.pool())
            .await?;

        Ok(commands)
    }
}

/// Upsert the command and, with a directory, its directory pairing
async fn record_observation(conn: &mut SqliteConnection, input: &CommandInput) -> Result<i64> {
    if input.full_command.is_empty() {
        return Err(RememberError::EmptyCommand);
    }

    let command_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO commands (full_command, count_seen, last_used, command_info)
        VALUES (?, 1, ?, '')
        ON CONFLICT(full_command) DO UPDATE SET
            count_seen = count_seen + 1,
            last_used = excluded.last_used
        RETURNING id
        "#,
    )
    .bind(&input.full_command)
    .bind(input.last_used)
    .fetch_one(&mut *conn)
    .await?;

    if let Some(directory) = &input.directory_context {
        let directory_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO directories (dir_path) VALUES (?)
            ON CONFLICT(dir_path) DO UPDATE SET dir_path = excluded.dir_path
            RETURNING id
            "#,
        )
        .bind(directory)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO command_context (command_id, context_id, num_occurrences)
            VALUES (?, ?, 1)
            ON CONFLICT(command_id, context_id) DO UPDATE SET
                num_occurrences = num_occurrences + 1
            "#,
        )
        .bind(command_id)
        .bind(directory_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(command_id)
}

/// Append `(pred OR pred ...)` with one predicate per term and column
fn push_term_filter<S: AsRef<str>>(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: &[&str],
    terms: &[S],
    starts_with: bool,
) {
    let comparison = if starts_with { ") = 1" } else { ") > 0" };

    builder.push("(");
    let mut first = true;
    for term in terms {
        let term: &str = term.as_ref();
        for column in columns {
            if !first {
                builder.push(" OR ");
            }
            first = false;
            builder
                .push("instr(")
                .push(*column)
                .push(", ")
                .push_bind(term.to_string())
                .push(comparison);
        }
    }
    builder.push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn add(store: &Store, command: &str, last_used: f64) {
        store
            .add_command(CommandInput::new(command).at(last_used))
            .await
            .unwrap();
    }

    fn texts(commands: &[Command]) -> Vec<&str> {
        commands.iter().map(|c| c.full_command.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_and_retrieve_command() {
        let store = Store::new_test().await.unwrap();

        let id = store.add_command(CommandInput::new("npm test")).await.unwrap();
        assert!(id > 0);

        assert!(store.has_command("npm test").await.unwrap());
        assert!(!store.has_command("npm").await.unwrap());

        let cmd = store.get_command("npm test").await.unwrap().unwrap();
        assert_eq!(cmd.count_seen, 1);
        assert_eq!(cmd.command_info, "");
    }

    #[tokio::test]
    async fn test_command_count_increment() {
        let store = Store::new_test().await.unwrap();

        let id1 = store.add_command(CommandInput::new("ls -la").at(10.0)).await.unwrap();
        let id2 = store.add_command(CommandInput::new("ls -la").at(20.0)).await.unwrap();

        // Same row, updated rather than inserted
        assert_eq!(id1, id2);
        assert_eq!(store.count().await.unwrap(), 1);

        let cmd = store.get_command("ls -la").await.unwrap().unwrap();
        assert_eq!(cmd.count_seen, 2);
        assert_eq!(cmd.last_used, 20.0);
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let store = Store::new_test().await.unwrap();

        let result = store.add_command(CommandInput::new("")).await;
        match result {
            Err(RememberError::EmptyCommand) => {}
            _ => panic!("Expected EmptyCommand error"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_directory_association_counting() {
        let store = Store::new_test().await.unwrap();

        for i in 0..4 {
            store
                .add_command(CommandInput::new("cargo build").at(i as f64).in_directory("/src/app"))
                .await
                .unwrap();
        }

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_commands, 1);
        assert_eq!(stats.total_directories, 1);
        assert_eq!(stats.total_contexts, 1);

        let cmd = store.get_command("cargo build").await.unwrap().unwrap();
        assert_eq!(cmd.count_seen, 4);

        let local = store.commands_in_directory::<&str>("/src/app", &[]).await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].num_occurrences, Some(4));
        assert_eq!(local[0].directory_context.as_deref(), Some("/src/app"));
    }

    #[tokio::test]
    async fn test_occurrences_are_per_directory() {
        let store = Store::new_test().await.unwrap();

        store.add_command(CommandInput::new("make").in_directory("/a")).await.unwrap();
        store.add_command(CommandInput::new("make").in_directory("/b")).await.unwrap();
        store.add_command(CommandInput::new("make").in_directory("/b")).await.unwrap();

        let a = store.commands_in_directory::<&str>("/a", &[]).await.unwrap();
        let b = store.commands_in_directory::<&str>("/b", &[]).await.unwrap();
        assert_eq!(a[0].num_occurrences, Some(1));
        assert_eq!(b[0].num_occurrences, Some(2));
        assert_eq!(b[0].count_seen, 3);
    }

    #[tokio::test]
    async fn test_delete_command_cascades() {
        let store = Store::new_test().await.unwrap();

        store.add_command(CommandInput::new("rm -rf build").in_directory("/proj")).await.unwrap();
        store.add_command(CommandInput::new("make").in_directory("/proj")).await.unwrap();

        assert!(store.delete_command("rm -rf build").await.unwrap());
        assert!(!store.has_command("rm -rf build").await.unwrap());

        let local = store.commands_in_directory::<&str>("/proj", &[]).await.unwrap();
        assert_eq!(texts(&local), vec!["make"]);
        assert_eq!(store.stats().await.unwrap().total_contexts, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_command() {
        let store = Store::new_test().await.unwrap();
        assert!(!store.delete_command("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_command_info() {
        let store = Store::new_test().await.unwrap();
        add(&store, "docker system prune", 5.0).await;

        assert!(store
            .update_command_info("docker system prune", "frees disk space")
            .await
            .unwrap());
        assert!(!store.update_command_info("missing", "info").await.unwrap());

        let cmd = store.get_command("docker system prune").await.unwrap().unwrap();
        assert_eq!(cmd.command_info, "frees disk space");
        assert_eq!(cmd.count_seen, 1);
        assert_eq!(cmd.last_used, 5.0);

        // Re-observing keeps the annotation
        add(&store, "docker system prune", 6.0).await;
        let cmd = store.get_command("docker system prune").await.unwrap().unwrap();
        assert_eq!(cmd.command_info, "frees disk space");
    }

    #[tokio::test]
    async fn test_search_sorted() {
        let store = Store::new_test().await.unwrap();
        add(&store, "some command string", 10.0).await;
        add(&store, "somelater command string", 20.0).await;

        let results = store.search(&["some"], false, true, false).await.unwrap();
        assert_eq!(texts(&results), vec!["somelater command string", "some command string"]);
    }

    #[tokio::test]
    async fn test_search_count_beats_recency() {
        let store = Store::new_test().await.unwrap();
        add(&store, "git pull", 1.0).await;
        add(&store, "git pull", 2.0).await;
        add(&store, "git push", 30.0).await;

        let results = store.search(&["git"], false, true, false).await.unwrap();
        assert_eq!(texts(&results), vec!["git pull", "git push"]);

        // Unsorted keeps insertion order
        let results = store.search(&["git"], false, false, false).await.unwrap();
        assert_eq!(texts(&results), vec!["git pull", "git push"]);
    }

    #[tokio::test]
    async fn test_search_starts_with() {
        let store = Store::new_test().await.unwrap();
        add(&store, "git add .", 1.0).await;
        add(&store, "subl notes.txt", 2.0).await;

        let results = store.search(&["add"], true, true, false).await.unwrap();
        assert!(results.is_empty());

        let results = store.search(&["add"], false, true, false).await.unwrap();
        assert_eq!(texts(&results), vec!["git add ."]);

        let results = store.search(&["subl"], true, true, false).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_sensitive_and_literal() {
        let store = Store::new_test().await.unwrap();
        add(&store, "echo Hello", 1.0).await;
        add(&store, "echo 100%", 2.0).await;

        assert!(store.search(&["hello"], false, true, false).await.unwrap().is_empty());
        assert_eq!(store.search(&["Hello"], false, true, false).await.unwrap().len(), 1);

        // % is not a wildcard
        let results = store.search(&["%"], false, true, false).await.unwrap();
        assert_eq!(texts(&results), vec!["echo 100%"]);
    }

    #[tokio::test]
    async fn test_search_info() {
        let store = Store::new_test().await.unwrap();
        add(&store, "kubectl get pods -A", 1.0).await;
        store
            .update_command_info("kubectl get pods -A", "cluster overview")
            .await
            .unwrap();

        assert!(store.search(&["cluster"], false, true, false).await.unwrap().is_empty());

        let results = store.search(&["cluster"], false, true, true).await.unwrap();
        assert_eq!(texts(&results), vec!["kubectl get pods -A"]);
    }

    #[tokio::test]
    async fn test_search_info_only_matches_rank_with_full_matches() {
        let store = Store::new_test().await.unwrap();
        add(&store, "deploy.sh", 1.0).await;
        add(&store, "git push", 2.0).await;
        add(&store, "git pull origin", 3.0).await;
        store
            .update_command_info("deploy.sh", "git release origin")
            .await
            .unwrap();

        let results = store
            .search(&["git", "origin"], false, false, true)
            .await
            .unwrap();
        assert_eq!(texts(&results), vec!["deploy.sh", "git pull origin", "git push"]);
    }

    #[tokio::test]
    async fn test_search_without_terms_returns_everything() {
        let store = Store::new_test().await.unwrap();
        add(&store, "one", 1.0).await;
        add(&store, "two", 2.0).await;

        let results = store.search::<&str>(&[], false, true, false).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_reranks_by_terms_matched() {
        let store = Store::new_test().await.unwrap();

        // Popularity is the reverse of how many terms each command holds
        for _ in 0..4 {
            add(&store, "one two matches", 1.0).await;
        }
        for _ in 0..3 {
            add(&store, "one match only", 1.0).await;
        }
        for _ in 0..2 {
            add(&store, "two matches one also", 1.0).await;
        }
        add(&store, "one two three", 1.0).await;

        let results = store
            .search(&["one", "two", "three"], false, true, false)
            .await
            .unwrap();

        assert_eq!(
            texts(&results),
            vec![
                "one two three",
                "one two matches",
                "two matches one also",
                "one match only",
            ]
        );
    }

    #[tokio::test]
    async fn test_commands_in_directory_order_and_filter() {
        let store = Store::new_test().await.unwrap();
        for (cmd, at) in [("cargo test", 3.0), ("cargo build", 5.0), ("vim Cargo.toml", 4.0)] {
            store
                .add_command(CommandInput::new(cmd).at(at).in_directory("/work"))
                .await
                .unwrap();
        }
        store
            .add_command(CommandInput::new("cargo fmt").at(9.0).in_directory("/elsewhere"))
            .await
            .unwrap();

        let all = store.commands_in_directory::<&str>("/work", &[]).await.unwrap();
        assert_eq!(texts(&all), vec!["cargo build", "vim Cargo.toml", "cargo test"]);

        let filtered = store
            .commands_in_directory("/work", &["test", "vim"])
            .await
            .unwrap();
        assert_eq!(texts(&filtered), vec!["vim Cargo.toml", "cargo test"]);

        assert!(store
            .commands_in_directory::<&str>("/nowhere", &[])
            .await
            .unwrap()
            .is_empty());
    }
}
