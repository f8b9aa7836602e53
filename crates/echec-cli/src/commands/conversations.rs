use anyhow::{Context, Result, bail};
use echec_application::{ConversationRow, ConversationSession, CycleOutcome};
use echec_core::config::RootConfig;
use echec_infrastructure::InMemoryDocumentStore;
use std::path::Path;
use std::sync::Arc;

pub async fn list(
    config: &RootConfig,
    store_path: &Path,
    user: &str,
    json: bool,
    watch: bool,
) -> Result<()> {
    let store = Arc::new(
        InMemoryDocumentStore::load(store_path)
            .await
            .with_context(|| format!("Failed to load store {}", store_path.display()))?,
    );
    let session = ConversationSession::new(store.clone(), store, config.conversations.clone());

    let outcome = if watch {
        let mut rows = session.watch_rows();
        let drive = session.sign_in(user);
        tokio::pin!(drive);
        loop {
            tokio::select! {
                outcome = &mut drive => break outcome,
                Some(update) = rows.next() => print_rows(&update, json)?,
            }
        }
    } else {
        session.sign_in(user).await
    };

    let outcome = match outcome {
        CycleOutcome::Failed(e) if e.is_retryable() => {
            tracing::warn!("Conversation query failed, retrying once: {}", e);
            session.refresh().await
        }
        outcome => outcome,
    };

    match outcome {
        CycleOutcome::Completed {
            skipped,
            enrichment,
            ..
        } => {
            if skipped > 0 {
                tracing::warn!("{} malformed conversations skipped", skipped);
            }
            tracing::debug!("enrichment: {:?}", enrichment);
        }
        CycleOutcome::Failed(e) => bail!("Conversation query failed: {}", e),
        CycleOutcome::Unauthenticated | CycleOutcome::Stale => {}
    }

    print_rows(&session.rows().await, json)
}

fn print_rows(rows: &[ConversationRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("(no conversations)");
    }
    for row in rows {
        println!("{:<40} {:<16} {}", row.headline(), row.avatar, row.link());
    }
    println!();
    Ok(())
}
