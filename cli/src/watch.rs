use crate::logger::Logger;
use anyhow::Result;
use ganster_client::{ApiClient, Question, QuestionQuery};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Questions from `batch` that haven't been seen yet, oldest first.
/// Marks them as seen.
fn fresh<'a>(seen: &mut HashSet<String>, batch: &'a [Question]) -> Vec<&'a Question> {
    let mut new: Vec<&Question> = batch.iter().filter(|q| seen.insert(q.id.clone())).collect();
    // The server lists newest first.
    new.reverse();
    new
}

fn announce(q: &Question) {
    Logger::info(format!(
        "{} {}  {}  {}",
        Logger::brand_text(&q.id),
        Logger::highlight(&q.title),
        Logger::dim(q.tags.join(", ")),
        Logger::dim(q.username.as_deref().unwrap_or("unknown")),
    ));
}

/// Re-fetches the question list every `every` until Ctrl-C.
///
/// A failed poll is reported and the next tick tries again; a slow poll
/// delays the next one instead of stacking requests.
pub async fn watch(client: &ApiClient, tag: Option<String>, every: Duration) -> Result<()> {
    watch_until(client, tag, every, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Polls until `shutdown` resolves, including while a request is in flight.
async fn watch_until(
    client: &ApiClient,
    tag: Option<String>,
    every: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let query = QuestionQuery {
        tag,
        ..QuestionQuery::default()
    };
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seen = HashSet::new();
    let mut first = true;
    tokio::pin!(shutdown);

    Logger::info(format!(
        "Watching for new questions every {}s. Press Ctrl-C to stop.",
        every.as_secs()
    ));

    loop {
        let polled = tokio::select! {
            polled = async {
                ticker.tick().await;
                client.get_questions(&query).await
            } => polled,
            _ = &mut shutdown => {
                Logger::info("Stopped watching.");
                return Ok(());
            }
        };

        match polled {
            Ok(batch) => {
                let new = fresh(&mut seen, &batch);
                if first {
                    Logger::header(format!("{} recent question(s)", new.len()));
                    first = false;
                } else if !new.is_empty() {
                    Logger::header(format!("{} new question(s)", new.len()));
                }
                for q in new {
                    announce(q);
                }
            }
            Err(e) => Logger::warn(format!("Poll failed: {}", e)),
        }
    }
}
