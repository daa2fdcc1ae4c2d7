use crate::logger::Logger;
use anyhow::{Result, anyhow};
use comfy_table::Table;
use ganster_client::{
    Answer, AnswerCreate, ApiClient, ApiError, ErrorKind, LoginRequest, Question, QuestionCreate,
    QuestionQuery, RegisterRequest, ServerHint, VoteAction,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Password, Text};
use std::time::Duration;

/// Pulls the human part out of a server message.
/// The backend wraps errors as `{"detail": "..."}`; anything else is shown as-is.
pub fn readable(err: &ApiError) -> String {
    let message = err.message();
    match serde_json::from_str::<serde_json::Value>(&message) {
        Ok(json) => json["detail"].as_str().unwrap_or(&message).to_string(),
        Err(_) => message,
    }
}

/// Server-side rejections are expected: print them and carry on.
/// Anything else (network down, broken session store) is a real error.
fn rejected(err: ApiError, action: &str) -> Result<()> {
    match err.kind() {
        ErrorKind::ServerMessage | ErrorKind::Generic => {
            if err.hint() == Some(ServerHint::Authentication) {
                Logger::error(format!(
                    "{} failed: you need to log in. Run {}.",
                    action,
                    Logger::brand_text("ganster login")
                ));
            } else {
                Logger::error(format!("{} failed: {}", action, readable(&err)));
            }
            Ok(())
        }
        ErrorKind::Transport | ErrorKind::Session => Err(err.into()),
    }
}

fn require_login(client: &ApiClient) -> Result<()> {
    if client.is_authenticated() {
        Ok(())
    } else {
        Err(anyhow!("Not logged in. Run 'ganster login' first."))
    }
}

fn spinner(msg: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn author(name: Option<&str>) -> &str {
    name.unwrap_or("unknown")
}

/// Prompts for username/password and logs in.
/// The client stores the token and user before this returns.
pub async fn login(client: &ApiClient) -> Result<()> {
    let username = Text::new("Username:").prompt()?;
    let username = username.trim().to_string();
    let password = Password::new("Password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    Logger::info("Logging in...");

    match client.login(&LoginRequest { username, password }).await {
        Ok(tokens) => {
            Logger::success(format!(
                "Logged in as {}!",
                Logger::highlight(&tokens.user.username)
            ));
            Ok(())
        }
        Err(e) => rejected(e, "Login"),
    }
}

/// Creates an account, then logs straight in with the same credentials.
pub async fn register(client: &ApiClient) -> Result<()> {
    let username = Text::new("Choose username:").prompt()?.trim().to_string();
    let email = Text::new("Email:").prompt()?.trim().to_string();
    let password = Password::new("Choose password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()?;

    Logger::info("Creating account...");

    let request = RegisterRequest {
        username: username.clone(),
        email,
        password: password.clone(),
    };
    let user = match client.register(&request).await {
        Ok(user) => user,
        Err(e) => return rejected(e, "Registration"),
    };
    Logger::success(format!(
        "Account created for {}!",
        Logger::highlight(&user.username)
    ));

    Logger::info("Logging you in...");
    match client.login(&LoginRequest { username, password }).await {
        Ok(_) => {
            Logger::success("Logged in.");
            Ok(())
        }
        Err(e) => rejected(e, "Login"),
    }
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.logout()?;
    Logger::success("Logged out.");
    Ok(())
}

pub fn whoami(client: &ApiClient) -> Result<()> {
    match client.current_user() {
        Some(user) => {
            let mut table = Table::new();
            table.set_header(vec!["Username", "Email", "Role", "Member since", "Active"]);
            table.add_row(vec![
                user.username,
                user.email,
                user.role,
                user.created_at,
                user.is_active.to_string(),
            ]);
            println!("{}", table);
        }
        None if client.is_authenticated() => {
            Logger::warn("A session token is stored but the user record is missing or unreadable.");
        }
        None => Logger::info("Not logged in."),
    }
    Ok(())
}

fn question_table(questions: &[Question]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Tags", "Answers", "Author", "Asked"]);
    for q in questions {
        let answers = if q.accepted_answer.is_some() || q.has_accepted_answer == Some(true) {
            format!("{} ✔", q.answer_count)
        } else {
            q.answer_count.to_string()
        };
        table.add_row(vec![
            q.id.clone(),
            q.title.clone(),
            q.tags.join(", "),
            answers,
            author(q.username.as_deref()).to_string(),
            q.created_at.clone(),
        ]);
    }
    table
}

pub async fn questions(client: &ApiClient, query: QuestionQuery) -> Result<()> {
    match client.get_questions(&query).await {
        Ok(questions) if questions.is_empty() => {
            Logger::info("No questions found.");
            Ok(())
        }
        Ok(questions) => {
            println!("\n{}", question_table(&questions));
            Ok(())
        }
        Err(e) => rejected(e, "Listing questions"),
    }
}

fn print_answer(answer: &Answer) {
    let mut badges = Vec::new();
    if answer.is_accepted {
        badges.push("accepted".to_string());
    }
    if answer.is_ai_assisted() {
        badges.push("AI".to_string());
    }
    let badges = if badges.is_empty() {
        String::new()
    } else {
        format!(" [{}]", badges.join(", "))
    };

    println!(
        "{} {} by {}{}  {}",
        Logger::brand_text(format!("{:+}", answer.votes)),
        Logger::dim(&answer.id),
        Logger::highlight(author(answer.username.as_deref())),
        badges,
        Logger::dim(&answer.created_at),
    );
    println!("{}\n", answer.content);
}

/// Fetches the question and its answers side by side.
pub async fn show(client: &ApiClient, id: &str) -> Result<()> {
    let (question, answers) = tokio::join!(client.get_question(id), client.get_answers(id));

    let question = match question {
        Ok(q) => q,
        Err(e) => return rejected(e, "Loading question"),
    };

    Logger::header(&question.title);
    println!(
        "{} asked {}  {}",
        Logger::highlight(author(question.username.as_deref())),
        Logger::dim(&question.created_at),
        Logger::dim(question.tags.join(", ")),
    );
    println!("\n{}\n", question.description);
    Logger::rule();

    match answers {
        Ok(answers) if answers.is_empty() => Logger::info("No answers yet."),
        Ok(answers) => {
            Logger::header(format!("{} answer(s)", question.answer_count));
            for answer in &answers {
                print_answer(answer);
            }
        }
        Err(e) => return rejected(e, "Loading answers"),
    }
    Ok(())
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub async fn ask(
    client: &ApiClient,
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    require_login(client)?;

    let title = match title {
        Some(t) => t,
        None => Text::new("Title:").prompt()?,
    };
    let description = match description {
        Some(d) => d,
        None => Text::new("Describe your question:").prompt()?,
    };

    let tags = if tags.is_empty() {
        // Offer the server's suggestions as the default answer.
        let suggested = match client.suggest_tags(&title, &description).await {
            Ok(s) => s.suggested_tags.join(", "),
            Err(e) => {
                log::debug!("tag suggestions unavailable: {}", e);
                String::new()
            }
        };
        split_tags(
            &Text::new("Tags (comma separated):")
                .with_default(&suggested)
                .prompt()?,
        )
    } else {
        tags
    };

    let request = QuestionCreate {
        title,
        description,
        tags,
    };
    match client.create_question(&request).await {
        Ok(question) => {
            Logger::success(format!(
                "Posted {} as {}",
                Logger::highlight(&question.title),
                Logger::brand_text(&question.id)
            ));
            if !question.tags.is_empty() {
                Logger::info(format!("Tags: {}", question.tags.join(", ")));
            }
            Ok(())
        }
        Err(e) if e.hint() == Some(ServerHint::Moderation) => {
            Logger::error("Your question was flagged by moderation. Please keep it respectful.");
            Ok(())
        }
        Err(e) => rejected(e, "Posting question"),
    }
}

pub async fn delete(client: &ApiClient, id: &str, yes: bool) -> Result<()> {
    require_login(client)?;
    if !yes
        && !Confirm::new(&format!("Delete question {}?", id))
            .with_default(false)
            .prompt()?
    {
        Logger::info("Cancelled.");
        return Ok(());
    }

    match client.delete_question(id).await {
        Ok(()) => {
            Logger::success(format!("Deleted question {}.", Logger::brand_text(id)));
            Ok(())
        }
        Err(e) => rejected(e, "Deleting question"),
    }
}

/// Reports an answer rejection with copy specific to why it was rejected.
fn answer_rejected(err: ApiError) -> Result<()> {
    match err.hint() {
        Some(ServerHint::Moderation) => {
            Logger::error(
                "Your answer does not meet the community guidelines. Please keep it respectful and on-topic.",
            );
            Ok(())
        }
        Some(ServerHint::Authentication) => {
            Logger::error(format!(
                "Please log in to answer questions. Run {}.",
                Logger::brand_text("ganster login")
            ));
            Ok(())
        }
        _ => rejected(err, "Answering"),
    }
}

pub async fn answer(client: &ApiClient, question_id: &str, content: Option<String>) -> Result<()> {
    let content = match content {
        Some(c) => c,
        None => Text::new("Your answer:").prompt()?,
    };

    match client
        .create_answer(question_id, &AnswerCreate { content })
        .await
    {
        Ok(answer) => {
            Logger::success(format!("Answer posted as {}.", Logger::brand_text(&answer.id)));
            Ok(())
        }
        Err(e) => answer_rejected(e),
    }
}

pub async fn ai_answer(client: &ApiClient, question_id: &str) -> Result<()> {
    let pb = spinner(format!(
        "Generating an AI answer for {}...",
        Logger::highlight(question_id)
    ))?;
    let result = client.generate_ai_answer(question_id).await;
    pb.finish_and_clear();

    match result {
        Ok(answer) => {
            Logger::success("AI answer posted.");
            print_answer(&answer);
            Ok(())
        }
        Err(e) => answer_rejected(e),
    }
}

/// Searches questions and shows the hits in a table.
/// Result rows are whatever the server sends, so every field is optional.
pub async fn search(client: &ApiClient, query: &str) -> Result<()> {
    Logger::info(format!("Searching for {}...", Logger::highlight(query)));

    let response = match client.search_questions(query).await {
        Ok(r) => r,
        Err(e) => return rejected(e, "Search"),
    };

    if response.results.is_empty() {
        Logger::info("No questions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Tags", "Answers", "Score"]);
    for hit in &response.results {
        let tags = hit["tags"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        table.add_row(vec![
            hit["id"].as_str().unwrap_or("?").to_string(),
            hit["title"].as_str().unwrap_or("(untitled)").to_string(),
            tags,
            hit["answer_count"]
                .as_u64()
                .map(|n| n.to_string())
                .unwrap_or_default(),
            hit["score"].as_f64().map(|s| format!("{:.3}", s)).unwrap_or_default(),
        ]);
    }
    println!("\n{}", table);
    if response.ai_powered {
        Logger::info(Logger::dim("Ranked by semantic search."));
    }
    Ok(())
}

pub async fn vote(client: &ApiClient, answer_id: &str, action: VoteAction) -> Result<()> {
    require_login(client)?;
    match client.vote_answer(answer_id, action).await {
        Ok(outcome) => {
            Logger::success(format!(
                "{} Votes now: {}",
                outcome.message,
                Logger::brand_text(outcome.new_vote_count)
            ));
            Ok(())
        }
        Err(e) => rejected(e, "Voting"),
    }
}

pub async fn accept(client: &ApiClient, answer_id: &str) -> Result<()> {
    require_login(client)?;
    match client.accept_answer(answer_id).await {
        Ok(res) => {
            Logger::success(res.message);
            Ok(())
        }
        Err(e) => rejected(e, "Accepting answer"),
    }
}

pub async fn delete_answer(client: &ApiClient, answer_id: &str, yes: bool) -> Result<()> {
    require_login(client)?;
    if !yes
        && !Confirm::new(&format!("Delete answer {}?", answer_id))
            .with_default(false)
            .prompt()?
    {
        Logger::info("Cancelled.");
        return Ok(());
    }

    match client.delete_answer(answer_id).await {
        Ok(()) => {
            Logger::success(format!("Deleted answer {}.", Logger::brand_text(answer_id)));
            Ok(())
        }
        Err(e) => rejected(e, "Deleting answer"),
    }
}

pub async fn notifications(client: &ApiClient, limit: u32, unread_only: bool) -> Result<()> {
    require_login(client)?;
    let (list, stats) = tokio::join!(
        client.get_notifications(limit, unread_only),
        client.notification_stats()
    );

    let list = match list {
        Ok(l) => l,
        Err(e) => return rejected(e, "Loading notifications"),
    };
    if let Ok(stats) = stats {
        Logger::info(format!(
            "{} unread of {}",
            Logger::brand_text(stats.unread_count),
            stats.total_count
        ));
    }
    if list.is_empty() {
        Logger::info("Nothing new.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "", "Type", "From", "Message", "Question"]);
    for n in list {
        table.add_row(vec![
            n.id,
            if n.read { String::new() } else { "●".to_string() },
            n.kind,
            n.from_username,
            n.message,
            n.question_title.unwrap_or_default(),
        ]);
    }
    println!("\n{}", table);
    Ok(())
}

pub async fn mark_read(client: &ApiClient, id: &str) -> Result<()> {
    require_login(client)?;
    match client.mark_notification_read(id).await {
        Ok(res) => {
            Logger::success(res.message);
            Ok(())
        }
        Err(e) => rejected(e, "Marking notification"),
    }
}

pub async fn mark_all_read(client: &ApiClient) -> Result<()> {
    require_login(client)?;
    match client.mark_all_notifications_read().await {
        Ok(res) => {
            Logger::success(res.message);
            Ok(())
        }
        Err(e) => rejected(e, "Marking notifications"),
    }
}
