use anyhow::{Context, Result, bail};
use casetrail_api_client::ApiClient;
use casetrail_timeline::{ClarificationWorkflow, TextTarget, TimelineView};

use crate::config::{api_client, load_config};
use crate::output::OutputFormat;

fn connect() -> Result<(ApiClient, TimelineView<TextTarget>)> {
    let config = load_config()?;
    let client = api_client(&config)?;
    let view = TimelineView::new(TextTarget::new(), config.timeline);
    Ok((client, view))
}

async fn load_view(session: &str) -> Result<(ApiClient, TimelineView<TextTarget>)> {
    let (client, mut view) = connect()?;
    view.load(&client, session)
        .await
        .with_context(|| format!("Failed to load timeline for session {session}"))?;
    Ok((client, view))
}

fn print_view(view: &TimelineView<TextTarget>) {
    println!("{}", view.target().render());
    if let Some(layout) = view.layout() {
        if layout.untimed > 0 || layout.clipped > 0 {
            println!(
                "\n{} event(s) without a usable time, {} outside the time range",
                layout.untimed, layout.clipped
            );
        }
    }
}

pub async fn run_show(session: &str, zoom: Option<f64>, format: OutputFormat) -> Result<()> {
    let (_, mut view) = load_view(session).await?;
    match format {
        OutputFormat::Json => {
            let dataset = view.dataset().context("Timeline is not loaded")?;
            println!("{}", serde_json::to_string_pretty(dataset)?);
        }
        OutputFormat::Text => {
            if let Some(zoom) = zoom {
                view.set_zoom(zoom);
            }
            print_view(&view);
        }
    }
    Ok(())
}

pub async fn run_inspect(session: &str, event_id: &str) -> Result<()> {
    let (_, mut view) = load_view(session).await?;
    let Some(detail) = view.inspect(event_id) else {
        bail!("Event {event_id} not found in session {session}");
    };
    print!("{detail}");
    Ok(())
}

pub async fn run_set_time(session: &str, event_id: &str, time: &str) -> Result<()> {
    let (client, mut view) = load_view(session).await?;
    view.submit_event_time(&client, event_id, time)
        .await
        .with_context(|| format!("Failed to update time of event {event_id}"))?;
    println!("Updated {event_id}.");
    if let Some(detail) = view.inspect(event_id) {
        print!("{detail}");
    }
    Ok(())
}

pub async fn run_clarified(session: &str, format: OutputFormat) -> Result<()> {
    let (client, mut view) = load_view(session).await?;
    view.load_clarified(&client, session)
        .await
        .with_context(|| format!("Failed to load clarified timeline for session {session}"))?;
    match format {
        OutputFormat::Json => {
            let clarified = view
                .clarification()
                .timeline()
                .context("Clarified timeline is not loaded")?;
            println!("{}", serde_json::to_string_pretty(clarified)?);
        }
        OutputFormat::Text => print_view(&view),
    }
    Ok(())
}

pub async fn run_clarify(
    session: &str,
    event_id: &str,
    offset: &str,
    sequence: Option<i64>,
) -> Result<()> {
    let (client, mut view) = connect()?;
    view.load_clarified(&client, session)
        .await
        .with_context(|| format!("Failed to load clarified timeline for session {session}"))?;

    let dialog = view
        .open_clarification(event_id)
        .with_context(|| format!("Cannot clarify event {event_id}"))?;
    if let Some(question) = &dialog.suggested_question {
        println!("Q: {question}");
    }
    dialog.set_offset_description(offset);
    if sequence.is_some() {
        dialog.override_sequence(sequence);
    }

    view.submit_clarification(&client)
        .await
        .with_context(|| format!("Failed to clarify event {event_id}"))?;

    println!("Clarified {event_id}.");
    if let Some(summary) = view.clarification().summary() {
        println!("{summary}");
    }
    Ok(())
}

pub async fn run_disambiguation(session: &str) -> Result<()> {
    let (client, _) = connect()?;
    let prompt = ClarificationWorkflow::pending_disambiguation(&client, session)
        .await
        .with_context(|| format!("Failed to fetch disambiguation for session {session}"))?;

    match prompt {
        None => println!("No disambiguation pending."),
        Some(prompt) => {
            println!("{} ({})", prompt.question, prompt.event_id);
            for (i, option) in prompt.options.iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
        }
    }
    Ok(())
}
