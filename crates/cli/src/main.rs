mod animation_cmd;
mod config;
mod output;
mod timeline_cmd;

use clap::{Parser, Subcommand};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "casetrail", about = "casetrail CLI - witness timelines and scene playback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swim-lane timeline of a case session
    Timeline {
        #[command(subcommand)]
        action: TimelineAction,
    },

    /// Keyframe animation of a scene version
    Animation {
        #[command(subcommand)]
        action: AnimationAction,
    },

    /// Show or set configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TimelineAction {
    /// Render the timeline as text
    Show {
        session: String,
        /// Zoom factor (0.5 - 3)
        #[arg(long)]
        zoom: Option<f64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one event with its witness and contradictions
    Inspect { session: String, event: String },
    /// Set the absolute time of an event
    SetTime {
        session: String,
        event: String,
        /// RFC 3339 or `YYYY-MM-DDTHH:MM[:SS]` (read as UTC)
        time: String,
    },
    /// Show clarity grading and events needing clarification
    Clarified {
        session: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Submit a relative time clarification for an event
    Clarify {
        session: String,
        event: String,
        /// e.g. "about two minutes after the car arrived"
        #[arg(long)]
        offset: String,
        #[arg(long)]
        sequence: Option<i64>,
    },
    /// Show the pending disambiguation question, if any
    Disambiguation { session: String },
}

#[derive(Subcommand)]
enum AnimationAction {
    /// Play an animation in real time and report the final scene
    Play {
        version: String,
        /// Ask the server to generate keyframes first
        #[arg(long)]
        generate: bool,
        /// Playback speed: 0.25, 0.5, 1, 1.5 or 2
        #[arg(long)]
        speed: Option<f64>,
        /// Start position in seconds
        #[arg(long)]
        from: Option<f64>,
    },
    /// List keyframe markers on the progress bar
    Markers { version: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Update server settings
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Timeline { action } => match action {
            TimelineAction::Show {
                session,
                zoom,
                format,
            } => timeline_cmd::run_show(&session, zoom, format).await,
            TimelineAction::Inspect { session, event } => {
                timeline_cmd::run_inspect(&session, &event).await
            }
            TimelineAction::SetTime {
                session,
                event,
                time,
            } => timeline_cmd::run_set_time(&session, &event, &time).await,
            TimelineAction::Clarified { session, format } => {
                timeline_cmd::run_clarified(&session, format).await
            }
            TimelineAction::Clarify {
                session,
                event,
                offset,
                sequence,
            } => timeline_cmd::run_clarify(&session, &event, &offset, sequence).await,
            TimelineAction::Disambiguation { session } => {
                timeline_cmd::run_disambiguation(&session).await
            }
        },
        Commands::Animation { action } => match action {
            AnimationAction::Play {
                version,
                generate,
                speed,
                from,
            } => animation_cmd::run_play(&version, generate, speed, from).await,
            AnimationAction::Markers { version } => animation_cmd::run_markers(&version).await,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => config::show_config(),
            ConfigAction::Set { server, api_key } => config::set_config(server, api_key),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
