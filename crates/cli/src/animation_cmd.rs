use std::time::Duration;

use anyhow::{Context, Result};
use casetrail_api_client::ApiClient;
use casetrail_playback::{
    FrameLoopExit, PlaybackEvent, PlaybackScheduler, SceneState, run_frame_loop,
};
use tokio::sync::watch;

use crate::config::{api_client, load_config};

async fn load_scheduler(
    client: &ApiClient,
    scheduler: &mut PlaybackScheduler<SceneState>,
    version: &str,
    generate: bool,
) -> Result<()> {
    let result = if generate {
        scheduler.generate_animation(client, version).await
    } else {
        scheduler.load_animation(client, version).await
    };
    result.with_context(|| format!("Failed to load animation for scene version {version}"))
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::Played => "▶ playing".to_string(),
        PlaybackEvent::Paused => "⏸ paused".to_string(),
        PlaybackEvent::Seeked(t) => format!("⇥ seek to {t:.1}s"),
        PlaybackEvent::Completed => "■ complete".to_string(),
        PlaybackEvent::SpeedChanged(speed) => format!("speed {speed}"),
    }
}

pub async fn run_play(
    version: &str,
    generate: bool,
    speed: Option<f64>,
    from: Option<f64>,
) -> Result<()> {
    let config = load_config()?;
    let client = api_client(&config)?;
    let mut scheduler = PlaybackScheduler::with_settings(SceneState::new(), &config.playback);

    if let Some(speed) = speed {
        scheduler.set_speed_factor(speed)?;
    }
    load_scheduler(&client, &mut scheduler, version, generate).await?;
    eprintln!("{}", scheduler.status());

    scheduler.subscribe(|event| eprintln!("{}", describe(event)));
    if let Some(t) = from {
        scheduler.seek(t);
    }
    scheduler.play();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let interval = Duration::from_millis(config.playback.frame_interval_ms);
    let exit = run_frame_loop(&mut scheduler, interval, shutdown_rx).await;
    if exit == FrameLoopExit::Shutdown {
        scheduler.pause();
    }

    println!(
        "Stopped at {:.1}s of {:.1}s ({}).",
        scheduler.current_time(),
        scheduler.total_duration(),
        scheduler.state()
    );
    if let Some(frame) = scheduler.current_frame() {
        let visible: Vec<&str> = frame.visible().collect();
        println!(
            "Visible: {}",
            if visible.is_empty() {
                "(none)".to_string()
            } else {
                visible.join(", ")
            }
        );
    }
    Ok(())
}

pub async fn run_markers(version: &str) -> Result<()> {
    let config = load_config()?;
    let client = api_client(&config)?;
    let mut scheduler = PlaybackScheduler::new(SceneState::new());
    load_scheduler(&client, &mut scheduler, version, false).await?;

    println!("{}", scheduler.status());
    for marker in scheduler.keyframe_markers() {
        let tooltip = scheduler.marker_tooltip(marker.index).unwrap_or_default();
        println!("  {:>5.1}%  {tooltip}", marker.position * 100.0);
    }
    Ok(())
}
