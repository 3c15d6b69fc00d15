use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;

const ANIMATION_JSON: &str = r##"{
  "total_duration": 1.0,
  "keyframes": [
    {"element_id": "car", "time_offset": 0.0, "duration": 0.2, "action": "appear", "properties": {}},
    {"element_id": "car", "time_offset": 0.3, "duration": 0.5, "action": "move",
     "properties": {"fromX": 0, "fromY": 0, "toX": 120, "toY": 40}},
    {"element_id": "door", "time_offset": 0.5, "duration": 0.2, "action": "highlight",
     "properties": {"color": "#ffcc00"}}
  ]
}"##;

/// Answer a single request with `body`, whatever it asks for.
fn serve_once(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let reply = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    base
}

fn run(home: &Path, server: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_casetrail"))
        .args(args)
        .env("HOME", home)
        .env("CASETRAIL_SERVER_URL", server)
        .env_remove("RUST_LOG")
        .output()
        .expect("run casetrail")
}

#[test]
fn markers_list_positions_and_tooltips() {
    let home = tempfile::tempdir().expect("tempdir");
    let base = serve_once(200, ANIMATION_JSON);

    let output = run(home.path(), &base, &["animation", "markers", "v1"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ready: 3 keyframes, 1.0s"));
    assert!(stdout.contains("   0.0%  appear car at 0.0s for 0.2s"));
    assert!(stdout.contains("  30.0%  move car at 0.3s for 0.5s"));
    assert!(stdout.contains("  50.0%  highlight door at 0.5s for 0.2s"));
}

#[test]
fn play_runs_to_the_end() {
    let home = tempfile::tempdir().expect("tempdir");
    let base = serve_once(200, ANIMATION_JSON);

    let output = run(
        home.path(),
        &base,
        &["animation", "play", "v1", "--speed", "2", "--from", "0.8"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stopped at 1.0s of 1.0s (complete)."));
    assert!(stdout.contains("Visible: car"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("■ complete"));
}

#[test]
fn unsupported_speed_is_rejected() {
    let home = tempfile::tempdir().expect("tempdir");
    let output = run(
        home.path(),
        "http://127.0.0.1:9",
        &["animation", "play", "v1", "--speed", "3"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported playback speed: 3"));
}

#[test]
fn missing_version_is_reported() {
    let home = tempfile::tempdir().expect("tempdir");
    let base = serve_once(404, r#"{"detail":"not found"}"#);
    let output = run(home.path(), &base, &["animation", "markers", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .contains("Failed to load animation for scene version nope")
    );
}
