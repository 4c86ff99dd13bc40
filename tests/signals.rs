#![cfg(unix)]

use std::{
    fs,
    path::Path,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use serde_json::Value;

fn read_lines(path: &Path) -> Vec<Value> {
    let text = fs::read_to_string(path).unwrap();
    assert!(text.is_empty() || text.ends_with('\n'), "partial last line");
    text.lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn send(signal: &str, pid: u32) {
    // the second signal may land after the process is gone
    let _ = Command::new("kill")
        .arg(signal)
        .arg(pid.to_string())
        .status();
}

#[test]
fn term_then_int_flushes_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.log");
    let mut child = Command::new(env!("CARGO_BIN_EXE_synthlog"))
        .env("LOG_FILE", &path)
        .env("LOG_INTERVAL_SECS", "1")
        .env("SERVICE_NAME", "svc-a")
        .env_remove("LOG_ROTATE_SIZE")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(2500));
    send("-TERM", child.id());
    send("-INT", child.id());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("generator did not exit after SIGTERM");
        }
        thread::sleep(Duration::from_millis(20));
    };
    assert_eq!(status.code(), Some(0));

    let lines = read_lines(&path);
    assert!(lines.len() >= 2, "only {} lines", lines.len());
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["iteration"], i as u64);
        assert_eq!(line["service"], "svc-a");
    }

    // nothing is appended once the process is gone
    thread::sleep(Duration::from_millis(1200));
    assert_eq!(read_lines(&path).len(), lines.len());
}
