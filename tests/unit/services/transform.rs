use super::*;
use std::time::Instant;

#[cfg(unix)]
#[test]
fn test_run_pipes_stdin_to_stdout() {
    let mut runner = TransformRunner::new();
    let rule = TransformRule::new("txt", "tr", &["a-z", "A-Z"]);
    let out = runner
        .run(&rule, Path::new("/"), b"hello", Duration::from_secs(5))
        .unwrap();
    assert_eq!(out, b"HELLO");
}

#[cfg(unix)]
#[test]
fn test_nonzero_exit_is_error() {
    let mut runner = TransformRunner::new();
    let rule = TransformRule::new("txt", "sh", &["-c", "echo bad >&2; exit 3"]);
    let err = runner
        .run(&rule, Path::new("/"), b"", Duration::from_secs(5))
        .unwrap_err();
    match err {
        TransformError::Failed { status, stderr } => {
            assert_eq!(status, Some(3));
            assert_eq!(stderr.trim(), "bad");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[test]
fn test_timeout_kills_child() {
    let mut runner = TransformRunner::new();
    let rule = TransformRule::new("txt", "sleep", &["5"]);
    let start = Instant::now();
    let err = runner
        .run(&rule, Path::new("/"), b"", Duration::from_millis(100))
        .unwrap_err();
    assert!(matches!(err, TransformError::Timeout(_)));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[test]
fn test_missing_command_is_spawn_error() {
    let mut runner = TransformRunner::new();
    let rule = TransformRule::new("txt", "coledit-no-such-command", &[]);
    let err = runner
        .run(&rule, Path::new("."), b"x", Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, TransformError::Spawn { .. }));
}

#[test]
fn test_apply_without_rule_returns_none() {
    let mut runner = TransformRunner::new();
    let settings = Settings::default();
    assert!(runner
        .apply(&settings, Path::new("/tmp/readme.txt"), b"x")
        .is_none());
}

#[test]
fn test_apply_failure_returns_none() {
    let mut runner = TransformRunner::new();
    let settings = Settings {
        transforms: vec![TransformRule::new("txt", "coledit-no-such-command", &[])],
        ..Settings::default()
    };
    assert!(runner
        .apply(&settings, Path::new("/tmp/readme.txt"), b"x")
        .is_none());
}
