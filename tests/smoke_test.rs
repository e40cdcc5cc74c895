/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

const REFERENCE_TRACE: [&str; 5] = [
    "iter = 0, population count = 5",
    "iter = 1, population count = 4",
    "iter = 2, population count = 3",
    "iter = 3, population count = 2",
    "iter = 4, population count = 0",
];

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--"].iter().copied().chain(args.iter().copied()))
        .output()
        .expect("Failed to execute cargo run")
}

fn iteration_lines(stdout: &str) -> Vec<&str> {
    stdout.lines().filter(|l| l.starts_with("iter = ")).collect()
}

#[test]
fn binary_shows_help() {
    let output = run_binary(&["--help"]);

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("parlife"),
        "Help output should mention parlife"
    );
}

#[test]
fn binary_shows_version() {
    let output = run_binary(&["--version"]);

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn invalid_flag_fails_gracefully() {
    let output = run_binary(&["--nonexistent-flag"]);

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid flag should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    // Should show helpful error, not a panic backtrace
    assert!(
        !stderr.contains("panicked at"),
        "Invalid flag should not cause panic"
    );
}

#[test]
fn test_world_follows_the_reference_trace() {
    let output = run_binary(&["--no-output"]);

    assert!(
        output.status.success(),
        "Test world run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Test on a small 4x6 world"));
    assert!(stdout.contains("Initial world, population count: 8, using 4 workers"));
    assert_eq!(iteration_lines(&stdout), REFERENCE_TRACE);
}

#[test]
fn halo_model_produces_the_same_trace() {
    let output = run_binary(&["--no-output", "-m", "halo", "-w", "3"]);

    assert!(
        output.status.success(),
        "Halo run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Initial world, population count: 8, using 3 workers"));
    assert_eq!(iteration_lines(&stdout), REFERENCE_TRACE);
}

#[test]
fn unknown_model_warns_and_still_runs() {
    let output = run_binary(&["--no-output", "-m", "quantum"]);

    assert!(
        output.status.success(),
        "Fallback run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown model: quantum"));
    assert_eq!(
        iteration_lines(&String::from_utf8_lossy(&output.stdout)),
        REFERENCE_TRACE
    );
}

#[test]
fn final_world_file_uses_the_comparison_layout() {
    let path = std::env::temp_dir().join("parlife_smoke_final.txt");
    let output = run_binary(&["-o", path.to_str().expect("temp path is valid UTF-8")]);

    assert!(
        output.status.success(),
        "Run with output file failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // the test world goes extinct, so every column reads all dead
    let written = std::fs::read(&path).expect("output file should exist");
    std::fs::remove_file(&path).ok();
    assert_eq!(written, b"000000\n000000\n000000\n000000\n");
}
