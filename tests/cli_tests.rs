use std::process::Command;

fn run_headless(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_traffic_core"))
        .args(args)
        .env("RUST_LOG", "warn,traffic_core=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_headless(&["--ticks", "30", "--vehicles", "5", "--no-map"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that run summaries are logged
#[test]
fn test_simulation_summary_logged() {
    let output = run_headless(&["--ticks", "10", "--vehicles", "3", "--grid", "3", "--no-map"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Traffic Simulation Summary"),
        "Missing summary header"
    );
    assert!(
        stderr.contains("Segments: 12, Intersections: 9"),
        "Missing network statistics. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Vehicles: 3"), "Missing vehicle statistics");
}

/// Test that the ASCII map is printed unless disabled
#[test]
fn test_map_output_toggle() {
    let with_map = run_headless(&["--ticks", "5", "--vehicles", "2"]);
    assert!(with_map.status.success());
    assert!(String::from_utf8_lossy(&with_map.stdout).contains("=== World Map ==="));

    let without_map = run_headless(&["--ticks", "5", "--vehicles", "2", "--no-map"]);
    assert!(without_map.status.success());
    assert!(!String::from_utf8_lossy(&without_map.stdout).contains("=== World Map ==="));
}
