use std::process::{Command, Output};

fn stride(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stride"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("failed to launch the stride binary")
}

#[test]
fn scenario_file_reports_every_body() {
    let output = stride(&["--scenario", "scenarios/detour.toml", "--ticks", "5"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(names, ["counter", "pillar", "waiter", "runner", "crate"]);
}

#[test]
fn render_flag_prints_a_frame() {
    let output = stride(&["--ticks", "1", "--render"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 5);
    assert!(stdout.contains('#'), "solid shapes missing from\n{stdout}");
}

#[test]
fn missing_scenario_file_fails_with_context() {
    let output = stride(&["--scenario", "scenarios/absent.toml"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"), "{stderr}");
}
