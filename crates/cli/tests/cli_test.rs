use clap::Parser;
use groupscope_cli::app::App;
use groupscope_cli::commands::Cli;
use groupscope_cli::error::CliError;
use groupscope_core::{AnalysisReport, GroupscopeConfig};
use std::fs;
use std::path::Path;

fn run(args: &[&str]) -> Result<(), CliError> {
    let cli = Cli::try_parse_from(args).expect("arguments should parse");
    App::from_cli(cli)?.run()
}

fn write_default_config(dir: &Path) -> String {
    let path = dir.join("config.toml");
    GroupscopeConfig::default()
        .save(&path)
        .expect("save default config");
    path.to_string_lossy().into_owned()
}

#[test]
fn sample_then_analyze_to_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_default_config(dir.path());
    let chat = dir.path().join("chat.txt");
    let out = dir.path().join("reports").join("report.csv");
    let chat_arg = chat.to_string_lossy().into_owned();
    let out_arg = out.to_string_lossy().into_owned();

    run(&[
        "groupscope", "-c", config.as_str(), "sample", chat_arg.as_str(), "--users", "10", "--messages", "300",
    ])
    .expect("sample should succeed");
    assert_eq!(fs::read_to_string(&chat).expect("read sample").lines().count(), 300);

    run(&[
        "groupscope", "-c", config.as_str(), "analyze", chat_arg.as_str(), "--format", "csv", "--output", out_arg.as_str(),
    ])
    .expect("analyze should succeed");

    let csv = fs::read_to_string(&out).expect("read report");
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("user,cluster_id,cluster_label"));
    assert!(lines.len() >= 6, "expected at least five users, got {}", lines.len() - 1);
}

#[test]
fn json_report_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_default_config(dir.path());
    let chat = dir.path().join("chat.txt");
    let chat_arg = chat.to_string_lossy().into_owned();
    run(&["groupscope", "-c", config.as_str(), "sample", chat_arg.as_str(), "--seed", "3"])
        .expect("sample should succeed");

    let mut outputs = Vec::new();
    for name in ["a.json", "b.json"] {
        let out = dir.path().join(name).to_string_lossy().into_owned();
        run(&[
            "groupscope", "-c", config.as_str(), "analyze", chat_arg.as_str(), "-f", "json", "-o", out.as_str(),
            "--random-state", "11",
        ])
        .expect("analyze should succeed");
        outputs.push(fs::read_to_string(&out).expect("read report"));
    }
    assert_eq!(outputs[0], outputs[1]);

    let report: AnalysisReport = serde_json::from_str(&outputs[0]).expect("valid json");
    assert!(report
        .rows
        .iter()
        .all(|row| (0.0..=1.0).contains(&row.influence_score)));
}

#[test]
fn too_many_clusters_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_default_config(dir.path());
    let chat = dir.path().join("chat.txt");
    fs::write(
        &chat,
        "31/01/2023, 10:00 - Alice: hi\n31/01/2023, 10:05 - Bob: hello\n",
    )
    .expect("write chat");
    let chat_arg = chat.to_string_lossy().into_owned();

    let err = run(&["groupscope", "-c", config.as_str(), "analyze", chat_arg.as_str()])
        .expect_err("five clusters for two users must fail");
    assert!(err.to_string().contains("n_clusters <= 2"));
}

#[test]
fn config_command_writes_loadable_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_default_config(dir.path());
    let out = dir.path().join("copy").join("config.toml");
    let out_arg = out.to_string_lossy().into_owned();

    run(&["groupscope", "-c", config.as_str(), "config", "--output", out_arg.as_str()])
        .expect("config should succeed");
    let loaded = GroupscopeConfig::load(&out).expect("written config loads");
    assert_eq!(loaded, GroupscopeConfig::default());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml").to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["groupscope", "-c", missing.as_str(), "config"])
        .expect("arguments should parse");
    assert!(matches!(App::from_cli(cli), Err(CliError::Config(_))));
}
