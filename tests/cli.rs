//! CLI tests: drive `dispatch` with parsed argument lists.

use avm_loader::cli::{dispatch, Cli};
use clap::Parser;
use std::fs;

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("avm-loader").chain(args.iter().copied()))?;
    tokio_test::block_on(dispatch(cli))
}

#[test]
fn assemble_inspect_and_run() {
    let dir = tempfile::tempdir().unwrap();
    let listing = dir.path().join("prog.toml");
    let image = dir.path().join("prog.bin");
    fs::write(&listing, "code = [{ push = 2 }, { push = 5 }, \"mul\", \"log\", \"halt\"]\n").unwrap();
    let image_s = image.to_str().unwrap();

    let out = run(&["assemble", listing.to_str().unwrap(), image_s]).unwrap();
    assert!(out.starts_with("wrote 5 instructions"));
    assert!(!out.contains("warning"));

    let out = run(&["inspect", image_s, "--vm", "CPP"]).unwrap();
    assert!(out.contains("backend: cpp"));
    assert!(out.contains("status: extensive"));

    let out = run(&["run", image_s, "--vm", "test", "--json"]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["logs"][0], 10);
    assert_eq!(json["num_steps"], 5);
}

#[test]
fn config_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let listing = dir.path().join("prog.toml");
    let image = dir.path().join("prog.bin");
    let config = dir.path().join("loader.toml");
    fs::write(&listing, "code = [\"nop\", \"nop\", \"nop\", \"halt\"]\n").unwrap();
    fs::write(&config, "[machine]\nvm_type = \"Go\"\nmax_steps = 2\n").unwrap();
    run(&["assemble", listing.to_str().unwrap(), image.to_str().unwrap()]).unwrap();

    let out = run(&["--config", config.to_str().unwrap(), "run", image.to_str().unwrap()]).unwrap();
    assert!(out.contains("status: extensive"));
    assert!(out.contains("steps: 2"));
}

#[test]
fn unknown_vm_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&["inspect", dir.path().join("x.bin").to_str().unwrap(), "--vm", "wasm"]).unwrap_err();
    assert!(err.to_string().contains("wasm"));
}

#[test]
fn assemble_reports_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let listing = dir.path().join("prog.toml");
    fs::write(&listing, "code = [{ push = 1 }, \"log\"]\n").unwrap();
    let out = run(&["assemble", listing.to_str().unwrap(), dir.path().join("p.bin").to_str().unwrap()]).unwrap();
    assert!(out.contains("warning: program has no halt instruction"));
}
