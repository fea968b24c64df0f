// tests/integration/cli_config.rs

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;

use assetflow::cli::CliArgs;
use assetflow::resolve_config;

#[test]
fn no_arguments_runs_the_default_task() {
    let args = CliArgs::try_parse_from(["assetflow"]).unwrap();
    assert_eq!(args.tasks, vec!["default".to_string()]);
    assert!(args.config.is_none());
    assert!(!args.list);
    assert!(!args.dry_run);
}

#[test]
fn several_tasks_and_flags_are_parsed() {
    let args = CliArgs::try_parse_from([
        "assetflow", "lint", "css", "-j", "3", "--dest", "out", "--log-level", "debug",
    ])
    .unwrap();
    assert_eq!(args.tasks, vec!["lint".to_string(), "css".to_string()]);
    assert_eq!(args.jobs, Some(3));
    assert_eq!(args.dest, Some(PathBuf::from("out")));
    assert!(args.log_level.is_some());
}

#[test]
fn overrides_replace_file_values() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[paths]\nsource = \"site\"\ndest = \"public\"\n\n[build]\njobs = 2\n").unwrap();
    let config = file.path().to_string_lossy().to_string();

    let args = CliArgs::try_parse_from(["assetflow", "--config", &config, "--dest", "out"]).unwrap();
    let cfg = resolve_config(&args).unwrap();

    assert_eq!(cfg.source_root(), &PathBuf::from("site"));
    assert_eq!(cfg.dest_root(), &PathBuf::from("out"));
    assert_eq!(cfg.build.jobs, 2);
}

#[test]
fn overrides_are_validated_with_the_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[paths]\nsource = \"site\"\n").unwrap();
    let config = file.path().to_string_lossy().to_string();

    let args = CliArgs::try_parse_from(["assetflow", "--config", &config, "--dest", "site"]).unwrap();
    let err = resolve_config(&args).unwrap_err();
    assert!(err.to_string().contains("must differ"), "{err}");

    let args =
        CliArgs::try_parse_from(["assetflow", "--config", &config, "--dest", "site/out"]).unwrap();
    let err = resolve_config(&args).unwrap_err();
    assert!(err.to_string().contains("must not be inside"), "{err}");

    let args = CliArgs::try_parse_from(["assetflow", "--config", &config, "-j", "0"]).unwrap();
    assert!(resolve_config(&args).is_err());
}
