// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::{FileSystem, normalize_path};
use assetflow::pipeline::{BuildContext, FilePipeline, SourceSet, TaskPipeline};
use assetflow::transform::MinifyJson;

#[test]
fn mock_fs_creates_parent_directories_implicitly() {
    let fs = MockFileSystem::new();
    fs.add_file("source/b/two.txt", b"2".to_vec());
    fs.add_file("source/a.txt", b"1".to_vec());

    assert!(fs.is_dir(Path::new("source")));
    assert!(fs.is_dir(Path::new("source/b")));
    assert!(fs.is_file(Path::new("source/a.txt")));
    assert!(!fs.exists(Path::new("source/c.txt")));

    assert_eq!(
        fs.read_dir(Path::new("source")).unwrap(),
        vec![PathBuf::from("source/a.txt"), PathBuf::from("source/b")]
    );
    assert_eq!(fs.read_to_string(Path::new("source/b/two.txt")).unwrap(), "2");
    assert!(fs.read(Path::new("source/missing.txt")).is_err());
    assert!(fs.read(Path::new("source/b")).is_err());
}

#[test]
fn mock_fs_records_writes_in_call_order() {
    let fs = MockFileSystem::new();
    fs.write(Path::new("docs/z.txt"), b"z").unwrap();
    fs.write(Path::new("docs/a.txt"), b"a").unwrap();
    fs.write(Path::new("docs/z.txt"), b"zz").unwrap();

    assert_eq!(
        fs.written_paths(),
        vec![
            PathBuf::from("docs/z.txt"),
            PathBuf::from("docs/a.txt"),
            PathBuf::from("docs/z.txt"),
        ]
    );
    assert_eq!(fs.contents("docs/z.txt"), Some(b"zz".to_vec()));
}

#[test]
fn source_set_collects_relative_sorted_matches() {
    let fs = MockFileSystem::new();
    fs.add_file("source/data/b.json", b"{}".to_vec());
    fs.add_file("source/a.json", b"[]".to_vec());
    fs.add_file("source/notes.txt", b"".to_vec());

    let set = SourceSet::new(["**/*.json"]).unwrap();
    let files = set.collect(&fs, Path::new("source")).unwrap();

    assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("data/b.json")]);
    assert!(set.matches("deep/er/c.json"));
    assert!(!set.matches("c.json5"));
}

#[test]
fn file_pipeline_mirrors_source_layout_under_dest() {
    let fs = MockFileSystem::new();
    fs.add_file("source/data/b.json", b"{ \"b\" : 2 }".to_vec());
    fs.add_file("source/a.json", b"[ 1 ]".to_vec());
    let ctx = BuildContext::new(Arc::new(fs.clone()), "source", "docs");

    let pipeline = FilePipeline::new("json", SourceSet::new(["**/*.json"]).unwrap()).stage(MinifyJson);
    let report = pipeline.run(&ctx).unwrap();

    assert!(report.is_success());
    assert_eq!(report.matched, 2);
    assert_eq!(
        fs.written_paths(),
        vec![PathBuf::from("docs/a.json"), PathBuf::from("docs/data/b.json")]
    );
    assert_eq!(fs.contents("docs/data/b.json"), Some(br#"{"b":2}"#.to_vec()));
    assert!(pipeline.describe().contains("json-minify"));
}

#[test]
fn normalize_path_collapses_dots_and_rejects_escapes() {
    assert_eq!(
        normalize_path(Path::new("assets/css/../js/./app.js")),
        Some(PathBuf::from("assets/js/app.js"))
    );
    assert_eq!(normalize_path(Path::new("../secret")), None);
}
