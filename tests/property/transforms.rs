use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;

use assetflow::fs::mock::MockFileSystem;
use assetflow::pipeline::{BuildContext, FilePipeline, SourceSet, TaskPipeline};
use assetflow::transform::json::minify_json;
use assetflow::watch::Dispatcher;

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "\\PC{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            proptest::collection::btree_map("[a-z ]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn json_minify_preserves_structure(value in json_value()) {
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        let minified = minify_json(&pretty).unwrap();

        let reparsed: Value = serde_json::from_str(&minified).unwrap();
        prop_assert_eq!(reparsed, value);
        prop_assert!(minified.len() <= pretty.len());
    }

    #[test]
    fn json_minify_is_idempotent(value in json_value()) {
        let once = minify_json(&serde_json::to_string_pretty(&value).unwrap()).unwrap();
        let twice = minify_json(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn copy_pipeline_is_byte_identical(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let fs = MockFileSystem::new();
        fs.add_file("source/notes/a.txt", bytes.clone());
        let ctx = BuildContext::new(Arc::new(fs.clone()), "source", "docs");
        let copy = FilePipeline::new("copy", SourceSet::new(["**/*.txt"]).unwrap());

        let report = copy.run(&ctx).unwrap();

        prop_assert!(report.is_success());
        prop_assert_eq!(fs.contents("docs/notes/a.txt"), Some(bytes));
    }

    #[test]
    fn json_rule_fires_once_per_distinct_path(
        stems in proptest::collection::vec("[a-z]{1,4}(/[a-z]{1,4}){0,2}", 1..8),
        repeats in 1..4usize,
    ) {
        let mut dispatcher = Dispatcher::new();
        dispatcher.watch("**/*.json", "json").unwrap();

        let mut paths = Vec::new();
        for _ in 0..repeats {
            for stem in &stems {
                paths.push(format!("{stem}.json"));
                paths.push(format!("{stem}.css"));
            }
        }

        let triggers = dispatcher.triggers_for(&paths);
        let mut distinct: Vec<String> = stems.iter().map(|s| format!("{s}.json")).collect();
        distinct.sort();
        distinct.dedup();

        prop_assert_eq!(triggers.len(), distinct.len());
        prop_assert!(triggers.iter().all(|t| t.task == "json" && t.path.ends_with(".json")));
    }
}
