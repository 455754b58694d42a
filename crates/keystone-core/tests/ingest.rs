//! File-level ingestion tests: JSONL exports as written by issue trackers.

use std::io::Write;

use keystone_core::ingest::{IngestError, load_jsonl};
use keystone_core::model::{DependencyKind, Status};
use proptest::prelude::*;

#[test]
fn loads_tracker_export_with_mixed_dependency_kinds() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"{{"id":"bd-1","title":"Schema","status":"closed"}}"#
    )
    .expect("write");
    writeln!(
        file,
        r#"{{"id":"bd-2","title":"API","status":"in_progress","dependencies":[{{"depends_on_id":"bd-1","type":"blocks"}},{{"depends_on_id":"bd-9","type":"related"}}]}}"#
    )
    .expect("write");
    writeln!(
        file,
        r#"{{"id":"bd-3","dependencies":[{{"depends_on_id":"bd-2","type":"parent-child"}}]}}"#
    )
    .expect("write");

    let items = load_jsonl(file.path()).expect("load");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].status, Status::Closed);
    assert_eq!(items[1].status, Status::InProgress);
    assert_eq!(items[1].dependencies[1].kind, DependencyKind::Related);
    assert_eq!(items[1].blocking_dependencies().collect::<Vec<_>>(), ["bd-1"]);
    assert_eq!(items[2].blocking_dependencies().count(), 0);
}

#[test]
fn truncated_record_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, r#"{{"id":"bd-1"}}"#).expect("write");
    writeln!(file, r#"{{"id":"bd-2","dependencies":["#).expect("write");

    let err = load_jsonl(file.path()).expect_err("should fail");
    assert!(matches!(err, IngestError::Parse { line: 2, .. }), "{err}");
}

proptest! {
    #[test]
    fn any_ids_survive_a_jsonl_line(ids in proptest::collection::vec("[a-z]{1,3}-[0-9]{1,4}", 1..20)) {
        let body: String = ids
            .iter()
            .map(|id| format!("{{\"id\":\"{id}\"}}\n"))
            .collect();
        let items = keystone_core::ingest::read_jsonl(body.as_bytes()).expect("parse");
        let parsed: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let expected: Vec<&str> = ids.iter().map(String::as_str).collect();
        prop_assert_eq!(parsed, expected);
    }
}
