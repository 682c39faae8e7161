//! Domain value type tests: identifiers, tasks, activity and wire events.

use crate::board::domain::{
    ActivityKind, ActorId, BoardDomainError, BoardEvent, Column, ColumnId, ErrorKind, Task,
    TaskId,
};
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

#[rstest]
fn identifiers_are_trimmed() {
    let task_id = TaskId::new("  task-7  ").expect("valid task id");
    assert_eq!(task_id.as_str(), "task-7");
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_identifiers_are_rejected(#[case] raw: &str) {
    let result = ColumnId::new(raw);
    assert_eq!(
        result,
        Err(BoardDomainError::InvalidIdentifier {
            kind: "column",
            value: raw.to_owned(),
        })
    );
    assert_eq!(
        result.as_ref().err().map(BoardDomainError::kind),
        Some(ErrorKind::InvalidArgument)
    );
}

#[rstest]
#[case(None, None)]
#[case(Some(""), None)]
#[case(Some("  \n "), None)]
#[case(Some(" keep me "), Some("keep me"))]
fn task_descriptions_are_normalized(
    timestamp: DateTime<Utc>,
    #[case] description: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let task = Task::new(
        TaskId::new("task-1").expect("valid task id"),
        "  Title ",
        description,
        timestamp,
    );

    assert_eq!(task.title(), "Title");
    assert_eq!(task.description(), expected);
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
#[case("created", ActivityKind::Created)]
#[case(" Moved ", ActivityKind::Moved)]
#[case("DELETED", ActivityKind::Deleted)]
fn activity_kind_parses_case_insensitively(#[case] raw: &str, #[case] expected: ActivityKind) {
    assert_eq!(ActivityKind::try_from(raw).ok(), Some(expected));
}

#[rstest]
fn unknown_activity_kind_is_rejected() {
    assert!(ActivityKind::try_from("archived").is_err());
}

#[rstest]
fn move_task_event_uses_camel_case_payload() {
    let event = BoardEvent::MoveTask {
        task_id: TaskId::new("task-1").expect("valid task id"),
        source_column_id: ColumnId::new("column-1").expect("valid column id"),
        destination_column_id: ColumnId::new("column-2").expect("valid column id"),
        new_index: 3,
    };

    let encoded = serde_json::to_value(&event).expect("event should serialize");

    assert_eq!(
        encoded,
        json!({
            "event": "moveTask",
            "payload": {
                "taskId": "task-1",
                "sourceColumnId": "column-1",
                "destinationColumnId": "column-2",
                "newIndex": 3
            }
        })
    );
}

#[rstest]
fn create_task_event_carries_the_full_task(timestamp: DateTime<Utc>) {
    let event = BoardEvent::CreateTask {
        column_id: ColumnId::new("column-1").expect("valid column id"),
        task: Task::new(
            TaskId::new("task-1").expect("valid task id"),
            "Draft roadmap",
            Some("first draft"),
            timestamp,
        ),
    };

    let encoded = serde_json::to_value(&event).expect("event should serialize");

    assert_eq!(encoded.pointer("/event"), Some(&json!("createTask")));
    assert_eq!(encoded.pointer("/payload/columnId"), Some(&json!("column-1")));
    assert_eq!(encoded.pointer("/payload/task/id"), Some(&json!("task-1")));
    assert_eq!(
        encoded.pointer("/payload/task/description"),
        Some(&json!("first draft"))
    );
    assert_eq!(
        encoded.pointer("/payload/task/createdAt"),
        encoded.pointer("/payload/task/updatedAt")
    );
}

#[rstest]
fn update_task_event_accepts_missing_description() {
    let decoded: BoardEvent = serde_json::from_value(json!({
        "event": "updateTask",
        "payload": { "taskId": "task-1", "title": "Renamed" }
    }))
    .expect("event should deserialize");

    assert_eq!(
        decoded,
        BoardEvent::UpdateTask {
            task_id: TaskId::new("task-1").expect("valid task id"),
            title: "Renamed".to_owned(),
            description: None,
        }
    );
    assert_eq!(decoded.name(), "updateTask");
}

#[rstest]
fn create_column_event_round_trips_task_ids() {
    let column = Column::new(ColumnId::new("column-9").expect("valid column id"), "Later");
    let event = BoardEvent::CreateColumn { column };

    let encoded = serde_json::to_value(&event).expect("event should serialize");
    assert_eq!(
        encoded,
        json!({
            "event": "createColumn",
            "payload": { "column": { "id": "column-9", "title": "Later", "taskIds": [] } }
        })
    );
    let decoded: BoardEvent = serde_json::from_value(encoded).expect("event should deserialize");
    assert_eq!(decoded, event);
}

#[rstest]
fn blank_identifiers_in_events_fail_to_decode() {
    let result: Result<BoardEvent, _> = serde_json::from_value(json!({
        "event": "deleteColumn",
        "payload": { "columnId": "  " }
    }));
    assert!(result.is_err());
}

#[rstest]
fn actor_ids_display_their_value() {
    let actor = ActorId::new("bob").expect("valid actor");
    assert_eq!(actor.to_string(), "bob");
}
