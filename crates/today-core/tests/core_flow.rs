use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::tempdir;
use today_core::controller::{NewTask, ScreenController, ScreenState};
use today_core::repository::{TASKS_KEY, TaskRepository};
use today_core::store::{FileStore, KvStore, MemoryStore};
use today_core::task::TaskId;

#[test]
fn empty_store_add_toggle_and_hide_done() {
    let store = Arc::new(MemoryStore::new());
    let mut screen = ScreenController::new(store.clone()).expect("controller");

    screen.mount().expect("mount");
    assert_eq!(screen.state(), ScreenState::Ready);
    assert!(screen.visible_tasks().is_empty());

    let tomorrow = Utc::now() + Duration::days(1);
    screen.open_add_task();
    let id = screen
        .add_task(NewTask {
            description: "Buy milk".to_string(),
            date: tomorrow,
        })
        .expect("add task");

    assert_eq!(screen.visible_tasks().len(), 1);
    assert_eq!(screen.visible_tasks()[0].description, "Buy milk");
    assert_eq!(screen.visible_tasks()[0].done_at, None);

    let before = Utc::now();
    screen.toggle_task(id).expect("toggle");
    let done_at = screen.tasks()[0].done_at.expect("task is done");
    assert!(done_at >= before);

    screen.toggle_filter().expect("toggle filter");
    assert!(screen.visible_tasks().is_empty());
    assert_eq!(screen.tasks().len(), 1);

    screen.flush();
    let reloaded = TaskRepository::new(store).load();
    assert_eq!(reloaded, screen.tasks());
}

#[test]
fn file_store_survives_restart() {
    let temp = tempdir().expect("tempdir");
    let date = Utc::now() + Duration::days(2);

    {
        let store = FileStore::open(temp.path()).expect("open store");
        let mut screen = ScreenController::new(Arc::new(store)).expect("controller");
        screen.mount().expect("mount");
        for text in ["Write report", "Water plants", "Call bank"] {
            screen
                .add_task(NewTask {
                    description: text.to_string(),
                    date,
                })
                .expect("add task");
        }
        let second = screen.tasks()[1].id.clone();
        screen.delete_task(second).expect("delete");
    }

    let store = FileStore::open(temp.path()).expect("reopen store");
    let mut screen = ScreenController::new(Arc::new(store)).expect("controller");
    screen.mount().expect("mount");

    let descriptions: Vec<&str> = screen
        .tasks()
        .iter()
        .map(|task| task.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Write report", "Call bank"]);
    assert!(screen.show_done_tasks());
}

#[test]
fn legacy_blob_from_device_storage_loads() {
    let blob = r#"[
        {"id": 0.4217, "description": "Estudar", "estimateAt": "2021-05-01T15:30:00.000Z", "doneAt": null},
        {"id": 0.98, "description": "Correr", "estimateAt": "2021-05-02T10:00:00.000Z", "doneAt": "2021-05-02T11:00:00.000Z"}
    ]"#;
    let store = Arc::new(MemoryStore::with_entry(TASKS_KEY, blob));
    let mut screen = ScreenController::new(store.clone()).expect("controller");
    screen.mount().expect("mount");

    assert_eq!(screen.tasks().len(), 2);
    screen.toggle_filter().expect("toggle filter");
    assert_eq!(screen.visible_tasks().len(), 1);
    assert_eq!(screen.visible_tasks()[0].description, "Estudar");

    let first: TaskId = "0.4217".parse().expect("id");
    screen.toggle_task(first).expect("toggle");
    assert!(screen.tasks()[0].is_done());
    let added = screen
        .add_task(NewTask {
            description: "Ler".to_string(),
            date: Utc::now(),
        })
        .expect("add task");
    assert_eq!(added, TaskId::from(1));

    screen.flush();
    let raw = store.get(TASKS_KEY).expect("get").expect("saved");
    let saved: serde_json::Value = serde_json::from_slice(&raw).expect("json");
    assert_eq!(saved[0]["id"], 0.4217);
    assert_eq!(saved[1]["id"], 0.98);
    assert_eq!(saved[2]["id"], 1);
    assert_eq!(saved[1]["doneAt"], "2021-05-02T11:00:00Z");
}
