mod common;

use common::{checklist, editor, FakeApi};
use edufad_core::api::ApiError;
use edufad_core::view::{BindingVersion, ViewBindings};
use edufad_core::{AppContext, ChecklistStore, FetchError};
use std::sync::Arc;

fn api() -> Arc<FakeApi> {
    Arc::new(FakeApi::new(checklist(&[("C1", &["I1", "I2"])]), editor()))
}

#[tokio::test]
async fn concurrent_first_loads_share_one_fetch() {
    let api = api();
    let store = ChecklistStore::new(Arc::clone(&api));

    let (first, second) = tokio::join!(store.load(), store.load());
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(api.checklist_loads(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(store.cached().is_some());

    store.load().await.unwrap();
    assert_eq!(api.checklist_loads(), 1);
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let api = api();
    api.fail_next_checklist(ApiError::Transport("connection reset".to_string()));
    let store = ChecklistStore::new(Arc::clone(&api));

    let err = store.load().await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Unavailable {
            resource: "checklist",
            ..
        }
    ));
    assert!(store.cached().is_none());

    let checklist = store.load().await.unwrap();
    assert_eq!(checklist.item_count(), 2);
    assert_eq!(api.checklist_loads(), 2);
}

#[tokio::test]
async fn context_keeps_its_checklist_store() {
    let api = api();
    let checklists = Arc::new(ChecklistStore::new(Arc::clone(&api)));
    api.fail_next_checklist(ApiError::Transport("timeout".to_string()));
    let bindings = || ViewBindings::for_version(BindingVersion::V2);

    assert!(
        AppContext::bootstrap_with(Arc::clone(&api), Arc::clone(&checklists), bindings())
            .await
            .is_err()
    );
    let ctx = AppContext::bootstrap_with(Arc::clone(&api), Arc::clone(&checklists), bindings())
        .await
        .unwrap();
    assert_eq!(api.checklist_loads(), 2);

    let reloaded = ctx.checklists().load().await.unwrap();
    assert!(Arc::ptr_eq(&reloaded, ctx.checklist()));
    assert_eq!(api.checklist_loads(), 2);
}
