//! Integration tests for the document store: sequence gates, unique
//! attributes, hub isolation, and chunk coherence.

mod common;

use ::common::error::StoreError;
use ::common::types::Document;

#[tokio::test]
async fn test_config_sequence_must_start_at_zero() {
    let db = common::setup_database().await;

    let mut config = common::hub_config("acct-1");
    config.sequence = 1;
    let result = db.insert_config(&config).await;
    assert!(matches!(result, Err(StoreError::Data(_))));

    config.sequence = 0;
    db.insert_config(&config).await.unwrap();
}

#[tokio::test]
async fn test_config_duplicate_id_rejected() {
    let db = common::setup_database().await;

    let config = common::hub_config("acct-1");
    db.insert_config(&config).await.unwrap();
    let result = db.insert_config(&config).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn test_config_reference_id_unique_per_controller() {
    let db = common::setup_database().await;

    let mut first = common::hub_config("acct-1");
    first.reference_id = Some("primary".to_string());
    db.insert_config(&first).await.unwrap();

    // same controller, same reference id, different hub id
    let mut clash = common::hub_config("acct-1");
    clash.reference_id = Some("primary".to_string());
    let result = db.insert_config(&clash).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));

    // a different controller may reuse the name
    let mut other = common::hub_config("acct-2");
    other.reference_id = Some("primary".to_string());
    db.insert_config(&other).await.unwrap();
}

#[tokio::test]
async fn test_config_update_is_sequence_gated() {
    let db = common::setup_database().await;

    let mut config = common::hub_config("acct-1");
    db.insert_config(&config).await.unwrap();

    // skipping ahead fails
    config.sequence = 2;
    assert!(matches!(
        db.update_config(&config).await,
        Err(StoreError::InvalidState(_))
    ));

    config.sequence = 1;
    db.update_config(&config).await.unwrap();

    // replaying the same sequence fails now that it is stored
    assert!(matches!(
        db.update_config(&config).await,
        Err(StoreError::InvalidState(_))
    ));

    let record = db
        .get_config(config.id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(record.config.sequence, 1);
}

#[tokio::test]
async fn test_find_config_scopes_by_controller() {
    let db = common::setup_database().await;

    let mut mine = common::hub_config("acct-1");
    mine.reference_id = Some("primary".to_string());
    db.insert_config(&mine).await.unwrap();

    let mut theirs = common::hub_config("acct-2");
    theirs.reference_id = Some("primary".to_string());
    db.insert_config(&theirs).await.unwrap();

    let records = db.find_config("acct-1", "primary").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].config.id, mine.id);

    assert!(db.find_config("acct-3", "primary").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_doc_insert_rejects_malformed_ids() {
    let db = common::setup_database().await;

    let mut doc = common::doc(0);
    doc.id = "not-an-identifier".to_string();
    let result = db.insert("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::Syntax(_))));
}

#[tokio::test]
async fn test_doc_sequence_is_bounded() {
    let db = common::setup_database().await;

    let doc = common::doc(1 << 53);
    let result = db.insert("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::Data(_))));

    let result = db.update("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::Data(_))));
}

#[tokio::test]
async fn test_doc_insert_duplicate_id() {
    let db = common::setup_database().await;

    let doc = common::doc(0);
    db.insert("z-hub", &doc).await.unwrap();
    let result = db.insert("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn test_unique_attribute_collision() {
    let db = common::setup_database().await;

    let a = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "v", true)]);
    db.insert("z-hub", &a).await.unwrap();

    // same token under the same blinding key collides
    let b = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "v", true)]);
    let result = db.insert("z-hub", &b).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));

    // the same token under another hub is free
    db.insert("z-other", &b).await.unwrap();

    // non-unique attributes never collide
    let c = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "w", false)]);
    let d = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "w", false)]);
    db.insert("z-hub", &c).await.unwrap();
    db.insert("z-hub", &d).await.unwrap();
}

#[tokio::test]
async fn test_update_releases_unique_tokens() {
    let db = common::setup_database().await;

    let a = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "v", true)]);
    db.insert("z-hub", &a).await.unwrap();

    // drop the unique attribute at the next sequence
    let mut replacement = common::doc(1);
    replacement.id = a.id.clone();
    db.update("z-hub", &replacement).await.unwrap();

    // the token is free for another document now
    let b = common::indexed_doc(0, "urn:hmac:primary", vec![common::attr("x", "v", true)]);
    db.insert("z-hub", &b).await.unwrap();
}

#[tokio::test]
async fn test_doc_update_is_sequence_gated() {
    let db = common::setup_database().await;

    let mut doc = common::doc(4);
    db.insert("z-hub", &doc).await.unwrap();

    doc.sequence = 5;
    db.update("z-hub", &doc).await.unwrap();

    // replaying the same sequence fails, stored is now 5
    let result = db.update("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::InvalidState(_))));

    // skipping ahead fails too
    doc.sequence = 7;
    let result = db.update("z-hub", &doc).await;
    assert!(matches!(result, Err(StoreError::InvalidState(_))));

    let record = db.get("z-hub", &doc.id).await.unwrap();
    assert_eq!(record.doc.sequence, 5);
}

#[tokio::test]
async fn test_doc_update_upserts_missing_records() {
    let db = common::setup_database().await;

    // documents may be copied in at an arbitrary sequence
    let doc = common::doc(7);
    db.update("z-hub", &doc).await.unwrap();

    let record = db.get("z-hub", &doc.id).await.unwrap();
    assert_eq!(record.doc.sequence, 7);
}

#[tokio::test]
async fn test_doc_remove() {
    let db = common::setup_database().await;

    let doc = common::doc(0);
    db.insert("z-hub", &doc).await.unwrap();

    assert!(db.remove("z-hub", &doc.id).await.unwrap());
    assert!(matches!(
        db.get("z-hub", &doc.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(!db.remove("z-hub", &doc.id).await.unwrap());

    // removal releases the document id for reuse
    db.insert("z-hub", &doc).await.unwrap();
}

#[tokio::test]
async fn test_hub_isolation() {
    let db = common::setup_database().await;

    let doc = common::doc(0);
    db.insert("z-hub-a", &doc).await.unwrap();

    // the wrong hub never observes the document
    assert!(matches!(
        db.get("z-hub-b", &doc.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(!db.remove("z-hub-b", &doc.id).await.unwrap());

    // and cannot write through to it either
    let mut cross = doc.clone();
    cross.sequence = 1;
    db.update("z-hub-b", &cross).await.unwrap();
    let record = db.get("z-hub-a", &doc.id).await.unwrap();
    assert_eq!(record.doc.sequence, 0);
}

#[tokio::test]
async fn test_chunk_sequence_must_match_parent() {
    let db = common::setup_database().await;

    let doc = common::doc(0);
    db.insert("z-hub", &doc).await.unwrap();

    // stale and future sequences both fail
    let result = db.update_chunk("z-hub", &doc.id, &common::chunk(0, 1)).await;
    assert!(matches!(result, Err(StoreError::InvalidState(_))));

    db.update_chunk("z-hub", &doc.id, &common::chunk(0, 0))
        .await
        .unwrap();

    let record = db.get_chunk("z-hub", &doc.id, 0).await.unwrap();
    assert_eq!(record.chunk.sequence, 0);
    assert_eq!(record.chunk.index, 0);
}

#[tokio::test]
async fn test_chunk_requires_parent_document() {
    let db = common::setup_database().await;

    let result = db
        .update_chunk("z-hub", "z-missing", &common::chunk(0, 0))
        .await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    // removal does not consult the parent
    assert!(!db.remove_chunk("z-hub", "z-missing", 0).await.unwrap());
}

#[tokio::test]
async fn test_chunk_coherence_across_doc_updates() {
    let db = common::setup_database().await;

    let mut doc = common::doc(0);
    db.insert("z-hub", &doc).await.unwrap();
    db.update_chunk("z-hub", &doc.id, &common::chunk(0, 0))
        .await
        .unwrap();
    db.update_chunk("z-hub", &doc.id, &common::chunk(1, 0))
        .await
        .unwrap();

    doc.sequence = 1;
    db.update("z-hub", &doc).await.unwrap();

    // writers must catch up to the new sequence
    let result = db.update_chunk("z-hub", &doc.id, &common::chunk(2, 0)).await;
    assert!(matches!(result, Err(StoreError::InvalidState(_))));
    db.update_chunk("z-hub", &doc.id, &common::chunk(0, 1))
        .await
        .unwrap();

    // the sweep collects everything behind the current sequence
    let swept = db.remove_stale_chunks("z-hub", &doc.id, 1).await.unwrap();
    assert_eq!(swept, 1);
    assert!(matches!(
        db.get_chunk("z-hub", &doc.id, 1).await,
        Err(StoreError::NotFound(_))
    ));
    db.get_chunk("z-hub", &doc.id, 0).await.unwrap();
}

#[tokio::test]
async fn test_chunk_remove() {
    let db = common::setup_database().await;

    let doc = common::doc(0);
    db.insert("z-hub", &doc).await.unwrap();
    db.update_chunk("z-hub", &doc.id, &common::chunk(3, 0))
        .await
        .unwrap();

    assert!(db.remove_chunk("z-hub", &doc.id, 3).await.unwrap());
    assert!(!db.remove_chunk("z-hub", &doc.id, 3).await.unwrap());
}

#[tokio::test]
async fn test_doc_round_trips_verbatim() {
    let db = common::setup_database().await;

    let doc = common::indexed_doc(
        3,
        "urn:hmac:primary",
        vec![common::attr("name-token", "value-token", false)],
    );
    db.insert("z-hub", &doc).await.unwrap();

    let record = db.get("z-hub", &doc.id).await.unwrap();
    let stored: Document = record.doc;
    assert_eq!(stored.id, doc.id);
    assert_eq!(stored.sequence, 3);
    assert_eq!(stored.jwe, doc.jwe);
    assert_eq!(
        stored.indexed.as_ref().unwrap()[0].attributes,
        doc.indexed.as_ref().unwrap()[0].attributes
    );
    assert!(record.meta.created > 0);
    assert!(record.meta.updated >= record.meta.created);
}
