//! Integration tests for blinded queries over indexed documents.

mod common;

use ::common::error::StoreError;
use ::common::types::Query;

const INDEX: &str = "urn:hmac:primary";

fn has_query(names: &[&str]) -> Query {
    Query {
        index: INDEX.to_string(),
        equals: vec![],
        has: names.iter().map(|n| n.to_string()).collect(),
    }
}

fn equals_query(elements: &[&[(&str, &str)]]) -> Query {
    Query {
        index: INDEX.to_string(),
        equals: elements
            .iter()
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(n, v)| (n.to_string(), serde_json::Value::from(*v)))
                    .collect()
            })
            .collect(),
        has: vec![],
    }
}

#[tokio::test]
async fn test_has_returns_exactly_the_matching_docs() {
    let db = common::setup_database().await;

    let matching = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    let other = common::indexed_doc(0, INDEX, vec![common::attr("m", "v2", false)]);
    let unindexed = common::doc(0);
    db.insert("z-hub", &matching).await.unwrap();
    db.insert("z-hub", &other).await.unwrap();
    db.insert("z-hub", &unindexed).await.unwrap();

    let records = db.find("z-hub", &has_query(&["n"])).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc.id, matching.id);
}

#[tokio::test]
async fn test_has_requires_every_name() {
    let db = common::setup_database().await;

    let both = common::indexed_doc(
        0,
        INDEX,
        vec![common::attr("n", "v1", false), common::attr("m", "v2", false)],
    );
    let only_n = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    db.insert("z-hub", &both).await.unwrap();
    db.insert("z-hub", &only_n).await.unwrap();

    let records = db.find("z-hub", &has_query(&["n", "m"])).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc.id, both.id);
}

#[tokio::test]
async fn test_equals_matches_name_and_value() {
    let db = common::setup_database().await;

    let matching = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    let wrong_value = common::indexed_doc(0, INDEX, vec![common::attr("n", "v2", false)]);
    db.insert("z-hub", &matching).await.unwrap();
    db.insert("z-hub", &wrong_value).await.unwrap();

    let records = db
        .find("z-hub", &equals_query(&[&[("n", "v1")]]))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc.id, matching.id);
}

#[tokio::test]
async fn test_equals_pairs_conjoin_within_an_element() {
    let db = common::setup_database().await;

    let both = common::indexed_doc(
        0,
        INDEX,
        vec![common::attr("n", "v1", false), common::attr("m", "v2", false)],
    );
    let partial = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    db.insert("z-hub", &both).await.unwrap();
    db.insert("z-hub", &partial).await.unwrap();

    let records = db
        .find("z-hub", &equals_query(&[&[("n", "v1"), ("m", "v2")]]))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc.id, both.id);
}

#[tokio::test]
async fn test_equals_pairs_bind_to_one_entry() {
    let db = common::setup_database().await;

    // the pairs are spread across two entries of the same index here;
    // the element must not match across them
    let split = common::multi_entry_doc(
        0,
        INDEX,
        vec![
            vec![common::attr("n", "v1", false)],
            vec![common::attr("m", "v2", false)],
        ],
    );
    let together = common::indexed_doc(
        0,
        INDEX,
        vec![common::attr("n", "v1", false), common::attr("m", "v2", false)],
    );
    db.insert("z-hub", &split).await.unwrap();
    db.insert("z-hub", &together).await.unwrap();

    let records = db
        .find("z-hub", &equals_query(&[&[("n", "v1"), ("m", "v2")]]))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc.id, together.id);

    // either entry alone still satisfies a single-pair element
    let records = db
        .find("z-hub", &equals_query(&[&[("n", "v1")]]))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_equals_elements_disjoin() {
    let db = common::setup_database().await;

    let first = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    let second = common::indexed_doc(0, INDEX, vec![common::attr("n", "v2", false)]);
    let neither = common::indexed_doc(0, INDEX, vec![common::attr("n", "v3", false)]);
    db.insert("z-hub", &first).await.unwrap();
    db.insert("z-hub", &second).await.unwrap();
    db.insert("z-hub", &neither).await.unwrap();

    let records = db
        .find("z-hub", &equals_query(&[&[("n", "v1")], &[("n", "v2")]]))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_query_scopes_by_index() {
    let db = common::setup_database().await;

    let other_index = common::indexed_doc(0, "urn:hmac:other", vec![common::attr("n", "v1", false)]);
    db.insert("z-hub", &other_index).await.unwrap();

    assert!(db.find("z-hub", &has_query(&["n"])).await.unwrap().is_empty());
    assert!(db
        .find("z-hub", &equals_query(&[&[("n", "v1")]]))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_query_scopes_by_hub() {
    let db = common::setup_database().await;

    let doc = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    db.insert("z-hub-a", &doc).await.unwrap();

    assert!(db
        .find("z-hub-b", &has_query(&["n"]))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_equals_wins_over_has() {
    let db = common::setup_database().await;

    let doc = common::indexed_doc(0, INDEX, vec![common::attr("n", "v1", false)]);
    db.insert("z-hub", &doc).await.unwrap();

    // has alone would match, but the equals clause takes precedence
    let query = Query {
        index: INDEX.to_string(),
        equals: vec![[("n".to_string(), serde_json::Value::from("other"))]
            .into_iter()
            .collect()],
        has: vec!["n".to_string()],
    };
    assert!(db.find("z-hub", &query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_equals_rejects_non_string_values() {
    let db = common::setup_database().await;

    let query = Query {
        index: INDEX.to_string(),
        equals: vec![[("n".to_string(), serde_json::Value::from(42))]
            .into_iter()
            .collect()],
        has: vec![],
    };
    assert!(matches!(
        db.find("z-hub", &query).await,
        Err(StoreError::Data(_))
    ));
}

#[tokio::test]
async fn test_empty_query_is_unsupported() {
    let db = common::setup_database().await;

    let query = Query {
        index: INDEX.to_string(),
        equals: vec![],
        has: vec![],
    };
    assert!(matches!(
        db.find("z-hub", &query).await,
        Err(StoreError::NotSupported(_))
    ));
}
