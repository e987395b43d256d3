//! Blinded query planning: `{index, equals?, has?}` objects rewrite into
//! one parameterized statement over the attribute projection. Callers
//! never reach the SQL surface directly.

use common::digest::key_digest;
use common::error::StoreError;
use common::types::Query;

use super::doc_queries::parse_doc_row;
use super::{internal, Database, DocRecord};

// Every pair of an equals element must match within the entry row `e`
// ranges over, so pairs cannot be satisfied by attributes drawn from
// different entries that share a blinding key.
const ENTRY_PAIR_MATCH: &str = "EXISTS (SELECT 1 FROM hub_doc_attr a \
     WHERE a.hub_id = e.hub_id AND a.doc_id = e.doc_id \
     AND a.hmac_id = e.hmac_id AND a.entry_ord = e.entry_ord \
     AND a.name = ? AND a.value = ?)";

const NAME_MATCH: &str = "EXISTS (SELECT 1 FROM hub_doc_attr a \
     WHERE a.hub_id = d.hub_id AND a.doc_id = d.doc_id \
     AND a.hmac_id = ? AND a.name = ?)";

impl Database {
    /// Find the documents of a hub matching a blinded query.
    ///
    /// `equals` wins when both clause kinds are present. A query carrying
    /// neither is unsupported; non-string `equals` values are malformed.
    pub async fn find(&self, hub_id: &str, query: &Query) -> Result<Vec<DocRecord>, StoreError> {
        let hub = key_digest(hub_id);
        let index = key_digest(&query.index);

        let mut sql = String::from(
            "SELECT d.doc, d.created, d.updated FROM hub_doc d \
             WHERE d.hub_id = ? \
             AND EXISTS (SELECT 1 FROM hub_doc_attr a \
                 WHERE a.hub_id = d.hub_id AND a.doc_id = d.doc_id AND a.hmac_id = ?)",
        );
        let mut binds: Vec<String> = vec![hub, index.clone()];

        if !query.equals.is_empty() {
            let mut elements = Vec::with_capacity(query.equals.len());
            for element in &query.equals {
                if element.is_empty() {
                    return Err(StoreError::Data(
                        "equals element must name at least one attribute".to_string(),
                    ));
                }
                binds.push(index.clone());
                let mut pairs = Vec::with_capacity(element.len());
                for (name, value) in element {
                    let value = value.as_str().ok_or_else(|| {
                        StoreError::Data("equals attribute values must be strings".to_string())
                    })?;
                    pairs.push(ENTRY_PAIR_MATCH);
                    binds.extend([name.clone(), value.to_string()]);
                }
                elements.push(format!(
                    "EXISTS (SELECT 1 FROM hub_doc_attr e \
                     WHERE e.hub_id = d.hub_id AND e.doc_id = d.doc_id AND e.hmac_id = ? \
                     AND {})",
                    pairs.join(" AND ")
                ));
            }
            sql.push_str(&format!(" AND ({})", elements.join(" OR ")));
        } else if !query.has.is_empty() {
            for name in &query.has {
                sql.push_str(" AND ");
                sql.push_str(NAME_MATCH);
                binds.extend([index.clone(), name.clone()]);
            }
        } else {
            return Err(StoreError::NotSupported(
                "query must supply equals or has".to_string(),
            ));
        }

        sql.push_str(" ORDER BY d.doc_id");

        let mut statement = sqlx::query(&sql);
        for bind in &binds {
            statement = statement.bind(bind);
        }
        let rows = statement.fetch_all(&**self).await.map_err(internal)?;

        rows.into_iter().map(parse_doc_row).collect()
    }
}
