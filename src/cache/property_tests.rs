//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the item lifecycle against every in-process pool.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::backend::MemoryEntityManager;
use crate::cache::{Expiry, Pool};

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates JSON values of the shapes callers store
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,64}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Generates a sequence of item operations for testing
#[derive(Debug, Clone)]
enum ItemOp {
    Set { key: String, value: Value },
    Get { key: String },
    Delete { key: String },
}

fn item_op_strategy() -> impl Strategy<Value = ItemOp> {
    prop_oneof![
        (valid_key_strategy(), value_strategy())
            .prop_map(|(key, value)| ItemOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| ItemOp::Get { key }),
        valid_key_strategy().prop_map(|key| ItemOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Keys that were never written are misses with no value, on every pool.
    #[test]
    fn prop_unwritten_keys_miss(key in valid_key_strategy()) {
        tokio_test::block_on(async {
            let ephemeral = Pool::ephemeral();
            let item = ephemeral.get_item(&key).await.unwrap();
            prop_assert!(!item.is_hit().await.unwrap());
            prop_assert_eq!(item.get().await.unwrap(), None);

            let orm = Pool::orm(MemoryEntityManager::new());
            let item = orm.get_item(&key).await.unwrap();
            prop_assert!(!item.is_hit().await.unwrap());
            prop_assert_eq!(item.get().await.unwrap(), None);
            Ok(())
        })?;
    }

    // A write is visible through the same item and through a fresh one.
    #[test]
    fn prop_set_then_fresh_item_hits(key in valid_key_strategy(), value in value_strategy()) {
        tokio_test::block_on(async {
            let pool = Pool::orm(MemoryEntityManager::new());
            let item = pool.get_item(&key).await.unwrap();
            item.set(value.clone(), Expiry::Never).await.unwrap();
            prop_assert_eq!(item.get().await.unwrap(), Some(value.clone()));

            let fresh = pool.get_item(&key).await.unwrap();
            prop_assert!(fresh.is_hit().await.unwrap());
            prop_assert_eq!(fresh.get().await.unwrap(), Some(value));
            Ok(())
        })?;
    }

    // After delete, the item and a fresh item both miss.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in value_strategy()) {
        tokio_test::block_on(async {
            let pool = Pool::orm(MemoryEntityManager::new());
            let item = pool.get_item(&key).await.unwrap();
            item.set(value, Expiry::After(3600)).await.unwrap();
            item.delete().await.unwrap();

            prop_assert!(!item.is_hit().await.unwrap());
            prop_assert!(!pool.get_item(&key).await.unwrap().is_hit().await.unwrap());
            Ok(())
        })?;
    }

    // get_items returns exactly the written keys, in request order.
    #[test]
    fn prop_get_items_filters_and_orders(
        keys in prop::collection::vec(valid_key_strategy(), 1..20),
        written_mask in prop::collection::vec(any::<bool>(), 20)
    ) {
        tokio_test::block_on(async {
            let pool = Pool::ephemeral();
            let mut written = HashSet::new();
            for (key, write) in keys.iter().zip(&written_mask) {
                if *write {
                    pool.get_item(key).await.unwrap().set(json!(key), Expiry::Never).await.unwrap();
                    written.insert(key.clone());
                }
            }

            let items = pool.get_items(&keys).await.unwrap();

            let mut seen = HashSet::new();
            let expected: Vec<&str> = keys
                .iter()
                .filter(|k| written.contains(*k) && seen.insert(k.as_str()))
                .map(String::as_str)
                .collect();
            let actual: Vec<&str> = items.keys().collect();
            prop_assert_eq!(actual, expected);

            for key in &keys {
                prop_assert_eq!(items.get_item(key).is_some(), written.contains(key));
            }
            Ok(())
        })?;
    }

    // Clearing leaves nothing behind for any previously populated key.
    #[test]
    fn prop_clear_empties_pool(keys in prop::collection::vec(valid_key_strategy(), 1..150)) {
        tokio_test::block_on(async {
            let pool = Pool::orm(MemoryEntityManager::new());
            for key in &keys {
                pool.get_item(key).await.unwrap().set(1, Expiry::Never).await.unwrap();
            }

            pool.clear().await.unwrap();
            prop_assert_eq!(pool.get_items(&keys).await.unwrap().count(), 0);
            Ok(())
        })?;
    }

    // Any operation sequence leaves fresh items agreeing with a plain map.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(item_op_strategy(), 1..50)) {
        tokio_test::block_on(async {
            let pool = Pool::orm(MemoryEntityManager::new());
            let mut model: HashMap<String, Value> = HashMap::new();

            for op in ops {
                match op {
                    ItemOp::Set { key, value } => {
                        pool.get_item(&key).await.unwrap().set(value.clone(), Expiry::Never).await.unwrap();
                        model.insert(key, value);
                    }
                    ItemOp::Get { key } => {
                        let got = pool.get_item(&key).await.unwrap().get().await.unwrap();
                        prop_assert_eq!(got.as_ref(), model.get(&key));
                    }
                    ItemOp::Delete { key } => {
                        pool.get_item(&key).await.unwrap().delete().await.unwrap();
                        model.remove(&key);
                    }
                }
            }

            for (key, value) in &model {
                let got = pool.get_item(key).await.unwrap().get().await.unwrap();
                prop_assert_eq!(got.as_ref(), Some(value));
            }
            Ok(())
        })?;
    }
}

// == TTL Parsing Properties ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_integer_ttl_accepted(secs in any::<u64>()) {
        prop_assert_eq!(Expiry::from_ttl(Some(&json!(secs))).unwrap(), Expiry::After(secs));
    }

    #[test]
    fn prop_negative_ttl_rejected(secs in i64::MIN..0i64) {
        prop_assert!(Expiry::from_ttl(Some(&json!(secs))).is_err());
    }

    #[test]
    fn prop_non_timestamp_string_rejected(text in "[a-z !?]{0,20}") {
        prop_assert!(Expiry::from_ttl(Some(&json!(text))).is_err());
    }
}

// == Property Test for Error Response Format ==
// This tests the CacheError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any error, the HTTP response carries a JSON body with an "error"
    // field holding the error's message.
    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}"
    ) {
        use crate::error::CacheError;
        use axum::response::IntoResponse;
        use axum::body::to_bytes;

        let error_variants = vec![
            CacheError::InvalidArgument(error_msg.clone()),
            CacheError::NotFound(error_msg.clone()),
            CacheError::Storage(error_msg.clone()),
            CacheError::Internal(error_msg.clone()),
        ];

        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = tokio_test::block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });

            let json: Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MAX_KEY_LENGTH;

    #[test]
    fn test_key_length_boundary() {
        tokio_test::block_on(async {
            let pool = Pool::ephemeral();
            let max_key = "x".repeat(MAX_KEY_LENGTH);
            assert!(pool.get_item(&max_key).await.is_ok());

            let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
            assert!(pool.get_item(&long_key).await.is_err());
        });
    }

    #[test]
    fn test_ttl_rewrites_last_write_wins() {
        tokio_test::block_on(async {
            let pool = Pool::ephemeral();
            let item = pool.get_item("test").await.unwrap();

            item.set("value", Expiry::Never).await.unwrap();
            // Already past its deadline unless the next write clears it
            item.set("value", Expiry::After(0)).await.unwrap();
            item.set_with_ttl("value", None).await.unwrap();

            assert_eq!(item.get().await.unwrap(), Some(json!("value")));
            assert!(pool.get_item("test").await.unwrap().is_hit().await.unwrap());
            assert_eq!(pool.purge_expired().await, 0);
            assert_eq!(pool.backend().len().await, 1);
        });
    }

    #[test]
    fn test_orm_ttl_rewrites_last_write_wins() {
        tokio_test::block_on(async {
            let pool = Pool::orm(MemoryEntityManager::new());
            let item = pool.get_item("test").await.unwrap();

            item.set("value", Expiry::Never).await.unwrap();
            item.set("value", Expiry::After(0)).await.unwrap();
            assert!(!pool.get_item("test").await.unwrap().is_hit().await.unwrap());

            item.set_with_ttl("value", None).await.unwrap();

            let fresh = pool.get_item("test").await.unwrap();
            assert_eq!(fresh.get().await.unwrap(), Some(json!("value")));
        });
    }
}
