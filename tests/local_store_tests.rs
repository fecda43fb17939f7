//! Property and persistence tests for the file-backed vector store.

use proptest::prelude::*;
use semsearch::point::Point;
use semsearch::vectorstore::VectorStore;
use semsearch::{LocalVectorStore, SearchError};
use serde_json::Map;
use tempfile::TempDir;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

fn arb_point(dim: usize) -> impl Strategy<Value = Point> {
    ("[a-z]{3,8}", arb_normalized_embedding(dim)).prop_map(|(id, embedding)| Point {
        id,
        embedding,
        payload: Map::new(),
    })
}

mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Search results come back in descending score order, never more
        /// than `top_k` of them and never more than are stored.
        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            points in proptest::collection::vec(arb_point(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (hits, unique) = rt.block_on(async {
                let dir = TempDir::new().unwrap();
                let store = LocalVectorStore::open(dir.path()).unwrap();
                store.create_collection("test", DIM).await.unwrap();

                let unique = points
                    .iter()
                    .map(|p| p.id.as_str())
                    .collect::<std::collections::HashSet<_>>()
                    .len();
                store.upsert("test", &points).await.unwrap();
                let hits = store.search("test", &query, top_k).await.unwrap();
                (hits, unique)
            });

            prop_assert!(hits.len() <= top_k);
            prop_assert!(hits.len() <= unique);
            for window in hits.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

fn point(id: &str, embedding: Vec<f32>) -> Point {
    Point { id: id.to_string(), embedding, payload: Map::new() }
}

#[tokio::test]
async fn upsert_replaces_points_with_the_same_id() {
    let dir = TempDir::new().unwrap();
    let store = LocalVectorStore::open(dir.path()).unwrap();
    store.create_collection("c", 2).await.unwrap();

    store.upsert("c", &[point("a", vec![1.0, 0.0])]).await.unwrap();
    store.upsert("c", &[point("a", vec![0.0, 1.0])]).await.unwrap();

    assert_eq!(store.count("c").await.unwrap(), 1);
    let hits = store.search("c", &[0.0, 1.0], 10).await.unwrap();
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn collections_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.create_collection("c", 2).await.unwrap();
        store
            .upsert("c", &[point("a", vec![1.0, 0.0]), point("b", vec![0.0, 1.0])])
            .await
            .unwrap();
    }

    let reopened = LocalVectorStore::open(dir.path()).unwrap();
    assert_eq!(reopened.count("c").await.unwrap(), 2);
    let hits = reopened.search("c", &[1.0, 0.0], 1).await.unwrap();
    assert_eq!(hits[0].id, "a");
}

#[tokio::test]
async fn delete_collection_removes_the_file_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = LocalVectorStore::open(dir.path()).unwrap();
    store.create_collection("c", 2).await.unwrap();
    assert!(dir.path().join("c.json").exists());

    store.delete_collection("c").await.unwrap();
    assert!(!dir.path().join("c.json").exists());
    store.delete_collection("c").await.unwrap();

    let err = store.count("c").await.unwrap_err();
    assert!(matches!(err, SearchError::VectorStore { .. }));
}

#[tokio::test]
async fn search_on_missing_collection_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = LocalVectorStore::open(dir.path()).unwrap();

    let err = store.search("nope", &[1.0], 5).await.unwrap_err();
    assert!(matches!(err, SearchError::VectorStore { .. }));
}
