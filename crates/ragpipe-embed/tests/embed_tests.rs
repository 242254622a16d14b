use ragpipe_core::traits::Embedder;
use ragpipe_embed::{default_embedder, HashEmbedder, DEFAULT_DIM};

#[tokio::test]
async fn batch_embedding_matches_single_calls() {
    let e = HashEmbedder::new(32).expect("embedder");
    let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
    let batch = e.embed_batch(&texts).await.expect("batch");
    assert_eq!(batch.len(), 2);
    for (text, vec) in texts.iter().zip(&batch) {
        assert_eq!(vec, &e.embed(text).await.expect("single"));
        assert_eq!(vec.len(), 32);
    }
}

#[tokio::test]
async fn default_embedder_reports_configured_dim() {
    let e = default_embedder().expect("default");
    assert_eq!(e.dim(), DEFAULT_DIM);
    assert_eq!(e.embed("anything").await.expect("embed").len(), DEFAULT_DIM);
}
