//! End-to-end pipeline tests over a local embedder and a mock LLM.

mod common;

use common::mocks::{
    local_embedder, pipeline_with, pipeline_with_settings, FailingEmbedder, MockLLMClient,
    TEST_DIMENSIONS,
};
use playground::llm::ModelParams;
use playground::rag::{nodes_from_index, PipelineSettings, QueryRequest};
use playground::types::{AppError, GenerationFailureReason, NodeWithEmbedding};
use std::sync::Arc;
use std::time::Duration;

fn query(text: &str, top_k: usize) -> QueryRequest {
    QueryRequest {
        query_text: text.to_string(),
        top_k,
        params: ModelParams::default(),
    }
}

#[tokio::test]
async fn test_cat_dog_document_overlapping_chunks() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));

    let index = pipeline
        .build_index("A cat sat on a mat. A dog ran in the park.", 5, 1)
        .await
        .unwrap();

    let nodes = nodes_from_index(&index);
    let texts: Vec<&str> = nodes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["A cat sat on a", "a mat. A dog ran", "ran in the park."]
    );
    assert!(nodes.iter().all(|n| n.embedding.len() == TEST_DIMENSIONS));

    // Adjacent chunks share exactly one token.
    for pair in texts.windows(2) {
        let last = pair[0].split_whitespace().last().unwrap();
        let first = pair[1].split_whitespace().next().unwrap();
        assert_eq!(last, first);
    }

    // Querying with a chunk's own vector ranks it first with similarity ~1.
    let hits = index.top_k(&nodes[1].embedding, 3).unwrap();
    assert_eq!(hits.hits[0].chunk.ordinal, 1);
    assert!((hits.hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_query_grounds_on_best_chunk() {
    let llm = MockLLMClient::new("The dog ran in the park.");
    let pipeline = pipeline_with(Arc::new(local_embedder()), llm.clone());

    let index = pipeline
        .build_index("A cat sat on a mat. A dog ran in the park.", 5, 1)
        .await
        .unwrap();
    let answer = pipeline
        .answer_query(&index, &query("a mat. A dog ran", 2))
        .await
        .unwrap();

    assert_eq!(answer.text, "The dog ran in the park.");
    assert_eq!(answer.grounding.len(), 2);
    assert_eq!(answer.grounding[0].chunk.ordinal, 1);
    assert!(answer.grounding[0].score >= answer.grounding[1].score);

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("a mat. A dog ran"));
    assert!(calls[0].prompt.contains("Query: a mat. A dog ran"));
}

#[tokio::test]
async fn test_overlap_not_smaller_than_size_is_rejected_before_embedding() {
    let embedder = Arc::new(local_embedder());
    let pipeline = pipeline_with(embedder.clone(), MockLLMClient::new("ok"));

    let err = pipeline
        .build_index("one two three four five six", 5, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidConfiguration(_)));
    assert_eq!(embedder.texts_embedded(), 0);
}

#[tokio::test]
async fn test_top_k_larger_than_index() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));

    let index = pipeline
        .build_index("a single short chunk", 100, 10)
        .await
        .unwrap();
    assert_eq!(index.len(), 1);

    let answer = pipeline
        .answer_query(&index, &query("short", 2))
        .await
        .unwrap();
    assert_eq!(answer.grounding.len(), 1);
}

#[tokio::test]
async fn test_empty_document_still_answers() {
    let embedder = Arc::new(local_embedder());
    let llm = MockLLMClient::new("I don't know.");
    let pipeline = pipeline_with(embedder.clone(), llm.clone());

    let index = pipeline.build_index("   \n\t ", 10, 2).await.unwrap();
    assert!(index.is_empty());
    assert!(nodes_from_index(&index).is_empty());

    let answer = pipeline
        .answer_query(&index, &query("anything?", 2))
        .await
        .unwrap();

    assert_eq!(answer.text, "I don't know.");
    assert!(answer.grounding.is_empty());
    assert_eq!(llm.call_count(), 1);
    assert_eq!(embedder.texts_embedded(), 0);
}

#[tokio::test]
async fn test_payload_round_trip_preserves_ranking() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));
    let document = "Rust has ownership. Python has garbage collection. \
                    Go has goroutines. Rust has lifetimes and borrowing.";

    let built = pipeline.build_index(document, 4, 1).await.unwrap();
    let rebuilt = pipeline
        .index_from_nodes(&nodes_from_index(&built))
        .unwrap();

    let request = query("rust ownership lifetimes", 3);
    let a = pipeline.answer_query(&built, &request).await.unwrap();
    let b = pipeline.answer_query(&rebuilt, &request).await.unwrap();

    let ordinals = |answer: &playground::rag::Answer| {
        answer
            .grounding
            .iter()
            .map(|h| h.chunk.ordinal)
            .collect::<Vec<_>>()
    };
    assert_eq!(ordinals(&a), ordinals(&b));
}

#[tokio::test]
async fn test_query_dimension_mismatch() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));
    let nodes = vec![NodeWithEmbedding {
        text: "three dims".to_string(),
        embedding: vec![0.1, 0.2, 0.3],
    }];

    let index = pipeline.index_from_nodes(&nodes).unwrap();
    let err = pipeline
        .answer_query(&index, &query("q", 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::DimensionMismatch {
            expected: 3,
            actual: TEST_DIMENSIONS
        }
    ));
}

#[tokio::test]
async fn test_inconsistent_payload_dimensions() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));
    let nodes = vec![
        NodeWithEmbedding {
            text: "a".to_string(),
            embedding: vec![1.0, 0.0],
        },
        NodeWithEmbedding {
            text: "b".to_string(),
            embedding: vec![1.0, 0.0, 0.0],
        },
    ];

    let err = pipeline.index_from_nodes(&nodes).unwrap_err();
    assert!(matches!(
        err,
        AppError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn test_embedding_failure_aborts_build() {
    let llm = MockLLMClient::new("ok");
    let pipeline = pipeline_with(Arc::new(FailingEmbedder), llm.clone());

    let err = pipeline
        .build_index("some words to embed", 2, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmbeddingFailure(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_params_rejected_before_embedding() {
    let embedder = Arc::new(local_embedder());
    let llm = MockLLMClient::new("ok");
    let pipeline = pipeline_with(embedder.clone(), llm.clone());

    let index = pipeline.build_index("alpha beta gamma", 2, 0).await.unwrap();
    let embedded_after_build = embedder.texts_embedded();

    let request = QueryRequest {
        query_text: "alpha".to_string(),
        top_k: 1,
        params: ModelParams::new(3.0, 0.5),
    };
    let err = pipeline.answer_query(&index, &request).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidConfiguration(_)));
    assert_eq!(embedder.texts_embedded(), embedded_after_build);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_zero_top_k_rejected() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));
    let index = pipeline.build_index("alpha beta", 2, 0).await.unwrap();

    let err = pipeline
        .answer_query(&index, &query("alpha", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let pipeline = pipeline_with(
        Arc::new(local_embedder()),
        MockLLMClient::failing(GenerationFailureReason::RateLimited),
    );
    let index = pipeline.build_index("alpha beta", 2, 0).await.unwrap();

    let err = pipeline
        .answer_query(&index, &query("alpha", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::GenerationFailure {
            reason: GenerationFailureReason::RateLimited,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout_from_settings() {
    let settings = PipelineSettings {
        generation_timeout: Duration::from_secs(2),
        ..PipelineSettings::default()
    };
    let pipeline = pipeline_with_settings(
        Arc::new(local_embedder()),
        MockLLMClient::slow("too late", Duration::from_secs(30)),
        settings,
    );
    let index = pipeline.build_index("alpha beta", 2, 0).await.unwrap();

    let err = pipeline
        .answer_query(&index, &query("alpha", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::GenerationFailure {
            reason: GenerationFailureReason::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_system_prompt_and_params_reach_llm() {
    let llm = MockLLMClient::new("ok");
    let settings = PipelineSettings {
        system_prompt: Some("Answer in one sentence.".to_string()),
        ..PipelineSettings::default()
    };
    let pipeline = pipeline_with_settings(Arc::new(local_embedder()), llm.clone(), settings);
    let index = pipeline.build_index("alpha beta", 2, 0).await.unwrap();

    let request = QueryRequest {
        query_text: "alpha".to_string(),
        top_k: 1,
        params: ModelParams::new(0.7, 0.9),
    };
    pipeline.answer_query(&index, &request).await.unwrap();

    let call = &llm.calls()[0];
    assert_eq!(call.system.as_deref(), Some("Answer in one sentence."));
    assert_eq!(call.params, ModelParams::new(0.7, 0.9));
}

#[tokio::test]
async fn test_chunks_tagged_with_build_source() {
    let pipeline = pipeline_with(Arc::new(local_embedder()), MockLLMClient::new("ok"));
    let index = pipeline.build_index("a b c d e f", 2, 0).await.unwrap();

    let entries = index.entries();
    let source = entries[0].chunk.source_id.clone();
    assert!(source.is_some());
    assert!(entries.iter().all(|e| e.chunk.source_id == source));
}
