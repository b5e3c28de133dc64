//! End-to-end pipeline tests
//!
//! Runs tidy, materialize and index over a temporary project with the hashing
//! embedder, then reads the index back through the retriever and advisor.

use finsight::config::FinsightConfig;
use finsight::embedding::HashingEmbedder;
use finsight::kb::{read_chunks, IndexManifest};
use finsight::llm::{MockLLMClient, MockResponse};
use finsight::pipeline::{PipelineContext, PipelineOrchestrator, Stage};
use finsight::retrieval::{Advisor, Retriever};
use finsight::KnowledgeBaseError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const DIMENSION: usize = 128;

fn write_raw(root: &Path, name: &str, content: &str) {
    let raw = root.join("data/raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join(name), content).unwrap();
}

fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_raw(
        dir.path(),
        "2021.csv",
        "Category,January,February,March,Total\n\
         Income - Salary,\"3,000.00\",\"3,000.00\",\"3,000.00\",\"9,000.00\"\n\
         Expense - Rent,\"1,200.00\",\"1,200.00\",\"1,200.00\",\"3,600.00\"\n\
         Expense - Groceries,350.50,410.25,389.00,\"1,149.75\"\n",
    );
    write_raw(
        dir.path(),
        "2022.csv",
        "Category,January,February,March,Total\n\
         Income - Salary,\"3,200.00\",\"3,200.00\",\"3,200.00\",\"9,600.00\"\n\
         Expense - Rent,\"1,300.00\",\"1,300.00\",\"1,300.00\",\"3,900.00\"\n\
         Expense - Travel,0,\"2,500.00\",0,\"2,500.00\"\n",
    );
    dir
}

fn context_for(dir: &TempDir) -> PipelineContext {
    let config = FinsightConfig {
        root: dir.path().to_path_buf(),
        chunk_size: 300,
        chunk_overlap: 50,
        ..Default::default()
    };
    PipelineContext::new(config).with_embedder(Arc::new(HashingEmbedder::new(DIMENSION)))
}

#[tokio::test]
async fn test_full_pipeline_writes_every_artifact() {
    let dir = create_project();
    let mut context = context_for(&dir);

    let report = PipelineOrchestrator::full()
        .execute(&mut context)
        .await
        .unwrap();

    assert_eq!(report.stages, Stage::ALL.to_vec());

    let tidy = report.tidy.unwrap();
    assert_eq!(tidy.converted(), 2);
    assert_eq!(tidy.merge.files, 2);
    assert_eq!(tidy.merge.rows, 18);

    let layout = context.layout.clone();
    assert!(layout.tidy_dir().join("2021_tidy.csv").exists());
    assert!(layout.tidy_dir().join("2022_tidy.csv").exists());
    assert!(layout.dataset_file().exists());

    let materialize = report.materialize.unwrap();
    assert_eq!(materialize.years, vec![2021, 2022]);
    assert!(layout.facts_dir().join("2021.md").exists());
    assert!(layout.facts_dir().join("2022.md").exists());
    assert_eq!(materialize.categories, vec!["Rent", "Travel", "Groceries"]);
    assert!(layout.categories_dir().join("Rent.md").exists());
    assert_eq!(materialize.documents.len(), 5);

    let index = report.index.unwrap();
    assert_eq!(index.model, format!("hashing-{}", DIMENSION));
    assert_eq!(index.documents, materialize.documents.len());

    let manifest = IndexManifest::load(&layout.manifest_file()).unwrap();
    let chunks = read_chunks(&layout.chunks_file()).unwrap();
    assert_eq!(manifest.chunks, chunks.len());
    assert_eq!(manifest.dimension, DIMENSION);
    assert_eq!(manifest.documents, index.documents);
}

#[tokio::test]
async fn test_year_document_is_retrievable() {
    let dir = create_project();
    let mut context = context_for(&dir);
    PipelineOrchestrator::full()
        .execute(&mut context)
        .await
        .unwrap();

    let retriever = Retriever::open(
        &context.layout,
        Arc::new(HashingEmbedder::new(DIMENSION)),
    )
    .unwrap();
    assert!(!retriever.is_empty());

    let hits = retriever.search("Year 2022 overview total income", 3).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.len() <= 3);
    assert_eq!(hits[0].rank, 1);
    assert!(hits
        .iter()
        .any(|hit| hit.doc_path == "kb/raw/facts/2022.md"));
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn test_retriever_rejects_a_different_embedder() {
    let dir = create_project();
    let mut context = context_for(&dir);
    PipelineOrchestrator::full()
        .execute(&mut context)
        .await
        .unwrap();

    let err = Retriever::open(&context.layout, Arc::new(HashingEmbedder::new(64))).unwrap_err();
    assert!(matches!(err, KnowledgeBaseError::ModelMismatch { .. }));
}

#[tokio::test]
async fn test_stages_can_run_separately() {
    let dir = create_project();
    let mut context = context_for(&dir);

    let tidy_only = PipelineOrchestrator::new(vec![Stage::Tidy])
        .execute(&mut context)
        .await
        .unwrap();
    assert!(tidy_only.tidy.is_some());
    assert!(tidy_only.materialize.is_none());
    assert!(!context.layout.manifest_file().exists());

    let mut context = context_for(&dir);
    let rest = PipelineOrchestrator::new(vec![Stage::Materialize, Stage::Index])
        .execute(&mut context)
        .await
        .unwrap();
    assert!(rest.tidy.is_none());
    assert!(rest.index.unwrap().chunks > 0);
    assert!(context.layout.manifest_file().exists());
}

#[tokio::test]
async fn test_search_before_index_reports_missing_index() {
    let dir = create_project();
    let layout = context_for(&dir).layout.clone();

    let err = Retriever::open(&layout, Arc::new(HashingEmbedder::new(DIMENSION))).unwrap_err();
    assert!(matches!(err, KnowledgeBaseError::IndexMissing(_)));
}

#[tokio::test]
async fn test_advisor_answers_from_retrieved_context() {
    let dir = create_project();
    let mut context = context_for(&dir);
    PipelineOrchestrator::full()
        .execute(&mut context)
        .await
        .unwrap();

    let retriever = Retriever::open(
        &context.layout,
        Arc::new(HashingEmbedder::new(DIMENSION)),
    )
    .unwrap();
    let llm = Arc::new(MockLLMClient::new());
    llm.add_response(MockResponse::text("Rent rose from 3,600.00 to 3,900.00 [1]."));

    let advisor = Advisor::new(retriever, llm.clone());
    let answer = advisor
        .ask("How much did rent change between 2021 and 2022?", 4)
        .await
        .unwrap();

    assert!(answer.text.contains("3,900.00"));
    assert!(!answer.sources.is_empty());
    assert!(answer.sources.len() <= 4);

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[1].content;
    assert!(prompt.contains("Question: How much did rent change between 2021 and 2022?"));
    assert!(prompt.contains(&answer.sources[0].citation()));
}
