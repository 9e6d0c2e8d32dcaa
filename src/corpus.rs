//! Fixed sample corpus the check suites ingest and query.

use vector_store::Document;

/// Three small documents with distinct topics, so relevance ordering is
/// predictable across both engines.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "ai-article",
            "Artificial Intelligence is transforming how we work. Machine learning \
             models can now process vast amounts of data and identify patterns that \
             humans might miss.",
        )
        .with_metadata("source", "https://example.com/ai-article")
        .with_metadata("title", "The Future of AI")
        .with_metadata("author", "John Doe")
        .with_metadata("topic", "AI"),
        Document::new(
            "climate-article",
            "Climate change is one of the most pressing issues of our time. Rising \
             temperatures affect ecosystems and human societies globally.",
        )
        .with_metadata("source", "https://example.com/climate-article")
        .with_metadata("title", "Understanding Climate Change")
        .with_metadata("author", "Jane Smith")
        .with_metadata("topic", "environment"),
        Document::new(
            "quantum-article",
            "Quantum computing promises to revolutionize cryptography and solve \
             complex problems exponentially faster than classical computers.",
        )
        .with_metadata("source", "https://example.com/quantum-article")
        .with_metadata("title", "Quantum Computing Explained")
        .with_metadata("author", "Bob Johnson")
        .with_metadata("topic", "physics"),
    ]
}
