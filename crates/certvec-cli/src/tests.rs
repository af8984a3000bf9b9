//! Tests for the question loop

#[cfg(test)]
mod qa_tests {
    use crate::{QaSession, SYSTEM_PROMPT, build_messages, is_exit_keyword, render_hit};
    use async_trait::async_trait;
    use certvec_core::index::{DataSourceDefinition, IndexerDefinition, SearchHit};
    use certvec_core::{
        ChatMessage, ChatProvider, ChatRole, DatasetProfile, DocumentStore, EmbeddingProvider,
        MemorySearch, MemoryStore, Record, Result, SearchService,
    };
    use insta::assert_snapshot;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Points questions about serverless code at the first axis
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.to_lowercase().contains("serverless") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Records every conversation and answers with a fixed reply
    #[derive(Clone, Default)]
    struct RecordingChat {
        conversations: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    #[async_trait]
    impl ChatProvider for RecordingChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.conversations.lock().unwrap().push(messages.to_vec());
            Ok("Use Azure Functions.".to_string())
        }
    }

    fn service(id: &str, title: &str, content: &str, vector: [f32; 2]) -> Record {
        let mut record: Record = serde_json::from_value(json!({
            "id": id,
            "title": title,
            "content": content,
            "category": "Compute"
        }))
        .unwrap();
        record.set_vector("titleVector", vector.to_vec());
        record.set_vector("contentVector", vector.to_vec());
        record
    }

    async fn indexed_services() -> MemorySearch {
        let profile = DatasetProfile::Services;
        let store = MemoryStore::new();
        let target = profile.store_target();
        store.create_database_if_not_exists(&target.database).await.unwrap();
        store.create_container_if_not_exists(&target).await.unwrap();
        for record in [
            service("1", "Azure Functions", "Run event-driven serverless code.", [1.0, 0.0]),
            service("2", "Azure Blob Storage", "Store unstructured object data.", [0.0, 1.0]),
            service("3", "Azure Container Apps", "Run containers without servers.", [0.8, 0.6]),
        ] {
            store.create_item(&target, &record).await.unwrap();
        }

        let search = MemorySearch::new(store);
        search
            .create_or_update_index(&profile.index_definition())
            .await
            .unwrap();
        search
            .create_or_update_data_source(&DataSourceDefinition::cosmos_db(
                profile.data_source_name(),
                "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=a2V5;",
                profile.database(),
                profile.container(),
            ))
            .await
            .unwrap();
        search
            .create_or_update_indexer(&IndexerDefinition {
                name: profile.indexer_name().to_string(),
                data_source_name: profile.data_source_name().to_string(),
                target_index_name: profile.index_name().to_string(),
            })
            .await
            .unwrap();
        search.run_indexer(profile.indexer_name()).await.unwrap();
        search
    }

    fn hit(document: serde_json::Value) -> SearchHit {
        SearchHit {
            score: 0.9,
            document: serde_json::from_value(document).unwrap(),
        }
    }

    #[test]
    fn test_exit_keyword() {
        assert!(is_exit_keyword("end"));
        assert!(is_exit_keyword("  END \n"));
        assert!(!is_exit_keyword("the end"));
        assert!(!is_exit_keyword("exit"));
    }

    #[test]
    fn test_render_hit_skips_missing_and_null_fields() {
        let hit = hit(json!({
            "certification_name": "AZ-204",
            "service_name": "Azure Quantum",
            "service_description": null,
            "category": "Compute"
        }));
        let fields = DatasetProfile::Certifications.answer_fields();

        assert_snapshot!(render_hit(&hit, fields), @r###"
        certification_name: AZ-204
        service_name: Azure Quantum
        category: Compute
        "###);
    }

    #[test]
    fn test_build_messages_order() {
        let hits = vec![
            hit(json!({"title": "Azure Functions", "content": "Serverless"})),
            hit(json!({"unrelated": true})),
        ];
        let messages = build_messages("What runs code?", &hits, &["title", "content"]);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(messages[1], ChatMessage::user("What runs code?"));
        assert_eq!(messages[2].role, ChatRole::System);
        assert_eq!(messages[2].content, "title: Azure Functions\ncontent: Serverless");
    }

    #[tokio::test]
    async fn test_ask_grounds_answer_on_nearest_documents() {
        let search = indexed_services().await;
        let chat = RecordingChat::default();
        let session = QaSession::new(KeywordEmbedder, search, chat.clone(), DatasetProfile::Services)
            .with_top_k(2);

        let answer = session
            .ask("Where can I run serverless code?")
            .await
            .unwrap();

        assert_eq!(answer.text, "Use Azure Functions.");
        assert_eq!(answer.hits.len(), 2);
        assert_eq!(answer.hits[0].document.text("title").unwrap(), "Azure Functions");
        assert_eq!(answer.hits[1].document.text("title").unwrap(), "Azure Container Apps");
        assert!(answer.hits[0].document.get("contentVector").is_none());

        let conversations = chat.conversations.lock().unwrap();
        let messages = &conversations[0];
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "Where can I run serverless code?");
        assert!(messages[2].content.starts_with("title: Azure Functions\n"));
        assert!(messages[2].content.ends_with("category: Compute"));
    }

    #[tokio::test]
    async fn test_default_top_k_is_three() {
        let search = indexed_services().await;
        let session = QaSession::new(
            KeywordEmbedder,
            search,
            RecordingChat::default(),
            DatasetProfile::Services,
        );

        let hits = session.retrieve("Where do I keep files?").await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].document.text("title").unwrap(), "Azure Blob Storage");
    }

    #[tokio::test]
    async fn test_ask_without_index_fails() {
        let session = QaSession::new(
            KeywordEmbedder,
            MemorySearch::new(MemoryStore::new()),
            RecordingChat::default(),
            DatasetProfile::Certifications,
        );

        assert!(session.ask("anything").await.is_err());
    }
}
