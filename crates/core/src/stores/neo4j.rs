use crate::error::RetrievalError;
use crate::models::{ChunkDetails, ChunkRecord};
use crate::traits::GraphStore;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};

/// Graph store over the Neo4j HTTP transaction endpoint. Every operation is
/// one `tx/commit` round-trip; document names and chunk keys are always
/// bound as parameters, never interpolated into the Cypher text.
pub struct Neo4jStore {
    endpoint: String,
    database: String,
    username: String,
    password: String,
    client: Client,
}

impl Neo4jStore {
    pub fn new(
        endpoint: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)?;

        Ok(Self {
            endpoint,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            client: Client::new(),
        })
    }

    fn tx_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.endpoint, self.database)
    }

    async fn run_statement(
        &self,
        statement: &str,
        parameters: Value,
    ) -> Result<Value, RetrievalError> {
        let response = self
            .client
            .post(self.tx_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({
                "statements": [
                    {
                        "statement": statement,
                        "parameters": parameters,
                    }
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrievalError::BackendResponse {
                backend: "neo4j".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;

        if let Some(error) = payload
            .pointer("/errors/0/message")
            .and_then(Value::as_str)
        {
            return Err(RetrievalError::BackendResponse {
                backend: "neo4j".to_string(),
                details: error.to_string(),
            });
        }

        Ok(payload)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn upsert_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RetrievalError> {
        if chunks.len() != embeddings.len() {
            return Err(RetrievalError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let ingested_at = Utc::now().to_rfc3339();
        let rows: Vec<_> = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                json!({
                    "chunk_key": chunk.chunk_key,
                    "file_name": chunk.document_name,
                    "page_number": chunk.sequence_number,
                    "text": chunk.text,
                    "embedding": embedding,
                })
            })
            .collect();

        let cypher = r#"
            UNWIND $rows AS row
            MERGE (c:Chunk {chunk_key: row.chunk_key})
            SET c.fileName = row.file_name,
                c.page_number = row.page_number,
                c.text = row.text,
                c.embedding = row.embedding,
                c.ingested_at = $ingested_at
            MERGE (d:Document {name: row.file_name})
            MERGE (d)-[:HAS_CHUNK]->(c)
            RETURN count(c) AS chunk_count;
        "#;

        self.run_statement(cypher, json!({ "rows": rows, "ingested_at": ingested_at }))
            .await?;
        Ok(())
    }

    async fn link_related(&self, document_name: &str) -> Result<(), RetrievalError> {
        let cypher = r#"
            MATCH (d:Document {name: $document_name})
            MATCH (other:Document)
            WHERE other.name <> $document_name
            MERGE (d)-[:RELATED_TO]->(other)
            RETURN count(other) AS related_count;
        "#;

        self.run_statement(cypher, json!({ "document_name": document_name }))
            .await?;
        Ok(())
    }

    async fn fetch_embeddings(
        &self,
        document_name: &str,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), RetrievalError> {
        let cypher = r#"
            MATCH (c:Chunk {fileName: $document_name})
            RETURN c.chunk_key AS chunk_key, c.embedding AS embedding
            ORDER BY c.page_number;
        "#;

        let payload = self
            .run_statement(cypher, json!({ "document_name": document_name }))
            .await?;

        let mut keys = Vec::new();
        let mut embeddings = Vec::new();

        for row in result_rows(&payload) {
            let key = row.first().and_then(Value::as_str);
            let vector = row.get(1).and_then(Value::as_array).map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|value| value as f32)
                    .collect::<Vec<f32>>()
            });

            if let (Some(key), Some(vector)) = (key, vector) {
                keys.push(key.to_string());
                embeddings.push(vector);
            }
        }

        Ok((keys, embeddings))
    }

    async fn chunk_details(
        &self,
        chunk_key: &str,
    ) -> Result<Option<ChunkDetails>, RetrievalError> {
        let cypher = r#"
            MATCH (c:Chunk {chunk_key: $chunk_key})
            RETURN c.text AS text, c.fileName AS file_name, c.page_number AS page_number
            LIMIT 1;
        "#;

        let payload = self
            .run_statement(cypher, json!({ "chunk_key": chunk_key }))
            .await?;

        let details = result_rows(&payload).into_iter().next().and_then(|row| {
            let text = row.first().and_then(Value::as_str)?;
            let document_name = row.get(1).and_then(Value::as_str)?;
            let page_number = row.get(2).and_then(Value::as_u64)? as u32;

            Some(ChunkDetails {
                chunk_key: chunk_key.to_string(),
                document_name: document_name.to_string(),
                page_number,
                text: text.to_string(),
            })
        });

        Ok(details)
    }
}

fn result_rows(payload: &Value) -> Vec<&Vec<Value>> {
    payload
        .pointer("/results/0/data")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.pointer("/row").and_then(Value::as_array))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_a_valid_url() {
        let result = Neo4jStore::new("not a url", "neo4j", "neo4j", "password");
        assert!(matches!(result, Err(RetrievalError::Url(_))));
    }

    #[test]
    fn transaction_rows_are_unwrapped() {
        let payload = json!({
            "results": [{
                "columns": ["chunk_key", "embedding"],
                "data": [
                    { "row": ["key-1", [0.0, 1.0]] },
                    { "row": ["key-2", [1.0, 0.0]] }
                ]
            }],
            "errors": []
        });

        let rows = result_rows(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], json!("key-1"));
        assert_eq!(rows[1][1], json!([1.0, 0.0]));
    }

    #[test]
    fn missing_results_yield_no_rows() {
        assert!(result_rows(&json!({ "errors": [] })).is_empty());
    }
}
