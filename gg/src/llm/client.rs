//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// Conversation state lives in the session, which replays the full
/// transcript on every request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted outcome for one mock call
    pub enum MockReply {
        Text(String),
        Fail(String),
    }

    /// Mock LLM client for unit tests
    ///
    /// Replays scripted replies in order and records every request it sees.
    pub struct MockLlmClient {
        replies: Vec<MockReply>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockLlmClient::new: called");
            Self {
                replies,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Convenience for a script of successful text replies
        pub fn with_texts(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| MockReply::Text(t.to_string())).collect())
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().expect("mock lock poisoned").clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.requests.lock().expect("mock lock poisoned").push(request);
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(idx) {
                Some(MockReply::Text(text)) => Ok(CompletionResponse::from_text(text.clone())),
                Some(MockReply::Fail(message)) => Err(LlmError::ApiError {
                    status: 500,
                    message: message.clone(),
                }),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::llm::Message;

        #[tokio::test]
        async fn test_mock_client_replays_in_order() {
            let client = MockLlmClient::with_texts(&["Response 1", "Response 2"]);
            let req = CompletionRequest::text("Test", vec![Message::user("hi")], 100);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content.as_deref(), Some("Response 1"));

            let resp2 = client.complete(req).await.unwrap();
            assert_eq!(resp2.content.as_deref(), Some("Response 2"));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted_or_scripted() {
            let client = MockLlmClient::new(vec![MockReply::Fail("boom".to_string())]);
            let req = CompletionRequest::text("Test", vec![], 100);

            assert!(client.complete(req.clone()).await.is_err());
            assert!(client.complete(req).await.is_err());
        }
    }
}
