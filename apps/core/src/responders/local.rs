use async_trait::async_trait;
use tracing::debug;

use super::traits::{ChatReply, QueryRequest, QueryResponder, ReplySource};
use crate::engine::intent::KnowledgeBase;
use crate::engine::recommend::RecommendationComposer;
use crate::error::AppError;

/// Answers from the deterministic rule engine: knowledge-base answer followed
/// by the personalized recommendations.
#[derive(Debug, Clone, Default)]
pub struct LocalRuleResponder {
    knowledge: KnowledgeBase,
    composer: RecommendationComposer,
}

impl LocalRuleResponder {
    pub fn new(knowledge: KnowledgeBase, composer: RecommendationComposer) -> Self {
        Self { knowledge, composer }
    }

    /// Infallible variant of [`QueryResponder::respond`].
    pub fn reply(&self, request: &QueryRequest) -> ChatReply {
        let answer = self.knowledge.answer(&request.query, request.language, &request.profile);
        let recommendations = self
            .composer
            .compose(&request.query, request.language, &request.profile);

        debug!(
            domain = %answer.domain,
            recommendations = recommendations.items.len(),
            "Local reply composed"
        );

        ChatReply {
            text: format!("{}\n\n{}", answer.answer, recommendations.items.join("\n")),
            language: request.language,
            source: ReplySource::Local,
            domain: Some(answer.domain),
        }
    }
}

#[async_trait]
impl QueryResponder for LocalRuleResponder {
    fn name(&self) -> &'static str {
        "local-rules"
    }

    async fn respond(&self, request: &QueryRequest) -> Result<ChatReply, AppError> {
        Ok(self.reply(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::intent::QueryDomain;
    use crate::models::UserHealthProfile;

    #[tokio::test]
    async fn test_local_reply_layout() {
        let profile = UserHealthProfile {
            diabetes_type: Some("Type 2".to_string()),
            ..Default::default()
        };
        let request = QueryRequest::new("What food is good for my blood sugar?", "en", profile);

        let reply = LocalRuleResponder::default().respond(&request).await.unwrap();

        assert_eq!(reply.source, ReplySource::Local);
        assert_eq!(reply.domain, Some(QueryDomain::Diabetes));
        let (answer, recommendations) = reply.text.split_once("\n\n").unwrap();
        assert!(answer.starts_with("For Type 2 diabetes"));
        assert!(recommendations.starts_with("For Type 2 diabetes, focus on low-glycemic foods"));
    }
}
