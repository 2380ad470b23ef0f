use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::intent::QueryDomain;
use crate::engine::locale::Language;
use crate::error::AppError;
use crate::models::UserHealthProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One past message of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A free-text health question plus everything needed to answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub language: Language,
    #[serde(default)]
    pub profile: UserHealthProfile,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl QueryRequest {
    /// `language_code` other than `ar` is treated as English.
    pub fn new(query: impl Into<String>, language_code: &str, profile: UserHealthProfile) -> Self {
        Self {
            query: query.into(),
            language: Language::from_code(language_code),
            profile,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub text: String,
    pub language: Language,
    pub source: ReplySource,
    /// Set when the reply came from the local knowledge base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<QueryDomain>,
}

/// Defines the public interface for anything that can answer a health question.
///
/// Implementations are interchangeable: the remote model, the local rule
/// engine, or the fallback wrapper composing the two.
#[async_trait]
pub trait QueryResponder: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn respond(&self, request: &QueryRequest) -> Result<ChatReply, AppError>;
}
