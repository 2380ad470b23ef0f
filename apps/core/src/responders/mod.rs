//! Interchangeable answerers for free-text health questions.
//!
//! Callers build the composition up front, usually a [`FallbackResponder`]
//! wrapping a [`RemoteModelResponder`], and talk to it through
//! [`QueryResponder`].

pub mod fallback;
pub mod local;
pub mod remote;
pub mod traits;

pub use fallback::FallbackResponder;
pub use local::LocalRuleResponder;
pub use remote::RemoteModelResponder;
pub use traits::{ChatReply, ChatRole, ChatTurn, QueryRequest, QueryResponder, ReplySource};
