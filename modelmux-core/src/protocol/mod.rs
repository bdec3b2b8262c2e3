//! Provider-agnostic shapes the router accepts and returns

pub mod types;

pub use types::{
    CompletionRequest, ContentPart, FinishReason, LlmResponse, Message, MessageContent,
    MessageRole, ResponseFormat, StreamChunk, ToolCall, ToolCallDelta, ToolChoice,
    ToolCompletionRequest, ToolDefinition, Usage,
};
