//! Prompt templates sent to the language model.
//!
//! Every function here is pure: the same inputs always produce the same text.

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;

use crate::config::constants::MAX_TITLE_CHARS;
use crate::models::{BotParams, Message};

/// System message the Gemini profile sends ahead of a generation request.
pub const GEMINI_SYSTEM_PROMPT: &str = "你是一個有幫助的教育助手。";

/// Builds the request that asks the model to author a persona system prompt.
pub fn build_prompt(
    role: &str,
    goal: &str,
    object: &str,
    activity: &str,
    format: &str,
    responsestyle: &str,
) -> String {
    format!(
        r#"
你是一個擬人化的 AI 教學機器人，角色是「{role}」。
請根據以下設定幫我設計一段 chatbot Prompt，用來建立一個能與學生進行互動的 AI 對話機器人。

🎯 任務目標（Goal）：
{goal}

👥 教學對象描述（Object）：
{object}

🛠️ 教學活動進行方式（Learning Activity）：
{activity}

🗂️ 輸出內容與格式（Output）：
{format}

🎨 回應風格（Style）：
{responsestyle}

請用這些條件撰寫一段 Prompt，讓這個機器人能用來幫助學生進行有意義的學習對話。Prompt 中請包括：
- 機器人角色與個性
- 回應語氣
- 該如何進行提問或引導
- 要提供什麼樣的學習幫助與回饋
"#
    )
}

pub fn build_prompt_for(params: &BotParams) -> String {
    build_prompt(
        &params.role,
        &params.goal,
        &params.object,
        &params.activity,
        &params.format,
        &params.responsestyle,
    )
}

/// Renders the history as `Bot:` / `User:` lines in the given order.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.speaker(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat_system_prompt(persona_prompt: &str) -> String {
    format!(
        "你是一個遵循以下角色定義的AI教學助手：\n\n{persona_prompt}\n\n請按照上述設定的角色與指導方針回覆用戶的問題。"
    )
}

pub fn chat_user_prompt(transcript: &str) -> String {
    format!("聊天歷史：\n{transcript}\n\n請根據上述聊天歷史回應用戶最後一個問題。")
}

/// First `MAX_TITLE_CHARS` characters of the message, with `...` appended
/// when it had to be cut.
pub fn conversation_title(message: &str) -> String {
    match message.char_indices().nth(MAX_TITLE_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}
