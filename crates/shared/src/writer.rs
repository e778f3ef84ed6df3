use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ArticleLength, Config, Provider};
use crate::models::ArticleIdea;

const MAX_TOKENS: u32 = 3000;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

fn default_endpoint(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
        Provider::Claude => "https://api.anthropic.com/v1/messages",
        Provider::Zhipu => "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        Provider::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
        Provider::Offline => "",
    }
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "gpt-4o",
        Provider::Claude => "claude-3-5-sonnet-20241022",
        Provider::Zhipu => "glm-4",
        Provider::Qwen => "qwen-plus",
        Provider::Offline => "sample",
    }
}

/// Expands an article idea into Markdown prose via the configured provider
pub struct ArticleWriter {
    client: Client,
    provider: Provider,
    api_key: String,
    endpoint: String,
    model: String,
    length: ArticleLength,
}

impl ArticleWriter {
    pub fn new(config: &Config) -> Result<Self> {
        let provider = config.site.ai_provider;
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            provider,
            api_key,
            endpoint: default_endpoint(provider).to_string(),
            model: default_model(provider).to_string(),
            length: config.site.article_length,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn write(&self, idea: &ArticleIdea) -> Result<String> {
        if self.provider == Provider::Offline {
            debug!(title = %idea.title, "writing offline sample article");
            return Ok(sample_article(idea));
        }

        let prompt = build_prompt(idea, self.length);
        info!(provider = self.provider.name(), model = %self.model, "requesting article body");

        let text = match self.provider {
            Provider::Claude => self.claude_message(prompt).await?,
            _ => self.chat_completion(prompt).await?,
        };

        if text.trim().is_empty() {
            anyhow::bail!("{} returned an empty article", self.provider.name());
        }

        Ok(text)
    }

    async fn chat_completion(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} API", self.provider.name()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("{} API error {}: {}", self.provider.name(), status, error_text);
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .with_context(|| format!("Failed to parse {} API response", self.provider.name()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("API response has no choices")
    }

    async fn claude_message(&self, prompt: String) -> Result<String> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error {}: {}", status, error_text);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .context("Failed to parse Claude API response")?;

        Ok(claude_response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

pub fn build_prompt(idea: &ArticleIdea, length: ArticleLength) -> String {
    let outline = idea
        .outline
        .iter()
        .map(|section| format!("   - {}", section))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Write a professional article titled "{title}".

Requirements:
1. Length: {length}
2. Category: {category}
3. The article should cover the following points:
{outline}

4. Writing guidelines:
   - Professional, accurate and practical
   - Plain language suitable for everyday cat owners
   - Include concrete advice and precautions
   - Clear structure with descriptive subheadings
   - No promotional language
   - Grounded in veterinary science

5. Formatting:
   - Use Markdown
   - Use second-level (##) and third-level (###) headings
   - Mark important information in bold (**text**)
   - Use "- " or numbered lists
   - Add tip boxes where helpful, formatted as: > 💡 Tip: ...

Begin the article:"#,
        title = idea.title,
        length = length.target_words(),
        category = idea.category,
        outline = outline,
    )
}

/// Deterministic placeholder article used when no provider is configured
pub fn sample_article(idea: &ArticleIdea) -> String {
    let mut body = format!("# {}\n\n", idea.title);
    body.push_str(&format!(
        "This guide from our **{}** series walks through what every owner should know.\n\n",
        idea.category
    ));

    for (i, section) in idea.outline.iter().enumerate() {
        body.push_str(&format!("## {}\n\n", section));
        body.push_str(&format!(
            "Here we look at {} and what it means for your cat day to day. Watch for changes in appetite, energy and behavior.\n\n",
            section.to_lowercase()
        ));
        if i == 0 {
            body.push_str("> 💡 Tip: Keep a simple notebook of observations to share with your vet.\n\n");
        }
        if i == 1 {
            body.push_str("- **Observe** your cat daily\n- **Adjust** gradually\n- **Ask** a professional when unsure\n\n");
        }
    }

    body.push_str("## Summary\n\nPatience and consistency matter more than any single product or technique.\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea() -> ArticleIdea {
        ArticleIdea {
            title: "Meet the Ragdoll: Breed Traits and Care Tips".to_string(),
            category: "Breed Profiles".to_string(),
            outline: vec!["Origin and History".to_string(), "Temperament".to_string()],
            topic_key: "Breed Profiles_Ragdoll".to_string(),
        }
    }

    #[test]
    fn prompt_includes_title_length_and_outline() {
        let prompt = build_prompt(&idea(), ArticleLength::Long);
        assert!(prompt.contains("\"Meet the Ragdoll: Breed Traits and Care Tips\""));
        assert!(prompt.contains("2500-3000 words"));
        assert!(prompt.contains("   - Origin and History\n   - Temperament"));
        assert!(prompt.contains("> 💡 Tip:"));
    }

    #[test]
    fn sample_article_follows_outline() {
        let text = sample_article(&idea());
        assert!(text.starts_with("# Meet the Ragdoll"));
        assert!(text.contains("## Origin and History"));
        assert!(text.contains("## Temperament"));
        assert!(text.contains("> 💡 Tip:"));
        assert!(text.contains("- **Observe**"));
    }
}
