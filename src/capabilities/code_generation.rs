//! Code snippet generation.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use super::{CodeGeneration, CodeQuestion, CodeSnippet, complete_text};
use crate::error::CapabilityError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const CAPABILITY: &str = "code_generation";

/// Language reported when the model leaves the fence untagged.
const FALLBACK_LANGUAGE: &str = "plaintext";

const SYSTEM_PROMPT: &str = "You are a code generation AI. A user will ask a question, and you will \
respond with a code snippet that answers the question. Enclose the code snippet in triple backticks, \
followed by the language of the code. For example:\n\n\
Question: How do I sort an array in Javascript?\n\n\
Response:\n\
```javascript\n\
const arr = [3, 1, 4, 1, 5, 9, 2, 6];\n\
arr.sort((a, b) => a - b);\n\
console.log(arr);\n\
```";

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+#.\-]*)[^\n]*\n(.*?)```").expect("code fence pattern is valid")
});

/// Generates code snippets by asking the model for a fenced block.
pub struct LlmCodeGeneration {
    llm: Arc<dyn LlmProvider>,
}

impl LlmCodeGeneration {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CodeGeneration for LlmCodeGeneration {
    async fn generate(&self, input: CodeQuestion) -> Result<CodeSnippet, CapabilityError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Question: {}", input.question)),
        ])
        .with_temperature(0.2)
        .with_max_tokens(2048);

        let raw = complete_text(self.llm.as_ref(), CAPABILITY, request).await?;
        parse_snippet(&raw)
    }
}

/// Pull the first fenced block out of a reply. Unfenced replies are taken
/// whole.
fn parse_snippet(raw: &str) -> Result<CodeSnippet, CapabilityError> {
    let (code, language) = match FENCE.captures(raw) {
        Some(caps) => {
            let language = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            (code.trim_end().to_string(), language.to_lowercase())
        }
        None => (raw.trim().to_string(), String::new()),
    };

    if code.trim().is_empty() {
        return Err(CapabilityError::MalformedResponse {
            capability: CAPABILITY,
            reason: "reply contained no code".into(),
        });
    }

    Ok(CodeSnippet {
        code_snippet: code,
        language: if language.is_empty() {
            FALLBACK_LANGUAGE.to_string()
        } else {
            language
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::ScriptedLlm;

    #[test]
    fn parses_tagged_fence() {
        let snippet = parse_snippet(
            "Here you go:\n```python\ndef add(a, b):\n    return a + b\n```\nEnjoy!",
        )
        .unwrap();
        assert_eq!(snippet.language, "python");
        assert_eq!(snippet.code_snippet, "def add(a, b):\n    return a + b");
    }

    #[test]
    fn keeps_symbolic_language_tags() {
        let snippet = parse_snippet("```C#\nConsole.WriteLine(1);\n```").unwrap();
        assert_eq!(snippet.language, "c#");
        let snippet = parse_snippet("```c++\nint main() {}\n```").unwrap();
        assert_eq!(snippet.language, "c++");
    }

    #[test]
    fn untagged_fence_falls_back() {
        let snippet = parse_snippet("```\nSELECT 1;\n```").unwrap();
        assert_eq!(snippet.language, "plaintext");
        assert_eq!(snippet.code_snippet, "SELECT 1;");
    }

    #[test]
    fn only_first_block_is_used() {
        let snippet =
            parse_snippet("```js\nconsole.log(1)\n```\nor\n```ts\nconsole.log(2)\n```").unwrap();
        assert_eq!(snippet.language, "js");
        assert_eq!(snippet.code_snippet, "console.log(1)");
    }

    #[test]
    fn unfenced_reply_is_taken_whole() {
        let snippet = parse_snippet("  print('hi')\n").unwrap();
        assert_eq!(snippet.code_snippet, "print('hi')");
        assert_eq!(snippet.language, "plaintext");
    }

    #[test]
    fn empty_block_is_malformed() {
        assert!(matches!(
            parse_snippet("```rust\n```"),
            Err(CapabilityError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn generate_uses_question() {
        let llm = Arc::new(ScriptedLlm::reply("```rust\nfn main() {}\n```"));
        let generator = LlmCodeGeneration::new(llm.clone());
        let snippet = generator
            .generate(CodeQuestion {
                question: "Write a function main".into(),
            })
            .await
            .unwrap();
        assert_eq!(snippet.language, "rust");
        assert!(llm.request(0).messages[1].content.ends_with("Write a function main"));
    }
}
