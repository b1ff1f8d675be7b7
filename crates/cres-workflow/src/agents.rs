//! LLM agents used by the workflow: answer generation, completeness
//! grading, question rewriting, structured metric extraction

use serde::Deserialize;
use std::sync::Arc;

use cres_core::{generate_structured, CompanyMetric, Document, LlmProvider, Result};

const ANSWER_SYSTEM_PROMPT: &str = "## Role
You are expert in analysis of financial statements and annual reports.
Generate a direct and well-structured answer to the question, using only the provided sources.

### Guidelines:
1. **Synthesize** details if multiple sources agree.
2. **Prioritize higher credibility scores** if sources conflict.
3. **Prioritize official sources, such as official websites, annual reports, etc.**
4. **Cite sources explicitly** using *(According to [Title]( URL ))*.
5. **Ensure clarity, accuracy, and neutrality.**

Now generate the answer.";

const METRIC_SYSTEM_PROMPT: &str = "Generate a direct and well-structured answer to the question, using only the provided sources. Put full answer in the comment field.
Put the extracted particular value in the value field. For numeric values write them in the full numeric form (120 000 000 but not 120 million).

### Guidelines:
1. **Synthesize** details if multiple sources agree.
2. **Prioritize higher credibility scores** if sources conflict.
3. **Prioritize official sources, such as official websites, annual reports, etc.**
4. **Cite sources explicitly** using *(According to [Title]( URL ))*.
5. **Ensure clarity, accuracy, and neutrality.**

Respond with a JSON object: {\"value\": <number or string>, \"comment\": <string>}";

const GRADER_SYSTEM_PROMPT: &str = "You are a grader assessing whether the provided answer fully addresses the question, including details and accuracy.
If the answer is sufficient, return true. If not, return false and provide a specific follow-up question to the web to fill missing information.

Respond with a JSON object: {\"binary_score\": <bool>, \"follow_up_question\": <string or null>}";

const REWRITER_SYSTEM_PROMPT: &str = "##ROLE
You are expert in company research and analysis.

Based on provided documents and question with follow-up question - refine the question to be more informative and specific.
Also translate question to the language of the documents.

Respond with a JSON object: {\"updated_query\": <string>}";

/// Render evidence documents into prompt text
fn render_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                "[{title}]({url}) (credibility: {credibility:.2})\n{text}",
                title = doc.title,
                url = doc.url,
                credibility = doc.credibility.unwrap_or(0.0),
                text = doc.text,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Generates a free-text answer from question and evidence
pub struct AnswerAgent<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> AnswerAgent<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, question: &str, documents: &[Document]) -> Result<String> {
        let user_prompt = format!(
            "Question: {}\nDocuments: {}",
            question,
            render_documents(documents)
        );
        self.llm.generate(ANSWER_SYSTEM_PROMPT, &user_prompt).await
    }
}

/// Generates a structured company-metric answer from question and evidence
pub struct MetricAgent<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> MetricAgent<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, question: &str, documents: &[Document]) -> Result<CompanyMetric> {
        let user_prompt = format!(
            "Question: {}\nDocuments: {}",
            question,
            render_documents(documents)
        );
        generate_structured(self.llm.as_ref(), METRIC_SYSTEM_PROMPT, &user_prompt).await
    }
}

/// Outcome of a completeness grading pass
#[derive(Debug, Clone)]
pub struct CompletenessGrade {
    pub complete: bool,
    /// Populated only when the answer is incomplete
    pub follow_up_question: Option<String>,
}

#[derive(Deserialize)]
struct GradeOutput {
    binary_score: bool,
    #[serde(default)]
    follow_up_question: Option<String>,
}

/// Judges whether a draft answer fully addresses the question
pub struct CompletenessGrader<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> CompletenessGrader<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    pub async fn grade(&self, question: &str, answer: &str) -> Result<CompletenessGrade> {
        let user_prompt = format!(
            "User question: \n\n {} \n\n LLM generation: {}",
            question, answer
        );
        let output: GradeOutput =
            generate_structured(self.llm.as_ref(), GRADER_SYSTEM_PROMPT, &user_prompt).await?;

        Ok(CompletenessGrade {
            complete: output.binary_score,
            follow_up_question: if output.binary_score {
                None
            } else {
                output.follow_up_question
            },
        })
    }
}

#[derive(Deserialize)]
struct RewriteOutput {
    updated_query: String,
}

/// Merges the question, the grader's follow-up and a document sample into a
/// refined query, translated to the dominant language of the sample
pub struct QuestionRewriter<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> QuestionRewriter<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Only the first in-scope document is supplied as the language and
    /// context anchor, which bounds the prompt size.
    pub async fn rewrite(
        &self,
        question: &str,
        follow_up_question: &str,
        first_document: Option<&Document>,
    ) -> Result<String> {
        let sample = match first_document {
            Some(doc) => render_documents(std::slice::from_ref(doc)),
            None => String::new(),
        };
        let user_prompt = format!(
            "Question: {} \nFollow-up question: {} \nDocument: {}",
            question, follow_up_question, sample
        );
        let output: RewriteOutput =
            generate_structured(self.llm.as_ref(), REWRITER_SYSTEM_PROMPT, &user_prompt).await?;
        Ok(output.updated_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct ScriptedLlm {
        json: serde_json::Value,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            Ok(format!("answer for: {}", user.lines().next().unwrap_or("")))
        }

        async fn generate_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value> {
            Ok(self.json.clone())
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_grader_clears_follow_up_when_complete() {
        // A complete grade must not carry a follow-up even if the model sent one
        let llm = Arc::new(ScriptedLlm {
            json: json!({"binary_score": true, "follow_up_question": "spurious"}),
        });
        let grade = CompletenessGrader::new(llm)
            .grade("q", "a")
            .await
            .unwrap();
        assert!(grade.complete);
        assert!(grade.follow_up_question.is_none());
    }

    #[tokio::test]
    async fn test_grader_incomplete_keeps_follow_up() {
        let llm = Arc::new(ScriptedLlm {
            json: json!({"binary_score": false, "follow_up_question": "What year?"}),
        });
        let grade = CompletenessGrader::new(llm)
            .grade("q", "a")
            .await
            .unwrap();
        assert!(!grade.complete);
        assert_eq!(grade.follow_up_question.as_deref(), Some("What year?"));
    }

    #[tokio::test]
    async fn test_metric_agent_parses_numeric_and_text_values() {
        let llm = Arc::new(ScriptedLlm {
            json: json!({"value": 120000000, "comment": "From the annual report"}),
        });
        let metric = MetricAgent::new(llm).generate("q", &[]).await.unwrap();
        assert_eq!(metric.value, cres_core::MetricValue::Number(120000000.0));

        let llm = Arc::new(ScriptedLlm {
            json: json!({"value": "not disclosed", "comment": "No public figure"}),
        });
        let metric = MetricAgent::new(llm).generate("q", &[]).await.unwrap();
        assert_eq!(
            metric.value,
            cres_core::MetricValue::Text("not disclosed".to_string())
        );
    }

    #[tokio::test]
    async fn test_rewriter_returns_updated_query() {
        let llm = Arc::new(ScriptedLlm {
            json: json!({"updated_query": "Chiffre d'affaires d'Acme 2023"}),
        });
        let doc = Document::web("https://acme.example.fr", "Rapport", "texte en français");
        let updated = QuestionRewriter::new(llm)
            .rewrite("Acme revenue", "Which fiscal year?", Some(&doc))
            .await
            .unwrap();
        assert_eq!(updated, "Chiffre d'affaires d'Acme 2023");
    }

    #[test]
    fn test_render_documents_includes_credibility_and_url() {
        let doc = Document::web("https://a.example.com", "Report", "text").with_credibility(0.75);
        let rendered = render_documents(&[doc]);
        assert!(rendered.contains("https://a.example.com"));
        assert!(rendered.contains("0.75"));
    }
}
