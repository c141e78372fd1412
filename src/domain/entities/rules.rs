use serde::{Deserialize, Serialize};

/// Per-deployment instructions that constrain every generated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Opening line describing who the assistant is.
    pub role: String,
    /// Subject the assistant is restricted to, if any.
    pub domain: Option<String>,
    /// Exact reply when the answer cannot be found in the context.
    pub not_found_refusal: String,
    /// Exact reply when the context is empty, irrelevant, or off-domain.
    pub out_of_scope_refusal: String,
    /// Line appended verbatim to every answer.
    pub call_to_action: Option<String>,
    pub extra_rules: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            role: "You are an intelligent medical assistant for a multi-clinic management system. \
                   You help clinic staff and patients by providing accurate information based on \
                   uploaded medical documents and clinic resources."
                .to_string(),
            domain: Some("the uploaded medical documents and clinical information".to_string()),
            not_found_refusal: "I don't have that specific information in the uploaded documents. \
                                Please consult with your healthcare provider or clinic staff for more details."
                .to_string(),
            out_of_scope_refusal: "I can only answer questions based on the uploaded medical documents \
                                   and clinical information in our system."
                .to_string(),
            call_to_action: None,
            extra_rules: vec![
                "Provide clear, professional, and accurate responses.".to_string(),
                "Never make up information or give advice beyond what is in the documents."
                    .to_string(),
            ],
        }
    }
}
