use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// Get the path to the prompts directory
fn prompts_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("prompts")
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    // if the template_file doesn't exist, try to load it from the prompts directory
    let file_path = if !template_path.exists() {
        prompts_dir().join(template_path)
    } else {
        template_path
    };

    let template_content = fs::read_to_string(file_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

/// One quoted block in a comparison or summary prompt: the display name
/// of the agent being quoted and the text attributed to it.
#[derive(Debug, Clone, Serialize)]
pub struct QuotedResponse {
    pub name: String,
    pub content: String,
}

/// Context for `comparison.md`: one analyst's view of every first-stage
/// response, including its own.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonContext {
    pub user_query: String,
    pub agent_name: String,
    pub responses: Vec<QuotedResponse>,
}

/// Context for `summarizer.md`: the completed analyses to be condensed
/// into a table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryContext {
    pub user_query: String,
    pub analyses: Vec<QuotedResponse>,
}

pub fn comparison_prompt(context: &ComparisonContext) -> Result<String, TeraError> {
    load_prompt_file("comparison.md", context)
}

pub fn summarizer_prompt(context: &SummaryContext) -> Result<String, TeraError> {
    load_prompt_file("summarizer.md", context)
}
