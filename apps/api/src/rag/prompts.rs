// Answer synthesis prompt templates.
// All prompts for the RAG module are defined here.

/// Separates retrieved chunks inside the grounding context.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

pub const ANSWER_SYSTEM: &str = "\
You are an assistant that answers questions about a resume based on the context provided. \
Answer based only on this context. \
If the context does not contain the answer, say that the resume does not mention it.";

pub const RESUME_QUESTION_PREFIX: &str =
    "This is a question about the specific resume we have in our database: ";

/// Builds the user prompt. `context` and `query` are inserted verbatim.
pub fn answer_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are a helpful assistant. Answer the following query based only on the provided resume context.

**Resume Context:**
{context}

**Query:**
{RESUME_QUESTION_PREFIX}{query}

**Answer:**"#
    )
}

/// Fixed question used by resume analysis to pull out skills.
pub const SKILLS_QUESTION: &str = "Extract all technical skills, soft skills, and programming \
languages from the resume. List them as a comma-separated string.";

/// Fixed question used by resume analysis to summarize experience.
pub const EXPERIENCE_QUESTION: &str =
    "Summarize the candidate's work experience in 2-3 sentences.";
