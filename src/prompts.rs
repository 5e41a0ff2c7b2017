//! Prompt templates for question answering and summarization.
//!
//! Every prompt the backend sees is assembled here so the wording can be
//! inspected and tested without a live endpoint.

use crate::config::ImageReferenceStyle;
use crate::content::PageImage;

/// Answer the model is told to give for off-topic questions.
pub const UNRELATED_ANSWER: &str = "This question is not related to the PDF.";

/// Shown when a question got a response without any candidate text.
pub const NO_ANSWER_FALLBACK: &str = "No response returned.";

/// Shown when a summary request got a response without any candidate text.
pub const NO_SUMMARY_FALLBACK: &str = "No summary returned.";

/// Transcript/summary text recorded for a failed dispatch.
pub const FAILURE_PLACEHOLDER: &str = "Something went wrong. Please try again.";

/// Question-answering prompt.
pub fn question_prompt(text: &str, images: &str, question: &str) -> String {
    format!(
        "You are an assistant that answers questions only based on the PDF content provided.\n\
Do not answer if the question is unrelated to the PDF.\n\
\n\
PDF Text: {text}\n\
\n\
Images (base64 or references): {images}\n\
\n\
User Question: {question}\n\
\n\
If the question is related to the PDF, give a clear answer.\n\
If the question is unrelated, respond with \"{UNRELATED_ANSWER}\""
    )
}

/// Summarization prompt bounded by `word_limit` words.
pub fn summary_prompt(text: &str, images: &str, word_limit: u32) -> String {
    format!(
        "Shorten and summarize the following PDF content, including images references, while retaining meaning.\n\
Text: {text}\n\
\n\
Images (base64 or references): {images}\n\
\n\
Give a concise summary with a maximum of {word_limit} words. Provide only one answer."
    )
}

/// One reference per page, newline-separated.
pub fn image_references(images: &[PageImage], style: ImageReferenceStyle) -> String {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| match style {
            ImageReferenceStyle::DataUri => img.to_data_uri(),
            ImageReferenceStyle::Placeholder => format!(
                "[page {}: {}x{} PNG, {} bytes]",
                i + 1,
                img.width,
                img.height,
                img.png.len()
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
