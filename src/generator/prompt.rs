use std::fmt::Write;

use crate::generator::GenerationContext;
use crate::github::ChangedFile;

/// Build the prompt sent to the model. The shape is fixed: rules first,
/// then whatever context exists for the target, then the file summaries
/// as a JSON array.
pub fn build_prompt(files: &[ChangedFile], context: &GenerationContext) -> String {
    let mut prompt = String::from(
        "You are an assistant that writes pull request titles and descriptions \
         from a file-level diff summary.\n\n\
         ## Rules\n\n\
         - The title follows the Conventional Commits format `type(scope): summary`, \
         where type is one of feat, fix, docs, style, refactor, perf, test, build, ci, chore.\n\
         - Write the title in the imperative mood, all lowercase, with no trailing period.\n\
         - The description is markdown with three sections: a summary of the change, \
         the key changes, and technical notes.\n\
         - Answer with a JSON object with exactly two string fields, `title` and \
         `description`, and nothing else.\n\n\
         ## Context\n\n",
    );

    if let Some(title) = &context.title {
        let _ = writeln!(prompt, "Current title: {title}");
    }
    if let Some(body) = &context.body {
        let _ = writeln!(prompt, "Current description:\n{body}");
    }
    if let (Some(base), Some(head)) = (&context.base, &context.head) {
        let _ = writeln!(prompt, "Branches: {base} -> {head}");
    }

    let _ = writeln!(prompt, "\n## Changes\n\n{} changed files:", files.len());
    let summaries =
        serde_json::to_string_pretty(files).unwrap_or_else(|_| "[]".to_string());
    let _ = writeln!(prompt, "\n{summaries}");

    prompt
}
