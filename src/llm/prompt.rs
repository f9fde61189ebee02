//! Versioned prompt templates for significance analysis and ADR drafting.

use chrono::{NaiveDate, Utc};

const FILE_PATHS_SLOT: &str = "{file_paths}";
const DIFF_SLOT: &str = "{diff_content}";
const DATE_SLOT: &str = "{current_date}";

/// Rendered in place of an empty file list.
pub const NO_FILES_MARKER: &str = "No files";

/// System instruction sent with analysis requests.
pub const ANALYSIS_SYSTEM_INSTRUCTION: &str =
    "You are an expert software architect analyzing code changes.";

/// System instruction sent with generation requests.
pub const GENERATION_SYSTEM_INSTRUCTION: &str =
    "You are an expert software architect writing Architectural Decision Records.";

/// Significance analysis prompt, version 1.
///
/// The model must answer with a single JSON object so the response can be
/// validated mechanically.
pub const ANALYSIS_PROMPT_V1: &str = r#"You are a principal engineer reviewing a change set. Decide whether the change is architecturally significant enough to deserve an Architectural Decision Record (ADR).

## Changed Files
{file_paths}

## Diff
{diff_content}

## What Counts as Significant
A change is architecturally significant when it does at least one of these:
- adds a new external dependency, library, framework or hosted service
- adds, removes or reconfigures infrastructure (databases, caches, queues, containers)
- changes a public API contract, a persisted data schema or a core data model
- changes authentication, authorization or another security mechanism
- changes a cross-cutting concern such as logging, observability or the CI/CD pipeline

Routine bug fixes, refactors that keep behavior, formatting and test-only changes are NOT significant.

## Output Format
Respond with ONLY a single JSON object. No preamble, no markdown fences, no trailing text.

{"is_significant": boolean, "reason": string, "confidence": number}

- `reason`: one sentence a developer can read at a glance. Required when `is_significant` is true; use an empty string otherwise.
- `confidence`: optional, between 0.0 and 1.0.
"#;

/// MADR drafting prompt, version 1.
pub const GENERATION_PROMPT_V1: &str = r#"You are a software architect documenting a decision that was just made in code. Write an Architectural Decision Record in the MADR format.

## Changed Files
{file_paths}

## Diff
{diff_content}

## Required Structure
Use exactly these headings, in this order:

# [Short, action-oriented title naming the problem and the chosen solution]

* Status: accepted
* Date: {current_date}

## Context and Problem Statement

[Two to four sentences: what problem does this change address?]

## Decision Drivers

* [driver, e.g. a constraint, requirement or force]
* [driver]

## Considered Options

* [chosen option]
* [alternative]

## Decision Outcome

Chosen option: "[chosen option]", because [justification].

### Consequences

* Good, because [benefit]
* Bad, because [drawback]

## More Information

[Relevant files, implementation notes, follow-up work]

## Rules
1. Keep the structure above; do not add or rename sections.
2. List at least two decision drivers and at least two considered options.
3. Name both benefits and drawbacks under Consequences.
4. Output ONLY the Markdown document. No preamble, no explanation, no code fences. Start with the `#` title line.
"#;

/// Render the analysis prompt for a change set.
pub fn format_analysis(file_paths: &[String], diff_text: &str) -> String {
    render(
        ANALYSIS_PROMPT_V1,
        &[
            (FILE_PATHS_SLOT, &file_list(file_paths)),
            (DIFF_SLOT, diff_text),
        ],
    )
}

/// Render the generation prompt, dated today (UTC).
pub fn format_generation(file_paths: &[String], diff_text: &str) -> String {
    format_generation_on(file_paths, diff_text, Utc::now().date_naive())
}

/// Render the generation prompt with an explicit date.
pub fn format_generation_on(file_paths: &[String], diff_text: &str, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d").to_string();
    render(
        GENERATION_PROMPT_V1,
        &[
            (FILE_PATHS_SLOT, &file_list(file_paths)),
            (DIFF_SLOT, diff_text),
            (DATE_SLOT, &date),
        ],
    )
}

fn file_list(file_paths: &[String]) -> String {
    if file_paths.is_empty() {
        NO_FILES_MARKER.to_string()
    } else {
        file_paths.join("\n")
    }
}

/// Substitute each slot once, scanning the template a single time.
///
/// Substituted text is never rescanned, so a diff that happens to contain
/// `{current_date}` is passed through verbatim.
fn render(template: &str, slots: &[(&str, &str)]) -> String {
    let extra: usize = slots.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut used = vec![false; slots.len()];
    let mut rest = template;

    'scan: while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        for (idx, (slot, value)) in slots.iter().enumerate() {
            if !used[idx] && rest.starts_with(slot) {
                out.push_str(value);
                rest = &rest[slot.len()..];
                used[idx] = true;
                continue 'scan;
            }
        }
        out.push('{');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}
