//! Prompt for turning a job search query into a semantic query plus filters

/// Job levels present in the index
pub const JOB_LEVELS: &[&str] = &["Senior Level", "Mid Level", "Entry Level", "Internship"];

/// Representative job categories
pub const JOB_CATEGORIES: &[&str] = &[
    "Software Engineering",
    "Data and Analytics",
    "Design and UX",
    "Sales",
    "Project Management",
    "Advertising and Marketing",
    "General",
];

/// Few-shot examples: (query, expected JSON)
const EXAMPLES: &[(&str, &str)] = &[
    (
        "Senior Python developer jobs in San Francisco",
        r#"{"semantic_query": "Python developer", "filters": {"Level": "Senior Level", "location": "San Francisco"}}"#,
    ),
    (
        "Looking for data scientist positions at Google",
        r#"{"semantic_query": "data scientist", "filters": {"category": "Data and Analytics", "company": "Google"}}"#,
    ),
    (
        "Entry level frontend developer with React experience",
        r#"{"semantic_query": "frontend developer React", "filters": {"Level": "Entry Level", "category": "Software Engineering"}}"#,
    ),
    (
        "jobs in New York",
        r#"{"semantic_query": "jobs", "filters": {"location": "New York"}}"#,
    ),
    (
        "software engineer in Bay Area",
        r#"{"semantic_query": "software engineer", "filters": {"category": "Software Engineering", "location": "San Francisco"}}"#,
    ),
    (
        "data analyst jobs in Asia",
        r#"{"semantic_query": "data analyst", "filters": {"category": "Data and Analytics", "location": "India"}}"#,
    ),
    (
        "senior developer positions in Europe",
        r#"{"semantic_query": "developer", "filters": {"Level": "Senior Level", "location": "Europe"}}"#,
    ),
    (
        "data scientist jobs posted in last 30 days",
        r#"{"semantic_query": "data scientist", "filters": {"category": "Data and Analytics", "date_range": {"days": 30}}}"#,
    ),
    (
        "recent python developer positions",
        r#"{"semantic_query": "python developer", "filters": {"category": "Software Engineering", "date_range": {"days": 7}}}"#,
    ),
    (
        "jobs from last week",
        r#"{"semantic_query": "jobs", "filters": {"date_range": {"days": 7}}}"#,
    ),
    (
        "python jobs posted this year",
        r#"{"semantic_query": "python", "filters": {"category": "Software Engineering", "date_range": {"days": 365}}}"#,
    ),
    (
        "senior engineer positions from last 6 months",
        r#"{"semantic_query": "senior engineer", "filters": {"Level": "Senior Level", "date_range": {"days": 180}}}"#,
    ),
];

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn examples() -> String {
    EXAMPLES
        .iter()
        .map(|(query, json)| format!("Query: {}\n{}", quote(query), json))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// JSON-quote user text so stray quotes cannot break out of the prompt framing
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// Build the query parsing prompt
pub fn build_parsing_prompt(query: &str) -> String {
    format!(
        r#"You parse job search queries. Split the user's query into a semantic search intent and structured filters.

User Query: {query}

Job levels:
{levels}

Job categories (examples):
{categories}

Rules:
1. semantic_query holds the skills, roles and technologies the user is looking for. It must never be empty.
2. Only add a filter when the query states or strongly implies it. Supported filters: category, Level, company, location, date_range.
3. Industry words (IT, sales, marketing, ...) map to the closest category.
4. Broad locations become terms that match stored locations:
   - "Bay Area" -> "San Francisco" or "California"
   - "Asia" -> "Asia", "India" or "China"
   - "Europe" -> "Europe" or a specific country
5. Time expressions become a day count in date_range.days:
   - "recent", "latest", "last week" -> 7
   - "last 2 weeks" -> 14
   - "last month", "last 30 days" -> 30
   - "last 3 months" -> 90
   - "last 6 months" -> 180
   - "this year", "last year" -> 365
   - an explicit year (e.g. "2024") -> days from January 1 of that year until today
   - no time expression -> omit date_range

Output format (JSON only):
{{"semantic_query": "...", "filters": {{"category": "... or null", "Level": "... or null", "company": "... or null", "location": "... or null", "date_range": {{"days": <number or null>}}}}}}

Examples:

{examples}

Parse the user's query now. Reply with the JSON object and nothing else."#,
        query = quote(query),
        levels = bullet_list(JOB_LEVELS),
        categories = bullet_list(JOB_CATEGORIES),
        examples = examples(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_query_and_vocabulary() {
        let prompt = build_parsing_prompt("ML engineer \"remote\"");
        assert!(prompt.contains(r#"User Query: "ML engineer \"remote\"""#));
        assert!(prompt.contains("- Internship"));
        assert!(prompt.contains("- Advertising and Marketing"));
        assert!(prompt.contains("\"last 6 months\" -> 180"));
    }

    #[test]
    fn test_examples_are_valid_json() {
        for (_, json) in EXAMPLES {
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert!(value["semantic_query"].as_str().is_some_and(|s| !s.is_empty()));
        }
    }
}
