//! End-to-end pipeline tests against scripted collaborators

use chrono::{Duration as ChronoDuration, Utc};
use jobsearch::config::Config;
use jobsearch::filter::FilterField;
use jobsearch::oracle::{MockOracle, OracleError};
use jobsearch::query::ParsedQuery;
use jobsearch::retrieval::{Channel, InMemoryEngine, JobRecord, RetrievedItem};
use jobsearch::{AnswerSource, ErrorKind, SearchService};
use std::sync::Arc;
use std::time::Duration;

const SF_QUERY: &str = "Senior Python developer jobs in San Francisco";
const SF_PARSE: &str = r#"```json
{"semantic_query": "Python developer", "filters": {"Level": "Senior Level", "location": "San Francisco", "company": null}}
```"#;

fn chunk(point: &str, job: &str, title: &str, level: &str, location: &str) -> RetrievedItem {
    let record = JobRecord {
        job_title: Some(title.to_string()),
        company: Some(format!("{} Inc", job)),
        category: Some("Software Engineering".to_string()),
        location: Some(location.to_string()),
        job_level: Some(level.to_string()),
        publication_date: Some("2025-05-01T00:00:00Z".to_string()),
        text: format!("{} working on Python services.", title),
        ..JobRecord::default()
    };
    RetrievedItem::new(point, job, 0.0, record)
}

/// Six matching chunks across four jobs, plus one distractor the filters exclude
fn sf_engine() -> InMemoryEngine {
    let p1 = chunk("p1", "J1", "Senior Python Engineer", "Senior Level", "San Francisco, CA");
    let p2 = chunk("p2", "J1", "Senior Python Engineer", "Senior Level", "San Francisco, CA");
    let p3 = chunk("p3", "J2", "Python Backend Lead", "Senior Level", "San Francisco");
    let p4 = chunk("p4", "J3", "Senior Data Engineer", "Senior Level", "South San Francisco");
    let p5 = chunk("p5", "J3", "Senior Data Engineer", "Senior Level", "South San Francisco");
    let p6 = chunk("p6", "J4", "Staff Python Developer", "Senior Level", "San Francisco");
    let p7 = chunk("p7", "J5", "Python Developer", "Mid Level", "Austin, TX");

    InMemoryEngine::new()
        .with_ranking(
            Channel::Sparse,
            vec![p7, p1.clone(), p3.clone(), p4, p2.clone(), p6.clone()],
        )
        .with_ranking(Channel::Dense, vec![p3, p1, p5, p6, p2])
}

fn service(oracle: Arc<MockOracle>, engine: Arc<InMemoryEngine>, config: &Config) -> SearchService {
    SearchService::new(oracle, engine, config).unwrap()
}

#[tokio::test]
async fn test_senior_python_san_francisco() {
    let oracle = Arc::new(
        MockOracle::new()
            .reply(SF_PARSE)
            .reply("Three senior Python roles are open in San Francisco."),
    );
    let engine = Arc::new(sf_engine());

    let outcome = service(oracle.clone(), engine.clone(), &Config::default())
        .search(SF_QUERY, Some(3))
        .await
        .unwrap();

    assert_eq!(outcome.parsed.semantic_query, "Python developer");
    assert_eq!(
        outcome.parsed.filters.get(FilterField::Level),
        Some("Senior Level")
    );
    assert_eq!(
        outcome.parsed.filters.get(FilterField::Location),
        Some("San Francisco")
    );

    let ids: Vec<&str> = outcome.results.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, vec!["J1", "J2", "J4"]);

    let ranks: Vec<usize> = outcome.results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(outcome
        .results
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));

    let expected_top = 1.0 / 61.0 + 1.0 / 62.0;
    assert!((outcome.results[0].score - expected_top).abs() < 1e-6);
    assert!(outcome.results.iter().all(|r| r.job_level == "Senior Level"));

    assert_eq!(
        outcome.answer,
        "Three senior Python roles are open in San Francisco."
    );
    assert_eq!(outcome.answer_source, AnswerSource::Oracle);
    assert_eq!(engine.calls(), 2);

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Job ID: J4"));
    assert!(!prompts[1].contains("Job ID: J3"));
    assert!(!prompts[1].contains("Austin"));
}

#[tokio::test]
async fn test_synthesis_oracle_down_uses_fallback() {
    let oracle = Arc::new(
        MockOracle::new()
            .reply(SF_PARSE)
            .fail(OracleError::Transport("connection refused".to_string())),
    );

    let outcome = service(oracle, Arc::new(sf_engine()), &Config::default())
        .search(SF_QUERY, Some(3))
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(
        outcome.answer,
        "Found 3 jobs matching 'Senior Python developer jobs in San Francisco'. The results are sorted by relevance."
    );
    assert_eq!(outcome.answer_source, AnswerSource::Fallback);
}

#[tokio::test]
async fn test_single_result_fallback() {
    let oracle = Arc::new(MockOracle::new().reply(SF_PARSE));

    let outcome = service(oracle, Arc::new(sf_engine()), &Config::default())
        .search(SF_QUERY, Some(1))
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(
        outcome.answer,
        "Found 1 job matching 'Senior Python developer jobs in San Francisco'. Please review the results below."
    );
}

#[tokio::test]
async fn test_empty_retrieval_skips_synthesis() {
    let oracle = Arc::new(
        MockOracle::new()
            .reply(r#"{"semantic_query": "underwater welder", "filters": {}}"#)
            .reply("should never be used"),
    );
    let engine = Arc::new(InMemoryEngine::new());

    let outcome = service(oracle.clone(), engine, &Config::default())
        .search("underwater welder", None)
        .await
        .unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.answer, "No jobs found matching 'underwater welder'.");
    assert_eq!(outcome.answer_source, AnswerSource::Fallback);
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_filters_excluding_everything_yield_zero_results() {
    let oracle = Arc::new(MockOracle::new().reply(
        r#"{"semantic_query": "Python developer", "filters": {"location": "Reykjavik"}}"#,
    ));

    let outcome = service(oracle.clone(), Arc::new(sf_engine()), &Config::default())
        .search("python jobs in Reykjavik", None)
        .await
        .unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(
        outcome.answer,
        "No jobs found matching 'python jobs in Reykjavik'."
    );
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_unparseable_understanding_falls_back_to_raw_query() {
    let oracle = Arc::new(MockOracle::new().reply("Sorry, I can't do that."));

    let outcome = service(oracle, Arc::new(sf_engine()), &Config::default())
        .search("python developer", Some(5))
        .await
        .unwrap();

    assert_eq!(outcome.parsed, ParsedQuery::verbatim("python developer"));
    // Unfiltered, so the distractor job is back in play
    assert_eq!(outcome.results.len(), 5);
    assert!(outcome.results.iter().any(|r| r.job_id == "J5"));
    assert_eq!(outcome.answer_source, AnswerSource::Fallback);
}

#[tokio::test]
async fn test_understanding_oracle_down_falls_back_to_raw_query() {
    let oracle = Arc::new(MockOracle::new());

    let outcome = service(oracle.clone(), Arc::new(sf_engine()), &Config::default())
        .search(SF_QUERY, Some(2))
        .await
        .unwrap();

    assert_eq!(outcome.parsed.semantic_query, SF_QUERY);
    assert!(outcome.parsed.filters.is_empty());
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn test_retrieval_failure_is_fatal() {
    let oracle = Arc::new(MockOracle::new().reply(SF_PARSE).reply("unused"));
    let engine = Arc::new(sf_engine().failing(Channel::Dense, "connection refused"));

    let err = service(oracle.clone(), engine, &Config::default())
        .search(SF_QUERY, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RetrievalUnavailable);
    assert_eq!(err.kind().as_str(), "retrieval_unavailable");
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_retrieval_timeout_is_fatal() {
    let mut config = Config::default();
    config.engine.timeout = "50ms".to_string();

    let oracle = Arc::new(MockOracle::new().reply(SF_PARSE));
    let engine = Arc::new(sf_engine().with_delay(Duration::from_millis(500)));

    let err = service(oracle, engine, &config)
        .search(SF_QUERY, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RetrievalUnavailable);
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let oracle = Arc::new(MockOracle::new());
    let engine = Arc::new(sf_engine());
    let service = service(oracle.clone(), engine.clone(), &Config::default());

    for (query, top) in [("a", None), ("  ", None), ("python", Some(0)), ("python", Some(50))] {
        let err = service.search(query, top).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.kind().is_client_error());
    }

    let long_query = "python ".repeat(30);
    let err = service.search(&long_query, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert_eq!(oracle.calls(), 0);
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_relative_date_filter_applied() {
    let now = Utc::now();
    let dated = |point: &str, job: &str, days_ago: i64| {
        let mut item = chunk(point, job, "Data Scientist", "Mid Level", "Remote");
        item.payload.publication_date = Some((now - ChronoDuration::days(days_ago)).to_rfc3339());
        item
    };
    let engine = Arc::new(InMemoryEngine::new().with_ranking(
        Channel::Dense,
        vec![
            dated("p1", "OLD", 90),
            dated("p2", "NEW", 5),
            dated("p3", "MID", 29),
        ],
    ));
    let oracle = Arc::new(MockOracle::new().reply(
        r#"{"semantic_query": "data scientist", "filters": {"category": "null", "date_range": {"days": 30}}}"#,
    ));

    let outcome = service(oracle, engine, &Config::default())
        .search("data scientist jobs posted in last 30 days", None)
        .await
        .unwrap();

    let range = outcome.parsed.filters.date_range().copied().unwrap();
    assert!(range.gt.is_none() && range.lt.is_none());
    let (gte, lte) = (range.gte.unwrap(), range.lte.unwrap());
    assert_eq!(lte - gte, ChronoDuration::days(30));

    let ids: Vec<&str> = outcome.results.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, vec!["NEW", "MID"]);
}
