use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::ProblemFetcher;
use crate::markdown::assemble;
use crate::notebook::Notebook;
use crate::problem::{Problem, SearchHit};
use crate::selection::{SelectedProblem, Selection};

#[derive(Debug)]
pub struct CrawlReport {
    pub problems: Vec<Problem>,
    pub skipped: Vec<(u32, Error)>,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub query: String,
    pub hits: Result<Vec<SearchHit>>,
}

/// Fetches `ids` one after another. A failed id is logged and skipped after
/// `failure_delay`; the rest of the batch still runs.
pub async fn crawl_all(
    fetcher: &ProblemFetcher,
    ids: &[u32],
    failure_delay: Duration,
) -> CrawlReport {
    let mut problems = Vec::with_capacity(ids.len());
    let mut skipped = vec![];

    for &id in ids {
        match fetcher.fetch_problem(id).await {
            Ok(problem) => {
                info!(id, title = %problem.title, tier = %problem.tier.name, "crawled");
                problems.push(problem);
            }
            Err(e) => {
                warn!(id, error = %e, "skipping problem");
                skipped.push((id, e));
                tokio::time::sleep(failure_delay).await;
            }
        }
    }

    CrawlReport { problems, skipped }
}

pub struct Controller {
    fetcher: Arc<ProblemFetcher>,
    selection: Selection,
    markdown: Option<String>,
    status: String,
    failure_delay: Duration,
    debounce: Duration,
    pending_search: Option<JoinHandle<()>>,
    search_tx: mpsc::UnboundedSender<SearchOutcome>,
    search_rx: mpsc::UnboundedReceiver<SearchOutcome>,
}

impl Controller {
    pub fn new(fetcher: ProblemFetcher, config: &Config) -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            selection: Selection::default(),
            markdown: None,
            status: String::new(),
            failure_delay: config.failure_delay(),
            debounce: config.debounce(),
            pending_search: None,
            search_tx,
            search_rx,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Markdown produced by the last successful crawl.
    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }

    pub fn add(&mut self, problem: SelectedProblem) -> Result<()> {
        self.selection.add(problem)
    }

    /// Schedules a search once input has been idle for the debounce period,
    /// cancelling any search still waiting. Returns whether one was scheduled.
    pub fn search_input(&mut self, query: &str) -> bool {
        self.cancel_search();

        let query = query.trim().to_string();
        if query.is_empty() {
            return false;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.search_tx.clone();
        let debounce = self.debounce;
        self.pending_search = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let hits = fetcher.search(&query).await;
            let _ = tx.send(SearchOutcome { query, hits });
        }));
        true
    }

    /// Waits for the next finished search.
    pub async fn next_search(&mut self) -> Option<SearchOutcome> {
        self.search_rx.recv().await
    }

    fn cancel_search(&mut self) {
        if let Some(handle) = self.pending_search.take() {
            handle.abort();
        }
        // results nobody read yet belong to an older query
        while self.search_rx.try_recv().is_ok() {}
    }

    pub async fn crawl(&mut self) -> Result<CrawlReport> {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return Err(Error::EmptySelection);
        }

        self.markdown = None;
        self.status = format!("fetching {} problem(s)...", ids.len());
        let report = crawl_all(&self.fetcher, &ids, self.failure_delay).await;

        if report.problems.is_empty() {
            self.status = "no problem could be processed".into();
        } else {
            let assembled = assemble(&report.problems);
            self.store_markdown(&report, assembled)?;
        }
        Ok(report)
    }

    fn store_markdown(&mut self, report: &CrawlReport, assembled: Result<String>) -> Result<()> {
        match assembled {
            Ok(markdown) => {
                self.markdown = Some(markdown);
                self.status = match report.skipped.len() {
                    0 => format!("fetched {} problem(s)", report.problems.len()),
                    n => format!(
                        "fetched {} problem(s), skipped {n}",
                        report.problems.len()
                    ),
                };
                Ok(())
            }
            Err(e) => {
                self.status = format!("failed to assemble markdown: {e}");
                Err(e)
            }
        }
    }

    pub fn generate(&self) -> Result<Notebook> {
        self.markdown
            .as_deref()
            .map(Notebook::from_markdown)
            .ok_or(Error::NothingToGenerate)
    }

    pub fn clear(&mut self) {
        self.cancel_search();
        self.selection.clear();
        self.markdown = None;
        self.status.clear();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel_search();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn archive() -> MockServer {
        let server = MockServer::start().await;
        let page = fs::read_to_string("fixtures/1000.html").unwrap();
        for id in [1, 2] {
            Mock::given(method("GET"))
                .and(path(format!("/problem/{id}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(page.replace("A+B", &format!("Problem {id}"))),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/problem/999999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/problem/show"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"level": 6}"#))
            .mount(&server)
            .await;
        server
    }

    fn controller(server: &MockServer) -> Controller {
        let config = Config {
            archive_origin: server.uri(),
            metadata_origin: server.uri(),
            failure_delay_ms: 0,
            debounce_ms: 50,
            ..Default::default()
        };
        Controller::new(ProblemFetcher::from_config(&config).unwrap(), &config)
    }

    #[tokio::test]
    async fn crawl_should_skip_failures_and_keep_order() {
        let server = archive().await;
        let mut controller = controller(&server);
        for id in [1, 999999, 2] {
            controller.add(SelectedProblem::untitled(id)).unwrap();
        }

        let report = controller.crawl().await.unwrap();
        let ids: Vec<_> = report.problems.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(report.problems[0].title, "Problem 1");
        assert_eq!(report.problems[1].tier.name, "Silver V");
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0],
            (999999, Error::FetchFailure { status: 404, .. })
        ));
        assert_eq!(controller.status(), "fetched 2 problem(s), skipped 1");

        let notebook = controller.generate().unwrap();
        assert_eq!(notebook.markdown_cells().count(), 2);
    }

    #[tokio::test]
    async fn crawl_with_no_successes_should_leave_nothing_to_generate() {
        let server = archive().await;
        let mut controller = controller(&server);
        controller.add(SelectedProblem::untitled(999999)).unwrap();

        let report = controller.crawl().await.unwrap();
        assert!(report.problems.is_empty());
        assert_eq!(controller.status(), "no problem could be processed");
        assert!(matches!(controller.generate(), Err(Error::NothingToGenerate)));
    }

    #[tokio::test]
    async fn empty_selection_should_not_crawl() {
        let server = archive().await;
        let mut controller = controller(&server);
        assert!(matches!(controller.crawl().await, Err(Error::EmptySelection)));
    }

    #[tokio::test]
    async fn clear_should_reset_state() {
        let server = archive().await;
        let mut controller = controller(&server);
        controller.add(SelectedProblem::untitled(1)).unwrap();
        controller.crawl().await.unwrap();
        assert!(controller.markdown().is_some());

        controller.clear();
        assert!(controller.selection().is_empty());
        assert!(controller.markdown().is_none());
        assert_eq!(controller.status(), "");
        controller.add(SelectedProblem::untitled(1)).unwrap();
    }

    #[tokio::test]
    async fn assembly_failure_should_update_status() {
        let server = archive().await;
        let mut controller = controller(&server);
        let report = CrawlReport {
            problems: vec![],
            skipped: vec![],
        };
        let failed = Err(Error::Template(askama::Error::Fmt(std::fmt::Error)));

        assert!(controller.store_markdown(&report, failed).is_err());
        assert!(controller.status().starts_with("failed to assemble markdown: "));
        assert!(controller.markdown().is_none());
    }

    #[tokio::test]
    async fn unread_results_should_be_dropped_on_new_input() {
        let server = MockServer::start().await;
        for query in ["1000", "1001"] {
            Mock::given(method("GET"))
                .and(path("/api/v3/search/problem"))
                .and(query_param("query", query))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "items": [{ "problemId": query.parse::<u32>().unwrap(), "titleKo": query, "level": 1 }]
                })))
                .mount(&server)
                .await;
        }

        let mut controller = controller(&server);
        assert!(controller.search_input("1000"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(controller.search_input("1001"));

        let outcome = controller.next_search().await.unwrap();
        assert_eq!(outcome.query, "1001");
        assert_eq!(outcome.hits.unwrap()[0].id, 1001);
    }

    #[tokio::test]
    async fn search_input_should_debounce() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/search/problem"))
            .and(query_param("query", "a+b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "problemId": 1000, "titleKo": "A+B", "level": 1 }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/search/problem"))
            .and(query_param("query", "a"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut controller = controller(&server);
        assert!(controller.search_input("a"));
        assert!(controller.search_input("a+b"));
        assert!(!controller.search_input("  "));
        assert!(controller.search_input("a+b"));

        let outcome = controller.next_search().await.unwrap();
        assert_eq!(outcome.query, "a+b");
        let hits = outcome.hits.unwrap();
        assert_eq!(hits[0].id, 1000);
        assert_eq!(hits[0].tier.name, "Bronze V");

        controller.add(hits[0].clone().into()).unwrap();
        assert_eq!(controller.selection().ids(), [1000]);
    }
}
