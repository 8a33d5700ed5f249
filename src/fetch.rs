use std::collections::HashMap;

use derive_builder::Builder;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::MarkdownExtractor;
use crate::markup::Element;
use crate::problem::{Example, Problem, SearchHit};
use crate::tier::TierInfo;

const SAMPLE_INPUT_PREFIX: &str = "sample-input-";
const SAMPLE_OUTPUT_PREFIX: &str = "sample-output-";

static TITLE: Lazy<Selector> = Lazy::new(|| selector("#problem_title"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("#problem_description"));
static INPUT: Lazy<Selector> = Lazy::new(|| selector("#problem_input"));
static OUTPUT: Lazy<Selector> = Lazy::new(|| selector("#problem_output"));
static SAMPLE_INPUTS: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="sample-input-"]"#));
static SAMPLE_OUTPUTS: Lazy<Selector> = Lazy::new(|| selector(r#"[id^="sample-output-"]"#));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Fetches problems from the archive and tiers from the metadata service,
/// optionally through a relay endpoint.
#[derive(Debug, Clone, Builder)]
pub struct ProblemFetcher {
    client: Client,
    archive_origin: Url,
    metadata_origin: Url,
    #[builder(default)]
    relay: Option<Url>,
    #[builder(default = "5")]
    search_limit: usize,
}

/// Statement sections pulled from a problem page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProblemPage {
    title: String,
    description: String,
    input: String,
    output: String,
    examples: Vec<Example>,
}

#[derive(Debug, Deserialize)]
struct ProblemShow {
    level: u8,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    problem_id: u32,
    title_ko: String,
    level: u8,
}

/// HTTP client carrying the configured browser identification.
pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.request_timeout())
        .build()?)
}

impl ProblemFetcher {
    pub fn from_config(config: &Config) -> Result<Self> {
        ProblemFetcherBuilder::default()
            .client(http_client(config)?)
            .archive_origin(config.archive_origin()?)
            .metadata_origin(config.metadata_origin()?)
            .relay(config.relay_url()?)
            .search_limit(config.search_limit)
            .build()
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn problem_url(&self, id: u32) -> Result<Url> {
        Ok(self.archive_origin.join(&format!("problem/{id}"))?)
    }

    /// Fetches the statement and the tier of one problem. Metadata failures
    /// degrade to [`TierInfo::unknown`].
    #[instrument(skip(self))]
    pub async fn fetch_problem(&self, id: u32) -> Result<Problem> {
        let url = self.problem_url(id)?;
        let html = self.get(&url).await?;
        let page = parse_problem_page(id, &html, &url)?;
        let tier = self.fetch_tier(id).await;

        Ok(Problem {
            id,
            title: page.title,
            url: url.to_string(),
            description: page.description,
            input: page.input,
            output: page.output,
            examples: page.examples,
            tier,
        })
    }

    pub async fn fetch_tier(&self, id: u32) -> TierInfo {
        match self.fetch_level(id).await {
            Ok(level) => TierInfo::from_level(level),
            Err(e) => {
                warn!(id, error = %e, "falling back to unknown tier");
                TierInfo::unknown()
            }
        }
    }

    async fn fetch_level(&self, id: u32) -> Result<u8> {
        let mut url = self.metadata_origin.join("api/v3/problem/show")?;
        url.query_pairs_mut()
            .append_pair("problemId", &id.to_string());

        let body = self
            .get(&url)
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;
        let show: ProblemShow =
            serde_json::from_str(&body).map_err(|e| Error::MetadataUnavailable(e.to_string()))?;
        Ok(show.level)
    }

    /// Searches problems by number or title. Blank queries return nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let mut url = self.metadata_origin.join("api/v3/search/problem")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("page", "1")
            .append_pair("sort", "id");

        let body = self.get(&url).await?;
        let response: SearchResponse = serde_json::from_str(&body)?;
        Ok(response
            .items
            .into_iter()
            .take(self.search_limit)
            .map(|item| SearchHit {
                id: item.problem_id,
                title: item.title_ko,
                tier: TierInfo::from_level(item.level),
            })
            .collect())
    }

    async fn get(&self, target: &Url) -> Result<String> {
        let request_url = match &self.relay {
            Some(relay) => {
                let mut url = relay.clone();
                url.query_pairs_mut().append_pair("url", target.as_str());
                url
            }
            None => target.clone(),
        };
        debug!(%request_url, "GET");

        let response = self.client.get(request_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailure {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

fn parse_problem_page(id: u32, html: &str, base: &Url) -> Result<ProblemPage> {
    let document = Html::parse_document(html);

    let title = first(&document, &TITLE)
        .map(|el| el.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(Error::NotFound(id))?;

    let extractor = MarkdownExtractor::new(base.clone());
    let description = extractor.convert(first(&document, &DESCRIPTION).as_ref());
    let input = extractor.convert(first(&document, &INPUT).as_ref());
    let output = extractor.convert(first(&document, &OUTPUT).as_ref());

    let mut outputs: HashMap<&str, String> = document
        .select(&SAMPLE_OUTPUTS)
        .filter_map(|el| {
            let number = el.value().id()?.strip_prefix(SAMPLE_OUTPUT_PREFIX)?;
            Some((number, el.text().collect::<String>().trim().to_string()))
        })
        .collect();

    let examples = document
        .select(&SAMPLE_INPUTS)
        .filter_map(|el| {
            let number = el.value().id()?.strip_prefix(SAMPLE_INPUT_PREFIX)?;
            Some(Example {
                input: el.text().collect::<String>().trim().to_string(),
                output: outputs.remove(number).unwrap_or_default(),
            })
        })
        .collect();

    Ok(ProblemPage {
        title,
        description,
        input,
        output,
        examples,
    })
}

fn first(document: &Html, selector: &Selector) -> Option<Element> {
    document.select(selector).next().map(Element::from)
}
