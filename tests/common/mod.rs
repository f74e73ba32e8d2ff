//! Common test helpers shared across the integration suite.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use oaipmh::harvester::ListIdentifiersParser;
use oaipmh::provider::context::Context;
use oaipmh::provider::format::MetadataFormat;
use oaipmh::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
use oaipmh::provider::{DataProvider, Parameters, Repository, RepositoryConfiguration};
use oaipmh::xmlio::XmlReader;

/// Base URL every test provider reports.
pub const BASE_URL: &str = "http://localhost/oai";

/// A valid configuration with the default page sizes.
pub fn configuration() -> RepositoryConfiguration {
    RepositoryConfiguration::new()
        .with_repository_name("Test Repository")
        .with_base_url(BASE_URL)
        .with_admin_email("admin@example.org")
        .with_earliest_date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
}

/// A context offering `oai_dc` only.
pub fn dc_context() -> Context {
    Context::new()
        .with_metadata_format(
            MetadataFormat::new("oai_dc")
                .with_namespace("http://www.openarchives.org/OAI/2.0/oai_dc/")
                .with_schema_location("http://www.openarchives.org/OAI/2.0/oai_dc.xsd"),
        )
        .expect("single registration")
}

/// Assembles a provider.
pub fn provider(
    configuration: RepositoryConfiguration,
    context: Context,
    items: InMemoryItemRepository,
    sets: InMemorySetRepository,
) -> DataProvider {
    DataProvider::new(
        context,
        Repository::new(configuration, Arc::new(items), Arc::new(sets)),
    )
}

/// A provider over `count` generated items with `oai_dc`.
#[allow(dead_code)]
pub fn simple_provider(count: usize) -> DataProvider {
    provider(
        configuration(),
        dc_context(),
        InMemoryItemRepository::new().with_random_items(count),
        InMemorySetRepository::new(),
    )
}

/// Builds parameters from name/value pairs.
pub fn params(pairs: &[(&str, &str)]) -> Parameters {
    pairs.iter().copied().collect()
}

/// Renders the response to `pairs` as a string.
#[allow(dead_code)]
pub fn render(provider: &DataProvider, pairs: &[(&str, &str)]) -> String {
    let bytes = provider
        .write(&params(pairs), Vec::new())
        .expect("response is written");
    String::from_utf8(bytes).expect("response is UTF-8")
}

/// Follows ListIdentifiers tokens to the end, returning each page's identifiers.
#[allow(dead_code)]
pub fn harvest_identifier_pages(provider: &DataProvider, first: Parameters) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut request = first;
    loop {
        let bytes = provider.write(&request, Vec::new()).expect("response is written");
        let mut parser = ListIdentifiersParser::new(XmlReader::from_bytes(&bytes));
        let page: Vec<String> = parser
            .by_ref()
            .map(|header| header.expect("header parses").identifier)
            .collect();
        pages.push(page);
        match parser.resumption_token() {
            Some(token) if !token.is_end() => {
                request = params(&[("verb", "ListIdentifiers"), ("resumptionToken", &token.value)]);
            },
            _ => return pages,
        }
    }
}

/// Number of an `oai:memory:N` identifier.
#[allow(dead_code)]
pub fn item_number(identifier: &str) -> usize {
    identifier
        .rsplit(':')
        .next()
        .and_then(|n| n.parse().ok())
        .expect("generated identifier")
}
