//! End-to-end provider behaviour, checked on the rendered documents.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{configuration, dc_context, params, provider, render, simple_provider, BASE_URL};
use oaipmh::error::ErrorCode;
use oaipmh::model::{Granularity, Metadata, ResumptionValue};
use oaipmh::provider::filter::{Condition, ScopedFilter};
use oaipmh::provider::format::MetadataFormat;
use oaipmh::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
use oaipmh::provider::repository::{Item, ItemIdentifier, ItemRepository, ResultsPage};
use oaipmh::provider::resumption::{ResumptionTokenFormat, SimpleResumptionTokenFormat};
use oaipmh::provider::set::Set;
use oaipmh::provider::{DataProvider, Repository};

fn error_code(provider: &DataProvider, pairs: &[(&str, &str)]) -> Vec<ErrorCode> {
    provider
        .handle(&params(pairs))
        .expect("no internal failure")
        .errors()
        .iter()
        .map(|e| e.code)
        .collect()
}

#[test]
fn test_envelope_of_identify() {
    let xml = render(&simple_provider(1), &[("verb", "Identify")]);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<OAI-PMH xmlns=\"http://www.openarchives.org/OAI/2.0/\""));
    assert!(xml.contains(&format!("<request verb=\"Identify\">{BASE_URL}</request>")));
    assert!(xml.contains("<repositoryName>Test Repository</repositoryName>"));
    assert!(xml.contains("<protocolVersion>2.0</protocolVersion>"));
    assert!(xml.contains("<earliestDatestamp>2020-01-01T00:00:00Z</earliestDatestamp>"));
    assert!(xml.trim_end().ends_with("</OAI-PMH>"));
}

#[test]
fn test_bad_verb_and_bad_argument_echo_nothing() {
    let provider = simple_provider(1);
    for pairs in [
        vec![("verb", "Harvest")],
        vec![],
        vec![("verb", "Identify"), ("verb", "Identify")],
        vec![("verb", "Identify"), ("identifier", "x")],
    ] {
        let xml = render(&provider, &pairs);
        assert!(xml.contains(&format!("<request>{BASE_URL}</request>")), "{xml}");
    }
    assert_eq!(error_code(&provider, &[("verb", "Harvest")]), vec![ErrorCode::BadVerb]);
    assert_eq!(error_code(&provider, &[]), vec![ErrorCode::BadVerb]);
    assert_eq!(
        error_code(&provider, &[("verb", "Identify"), ("identifier", "x")]),
        vec![ErrorCode::BadArgument]
    );
}

#[test]
fn test_argument_errors() {
    let provider = simple_provider(3);
    let cases: [(&[(&str, &str)], ErrorCode); 7] = [
        (
            &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("metadataPrefix", "oai_dc")],
            ErrorCode::BadArgument,
        ),
        (
            &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("resumptionToken", "x")],
            ErrorCode::BadArgument,
        ),
        (&[("verb", "ListRecords")], ErrorCode::BadArgument),
        (
            &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("from", "yesterday")],
            ErrorCode::BadArgument,
        ),
        (
            &[
                ("verb", "ListRecords"),
                ("metadataPrefix", "oai_dc"),
                ("from", "2024-02-01"),
                ("until", "2024-01-01"),
            ],
            ErrorCode::BadArgument,
        ),
        (
            &[
                ("verb", "ListIdentifiers"),
                ("metadataPrefix", "oai_dc"),
                ("from", "2024-02-01"),
                ("until", "2024-03-01T00:00:00Z"),
            ],
            ErrorCode::BadArgument,
        ),
        (&[("verb", "ListSets"), ("resumptionToken", "@@@")], ErrorCode::BadResumptionToken),
    ];
    for (pairs, expected) in cases {
        assert_eq!(error_code(&provider, pairs), vec![expected], "{pairs:?}");
    }
}

#[test]
fn test_second_precision_on_day_repository() {
    let provider = provider(
        configuration().with_granularity(Granularity::Day),
        dc_context(),
        InMemoryItemRepository::new().with_random_items(2),
        InMemorySetRepository::new(),
    );
    assert_eq!(
        error_code(
            &provider,
            &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("from", "2020-01-01T00:00:00Z")]
        ),
        vec![ErrorCode::BadArgument]
    );
    let xml = render(
        &provider,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("until", "2020-01-01")],
    );
    assert!(xml.contains("<datestamp>2020-01-01</datestamp>"));
    assert!(xml.contains("oai:memory:1"));
}

#[test]
fn test_sub_second_datestamp_matches_its_rendered_until() {
    let stamped = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(500);
    let items = || {
        InMemoryItemRepository::new()
            .with_item(ItemIdentifier::new("oai:x:late", stamped), Some("<dc/>".into()))
    };
    let seconds = provider(configuration(), dc_context(), items(), InMemorySetRepository::new());
    let xml = render(
        &seconds,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("until", "2024-01-01T10:00:00Z")],
    );
    assert!(xml.contains("<datestamp>2024-01-01T10:00:00Z</datestamp>"), "{xml}");
    let xml = render(
        &seconds,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("from", "2024-01-01T10:00:00Z")],
    );
    assert!(xml.contains("oai:x:late"));

    let days = provider(
        configuration().with_granularity(Granularity::Day),
        dc_context(),
        InMemoryItemRepository::new().with_item(
            ItemIdentifier::new(
                "oai:x:midnight",
                Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap() + chrono::Duration::milliseconds(900),
            ),
            Some("<dc/>".into()),
        ),
        InMemorySetRepository::new(),
    );
    let xml = render(
        &days,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("until", "2024-01-01")],
    );
    assert!(xml.contains("<datestamp>2024-01-01</datestamp>"), "{xml}");
}

#[test]
fn test_item_errors() {
    let provider = simple_provider(2);
    assert_eq!(
        error_code(&provider, &[("verb", "GetRecord"), ("identifier", "oai:memory:9"), ("metadataPrefix", "oai_dc")]),
        vec![ErrorCode::IdDoesNotExist]
    );
    assert_eq!(
        error_code(&provider, &[("verb", "GetRecord"), ("identifier", "oai:memory:0"), ("metadataPrefix", "mods")]),
        vec![ErrorCode::CannotDisseminateFormat]
    );
    assert_eq!(
        error_code(&provider, &[("verb", "ListRecords"), ("metadataPrefix", "mods")]),
        vec![ErrorCode::CannotDisseminateFormat]
    );
    assert_eq!(
        error_code(&provider, &[("verb", "ListMetadataFormats"), ("identifier", "oai:memory:9")]),
        vec![ErrorCode::IdDoesNotExist]
    );
    assert_eq!(
        error_code(&simple_provider(0), &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
        vec![ErrorCode::NoRecordsMatch]
    );
}

#[test]
fn test_set_errors() {
    let no_sets = provider(
        configuration(),
        dc_context(),
        InMemoryItemRepository::new().with_random_items(2),
        InMemorySetRepository::new().without_set_support(),
    );
    assert_eq!(error_code(&no_sets, &[("verb", "ListSets")]), vec![ErrorCode::NoSetHierarchy]);
    assert_eq!(
        error_code(&no_sets, &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("set", "a")]),
        vec![ErrorCode::NoSetHierarchy]
    );
    assert_eq!(
        error_code(&simple_provider(2), &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("set", "missing")]),
        vec![ErrorCode::NoRecordsMatch]
    );
}

#[test]
fn test_resuming_beyond_the_end_gives_empty_token() {
    let token = SimpleResumptionTokenFormat::default().format(
        &ResumptionValue::new()
            .with_offset(500)
            .with_metadata_prefix(Some("oai_dc".into())),
    );
    let xml = render(
        &simple_provider(3),
        &[("verb", "ListRecords"), ("resumptionToken", &token)],
    );
    assert!(!xml.contains("<error"));
    assert!(!xml.contains("<record>"));
    assert!(xml.contains("<resumptionToken completeListSize=\"3\" cursor=\"500\"/>"));
}

#[test]
fn test_set_hierarchy_selection() {
    let items = InMemoryItemRepository::new()
        .with_item(
            ItemIdentifier::new("oai:x:1", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).with_set("a:b"),
            Some("<dc/>".into()),
        )
        .with_item(
            ItemIdentifier::new("oai:x:2", Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()).with_set("ab"),
            Some("<dc/>".into()),
        );
    let sets = InMemorySetRepository::new()
        .with_set(oaipmh::model::Set::new("a", "A"))
        .with_set(oaipmh::model::Set::new("a:b", "A/B"))
        .with_set(oaipmh::model::Set::new("ab", "AB"));
    let provider = provider(configuration(), dc_context(), items, sets);
    let xml = render(
        &provider,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("set", "a")],
    );
    assert!(xml.contains("oai:x:1"));
    assert!(!xml.contains("oai:x:2"));
}

#[test]
fn test_virtual_set_membership_in_headers() {
    let provider = provider(
        configuration(),
        dc_context().with_set(
            Set::new("even").with_condition(Condition::from_fn(|item| {
                item.identifier.ends_with('0') || item.identifier.ends_with('2')
            })),
        ),
        InMemoryItemRepository::new().with_random_items(3),
        InMemorySetRepository::new(),
    );
    let xml = render(
        &provider,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("set", "even")],
    );
    assert!(xml.contains("<identifier>oai:memory:0</identifier>"));
    assert!(!xml.contains("<identifier>oai:memory:1</identifier>"));
    assert_eq!(xml.matches("<setSpec>even</setSpec>").count(), 2);
}

#[test]
fn test_format_condition_hides_items() {
    let context = dc_context()
        .with_metadata_format(
            MetadataFormat::new("restricted").with_condition(Condition::from_fn(|item| item.identifier.ends_with(":1"))),
        )
        .unwrap();
    let provider = provider(
        configuration(),
        context,
        InMemoryItemRepository::new().with_random_items(3),
        InMemorySetRepository::new(),
    );
    let xml = render(
        &provider,
        &[("verb", "ListIdentifiers"), ("metadataPrefix", "restricted")],
    );
    assert_eq!(xml.matches("<header>").count(), 1);
    assert_eq!(
        error_code(&provider, &[("verb", "GetRecord"), ("identifier", "oai:memory:0"), ("metadataPrefix", "restricted")]),
        vec![ErrorCode::CannotDisseminateFormat]
    );
}

#[test]
fn test_deleted_record_has_no_metadata() {
    let provider = provider(
        configuration(),
        dc_context(),
        InMemoryItemRepository::new().with_item(
            ItemIdentifier::new("oai:x:gone", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).with_deleted(true),
            Some("<dc>secret</dc>".into()),
        ),
        InMemorySetRepository::new(),
    );
    let xml = render(
        &provider,
        &[("verb", "GetRecord"), ("identifier", "oai:x:gone"), ("metadataPrefix", "oai_dc")],
    );
    assert!(xml.contains("<header status=\"deleted\">"));
    assert!(!xml.contains("<metadata"));
    assert!(!xml.contains("secret"));
}

#[test]
fn test_stylesheet_and_metadata_attributes() {
    let items = InMemoryItemRepository::new().with_random_items(1);
    let provider = provider(
        configuration()
            .with_stylesheet("/static/oai.xsl")
            .with_metadata_attributes(true),
        dc_context(),
        items,
        InMemorySetRepository::new(),
    );
    let xml = render(
        &provider,
        &[("verb", "GetRecord"), ("identifier", "oai:memory:0"), ("metadataPrefix", "oai_dc")],
    );
    assert!(xml.contains("<?xml-stylesheet type=\"text/xsl\" href=\"/static/oai.xsl\"?>"));
    assert!(xml.contains("<dc:title>Item 0</dc:title>"));
}

/// Serves one item whose metadata is a byte stream with a declaration.
struct StreamingRepository;

impl StreamingRepository {
    fn item() -> Item {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><dc lang=\"fr\">{}</dc>",
            "caf\u{e9} \u{2665} ".repeat(400)
        );
        Item::new(ItemIdentifier::new(
            "oai:stream:1",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
        .with_metadata(Metadata::from_stream(Cursor::new(body.into_bytes())).with_attribute("lang", "fr"))
    }
}

impl ItemRepository for StreamingRepository {
    fn get_item(&self, identifier: &str) -> oaipmh::Result<Option<Item>> {
        Ok((identifier == "oai:stream:1").then(Self::item))
    }

    fn get_items(
        &self,
        _filters: &[ScopedFilter],
        query: &ResumptionValue,
        _length: usize,
    ) -> oaipmh::Result<ResultsPage<Item>> {
        if query.offset > 0 {
            return Ok(ResultsPage::empty());
        }
        Ok(ResultsPage {
            items: vec![Self::item()],
            has_more: false,
            total: Some(1),
        })
    }

    fn get_item_identifiers(
        &self,
        _filters: &[ScopedFilter],
        _query: &ResumptionValue,
        _length: usize,
    ) -> oaipmh::Result<ResultsPage<ItemIdentifier>> {
        Ok(ResultsPage {
            items: vec![Self::item().identifier],
            has_more: false,
            total: Some(1),
        })
    }
}

#[test]
fn test_streamed_metadata_is_spliced() {
    let provider = DataProvider::new(
        dc_context(),
        Repository::new(
            configuration().with_metadata_attributes(true),
            Arc::new(StreamingRepository),
            Arc::new(InMemorySetRepository::new()),
        ),
    );
    let xml = render(&provider, &[("verb", "ListRecords"), ("metadataPrefix", "oai_dc")]);
    assert_eq!(xml.matches("<?xml ").count(), 1);
    assert!(xml.contains("<metadata lang=\"fr\"><dc lang=\"fr\">caf\u{e9} \u{2665} "));
    assert!(!xml.contains('\u{FFFD}'));
    assert_eq!(xml.matches('\u{2665}').count(), 400);
}
