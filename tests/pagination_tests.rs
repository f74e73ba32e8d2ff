//! Listing completeness across resumption tokens.

mod common;

use common::{configuration, dc_context, harvest_identifier_pages, item_number, params, provider};
use oaipmh::harvester::{HarvesterContext, ListRecordsParser, ListSetsParser};
use oaipmh::provider::filter::Condition;
use oaipmh::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
use oaipmh::provider::set::Set;
use oaipmh::provider::TokenEncoding;
use oaipmh::xmlio::XmlReader;
use proptest::prelude::*;

fn expected_pages(visible: usize, page_size: usize) -> usize {
    ((visible + page_size - 1) / page_size).max(1)
}

#[test]
fn test_every_item_once_in_ceil_pages() {
    for (count, page_size) in [(1, 1), (9, 3), (10, 3), (10, 5), (7, 100), (100, 7)] {
        let provider = provider(
            configuration().with_max_list_identifiers(page_size),
            dc_context(),
            InMemoryItemRepository::new().with_random_items(count),
            InMemorySetRepository::new(),
        );
        let pages = harvest_identifier_pages(
            &provider,
            params(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
        );
        assert_eq!(pages.len(), expected_pages(count, page_size), "{count}/{page_size}");
        let numbers: Vec<usize> = pages.concat().iter().map(|id| item_number(id)).collect();
        assert_eq!(numbers, (0..count).collect::<Vec<_>>(), "{count}/{page_size}");
    }
}

#[test]
fn test_filtering_happens_before_paging() {
    let provider = provider(
        configuration().with_max_list_identifiers(4),
        dc_context().with_condition(Condition::from_fn(|item| {
            item.identifier
                .rsplit(':')
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .is_some_and(|n| n % 3 != 0)
        })),
        InMemoryItemRepository::new().with_random_items(20),
        InMemorySetRepository::new(),
    );
    let pages = harvest_identifier_pages(
        &provider,
        params(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
    );
    let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![4, 4, 4, 1]);
    let numbers: Vec<usize> = pages.concat().iter().map(|id| item_number(id)).collect();
    assert!(numbers.iter().all(|n| n % 3 != 0));
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_records_follow_base64_tokens() {
    let provider = provider(
        configuration()
            .with_max_list_records(3)
            .with_token_encoding(TokenEncoding::Base64),
        dc_context(),
        InMemoryItemRepository::new().with_random_items(7),
        InMemorySetRepository::new(),
    );
    let context = HarvesterContext::new();
    let mut request = params(&[("verb", "ListRecords"), ("metadataPrefix", "oai_dc")]);
    let mut titles = Vec::new();
    let mut cursors = Vec::new();
    loop {
        let bytes = provider.write(&request, Vec::new()).unwrap();
        let mut parser = ListRecordsParser::new(XmlReader::from_bytes(&bytes), &context, "oai_dc");
        for record in parser.by_ref() {
            let record = record.unwrap();
            titles.push(record.metadata.unwrap().as_xml().unwrap().to_string());
        }
        let Some(token) = parser.resumption_token().cloned() else {
            panic!("a paged listing always carries a token");
        };
        cursors.push(token.cursor);
        assert_eq!(token.complete_list_size, Some(7));
        if token.is_end() {
            break;
        }
        assert!(!token.value.contains("offset::"));
        request = params(&[("verb", "ListRecords"), ("resumptionToken", &token.value)]);
    }
    assert_eq!(titles.len(), 7);
    assert!(titles[6].contains("Item 6"));
    assert_eq!(cursors, vec![Some(0), Some(3), Some(6)]);
}

#[test]
fn test_virtual_sets_precede_repository_sets_across_pages() {
    let provider = provider(
        configuration().with_max_list_sets(2),
        dc_context()
            .with_set(Set::new("open").with_name("Open access"))
            .with_set(Set::new("recent").with_condition(Condition::always_true())),
        InMemoryItemRepository::new(),
        InMemorySetRepository::new().with_random_sets(5),
    );
    let mut request = params(&[("verb", "ListSets")]);
    let mut specs = Vec::new();
    loop {
        let bytes = provider.write(&request, Vec::new()).unwrap();
        let mut parser = ListSetsParser::new(XmlReader::from_bytes(&bytes));
        specs.extend(parser.by_ref().map(|set| set.unwrap().spec));
        match parser.resumption_token() {
            Some(token) if !token.is_end() => {
                assert_eq!(token.complete_list_size, Some(7));
                request = params(&[("verb", "ListSets"), ("resumptionToken", &token.value)]);
            },
            _ => break,
        }
    }
    assert_eq!(
        specs,
        vec!["open", "recent", "set0", "set1", "set2", "set3", "set4"]
    );
}

#[test]
fn test_set_spec_with_separator_pages_to_the_end() {
    for encoding in [TokenEncoding::Plain, TokenEncoding::Base64] {
        let provider = provider(
            configuration()
                .with_max_list_identifiers(2)
                .with_token_encoding(encoding),
            dc_context().with_set(Set::new("a|b").with_condition(Condition::always_true())),
            InMemoryItemRepository::new().with_random_items(5),
            InMemorySetRepository::new(),
        );
        let pages = harvest_identifier_pages(
            &provider,
            params(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("set", "a|b")]),
        );
        let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1], "{encoding:?}");
        let numbers: Vec<usize> = pages.concat().iter().map(|id| item_number(id)).collect();
        assert_eq!(numbers, (0..5).collect::<Vec<_>>());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_pagination_is_complete(count in 0usize..40, page_size in 1usize..12, modulus in 1usize..5) {
        let provider = provider(
            configuration().with_max_list_identifiers(page_size),
            dc_context().with_condition(Condition::from_fn(move |item| {
                item.identifier
                    .rsplit(':')
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .is_some_and(|n| n % modulus == 0)
            })),
            InMemoryItemRepository::new().with_random_items(count),
            InMemorySetRepository::new(),
        );
        let pages = harvest_identifier_pages(
            &provider,
            params(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
        );
        let visible: Vec<usize> = (0..count).filter(|n| n % modulus == 0).collect();
        prop_assert_eq!(pages.len(), expected_pages(visible.len(), page_size));
        for page in &pages[..pages.len() - 1] {
            prop_assert_eq!(page.len(), page_size);
        }
        let harvested: Vec<usize> = pages.concat().iter().map(|id| item_number(id)).collect();
        prop_assert_eq!(harvested, visible);
    }
}
