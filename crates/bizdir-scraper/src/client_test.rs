use bizdir_core::SortMode;

use super::*;

fn settings(base_url: &str) -> FetchSettings {
    FetchSettings {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        user_agent: "bizdir-test/0.1".to_string(),
        accept_language: "en-US,en;q=0.9".to_string(),
        max_attempts: 1,
        backoff_base_ms: 0,
        inter_request_delay_ms: 0,
        max_in_flight: 2,
    }
}

fn task(keyword: &str, location: &str, sort: SortMode) -> SearchTask {
    SearchTask {
        keyword: keyword.to_string(),
        location: location.to_string(),
        sort,
    }
}

#[test]
fn search_url_encodes_keyword_and_location() {
    let client = DirectoryClient::new(&settings("https://www.yellowpages.com")).unwrap();
    let url = client
        .search_url(&task("day spa", "Dallas, TX", SortMode::Relevance), 1)
        .unwrap();
    assert_eq!(
        url,
        "https://www.yellowpages.com/search?search_terms=day+spa&geo_location_terms=Dallas%2C+TX&page=1&sort=best"
    );
}

#[test]
fn search_url_strips_trailing_slash_from_base() {
    let client = DirectoryClient::new(&settings("https://www.yellowpages.com/")).unwrap();
    let url = client
        .search_url(&task("spa", "Dallas", SortMode::Relevance), 1)
        .unwrap();
    assert!(
        url.starts_with("https://www.yellowpages.com/search?"),
        "url: {url}"
    );
}

#[test]
fn search_url_carries_page_number() {
    let client = DirectoryClient::new(&settings("https://www.yellowpages.com")).unwrap();
    let url = client
        .search_url(&task("spa", "Dallas", SortMode::Relevance), 7)
        .unwrap();
    assert!(url.contains("page=7"), "url: {url}");
}

#[test]
fn search_url_maps_sort_modes_to_site_codes() {
    let client = DirectoryClient::new(&settings("https://www.yellowpages.com")).unwrap();
    let cases = [
        (SortMode::Relevance, "sort=best"),
        (SortMode::Distance, "sort=distance"),
        (SortMode::Rating, "sort=rating"),
        (SortMode::Name, "sort=name"),
    ];
    for (sort, expected) in cases {
        let url = client.search_url(&task("spa", "Dallas", sort), 1).unwrap();
        assert!(url.ends_with(expected), "sort {sort:?}: {url}");
    }
}

#[test]
fn search_url_rejects_unparseable_base() {
    let client = DirectoryClient::new(&settings("not a url")).unwrap();
    let result = client.search_url(&task("spa", "Dallas", SortMode::Relevance), 1);
    assert!(
        matches!(result, Err(ScraperError::InvalidUrl { .. })),
        "expected InvalidUrl, got: {result:?}"
    );
}

#[test]
fn host_of_strips_scheme_and_path() {
    assert_eq!(host_of("https://www.yellowpages.com/search?x=1"), "www.yellowpages.com");
    assert_eq!(host_of("http://127.0.0.1:8080/search"), "127.0.0.1");
}

#[test]
fn host_of_fallback_without_scheme() {
    assert_eq!(host_of("yellowpages.com/search"), "yellowpages.com");
}
