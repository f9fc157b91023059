use hearth::{HeaderMap, HeaderValue};

#[test]
fn test_single_occurrence_is_a_single_string() {
    let mut map = HeaderMap::new();
    map.append("X-A", "1");

    assert_eq!(map.get_all("X-A"), Some(&HeaderValue::Single("1".into())));
    assert_eq!(map.get("X-A"), Some("1"));
}

#[test]
fn test_repeated_occurrences_form_an_ordered_sequence() {
    let mut map = HeaderMap::new();
    map.append("X-A", "1");
    map.append("X-A", "2");
    map.append("X-A", "3");

    assert_eq!(
        map.get_all("X-A"),
        Some(&HeaderValue::Multi(vec!["1".into(), "2".into(), "3".into()]))
    );
    // First value wins for scalar lookup.
    assert_eq!(map.get("X-A"), Some("1"));
}

#[test]
fn test_lookup_is_case_insensitive() {
    let mut map = HeaderMap::new();
    map.append("Content-Length", "5");

    assert_eq!(map.get("content-length"), Some("5"));
    assert_eq!(map.get("CONTENT-LENGTH"), Some("5"));
    assert!(map.contains("CoNtEnT-lEnGtH"));
}

#[test]
fn test_first_seen_casing_is_preserved_on_output() {
    let mut map = HeaderMap::new();
    map.append("X-CuStOm", "a");
    map.append("x-custom", "b");

    let lines: Vec<_> = map.lines().collect();
    assert_eq!(lines, vec![("X-CuStOm", "a"), ("X-CuStOm", "b")]);
}

#[test]
fn test_lines_expand_duplicates_in_arrival_order() {
    let mut map = HeaderMap::new();
    map.append("A", "1");
    map.append("B", "2");
    map.append("A", "3");

    let lines: Vec<_> = map.lines().collect();
    assert_eq!(lines, vec![("A", "1"), ("A", "3"), ("B", "2")]);
}

#[test]
fn test_set_replaces_all_values() {
    let mut map = HeaderMap::new();
    map.append("X-A", "1");
    map.append("X-A", "2");
    map.set("X-A", "only");

    assert_eq!(map.get_all("X-A"), Some(&HeaderValue::Single("only".into())));
}

#[test]
fn test_len_counts_distinct_names() {
    let mut map = HeaderMap::new();
    assert!(map.is_empty());
    map.append("A", "1");
    map.append("A", "2");
    map.append("B", "3");

    assert_eq!(map.len(), 2);
}
