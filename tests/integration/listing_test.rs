use flacwatch::core::entry::select_latest;
use flacwatch::core::lister::{parse_listing_output, ListingShape};

#[test]
fn test_aggregate_listing_keeps_order_and_fields() {
    let stdout = r#"{
        "title": "Liked Music",
        "entries": [
            {"id": "a1", "title": "First", "artist": "Band", "upload_date": "20240102",
             "thumbnails": [{"url": "https://i.ytimg.com/small.jpg"}, {"url": "https://i.ytimg.com/large.jpg"}]},
            {"id": "b2", "title": "Second", "channel": "Some Channel"}
        ]
    }"#;

    let entries = parse_listing_output(stdout);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id.as_deref(), Some("a1"));
    assert_eq!(entries[0].effective_artist(), "Band");
    assert_eq!(entries[0].year().as_deref(), Some("2024"));
    assert_eq!(
        entries[0].thumbnail.as_deref(),
        Some("https://i.ytimg.com/large.jpg")
    );
    assert_eq!(entries[1].effective_artist(), "Some Channel");
}

#[test]
fn test_line_delimited_listing() {
    let stdout = "{\"id\": \"x\", \"title\": \"One\"}\n\n{\"id\": \"y\", \"title\": \"Two\"}\n";

    let ids: Vec<_> = parse_listing_output(stdout)
        .into_iter()
        .filter_map(|e| e.id)
        .collect();

    assert_eq!(ids, vec!["x", "y"]);
    assert!(matches!(
        ListingShape::parse(stdout),
        Some(ListingShape::LineDelimited(_))
    ));
}

#[test]
fn test_single_item_listing() {
    let stdout = r#"{"id": "solo", "title": "Only One", "uploader": "Someone"}"#;

    let entries = parse_listing_output(stdout);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].effective_artist(), "Someone");
}

#[test]
fn test_garbage_is_an_empty_listing() {
    for stdout in ["", "   ", "ERROR: unable to download", "[1, 2, 3]"] {
        assert!(parse_listing_output(stdout).is_empty(), "Should be empty: {:?}", stdout);
    }
}

#[test]
fn test_aggregate_without_entries_array_falls_through() {
    let stdout = "{\n  \"id\": \"vid1\",\n  \"title\": \"Video\",\n  \"entries\": null\n}";
    assert!(matches!(
        ListingShape::parse(stdout),
        Some(ListingShape::SingleItem(_))
    ));
    assert_eq!(parse_listing_output(stdout)[0].id.as_deref(), Some("vid1"));
}

#[test]
fn test_entries_without_id_are_kept_for_the_watcher_to_skip() {
    let stdout = r#"{"entries": [{"title": "Private video"}, null, {"id": "ok"}]}"#;

    let entries = parse_listing_output(stdout);

    assert_eq!(entries.len(), 2);
    assert!(entries[0].id.is_none());
    assert_eq!(entries[1].id.as_deref(), Some("ok"));
}

#[test]
fn test_latest_from_parsed_listing() {
    let stdout = r#"{"entries": [
        {"id": "old", "upload_date": "20200101"},
        {"id": "new", "upload_date": "20231231"},
        {"id": "undated"}
    ]}"#;

    let entries = parse_listing_output(stdout);
    let latest = select_latest(&entries).unwrap();

    assert_eq!(latest.id.as_deref(), Some("new"));
}
