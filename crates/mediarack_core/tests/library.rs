use mediarack_core::{Connection, Library, MediaItem, MediaKind, OpenMode, Statement};

#[test]
fn add_then_list_roundtrip() {
    let mut library = Library::open("");
    assert!(library.opened());

    library.add("T", "U", MediaKind::Music, None, None);

    let music = library.list(MediaKind::Music);
    assert_eq!(music.len(), 1);
    assert_eq!(music[0].title(), "T");
    assert_eq!(music[0].uri(), "U");
    assert_eq!(music[0].thumbnail(), None);

    assert!(library.list(MediaKind::Movies).is_empty());
    assert_eq!(
        library.count(MediaKind::All),
        library.count(MediaKind::Music) + library.count(MediaKind::Movies)
    );
}

#[test]
fn count_distinguishes_kinds() {
    let mut library = Library::open("");
    library.add("Song", "file:///song.ogg", MediaKind::Music, None, None);
    library.add("Film", "file:///film.mkv", MediaKind::Movies, None, None);
    library.add("Song Two", "file:///two.ogg", MediaKind::Music, None, None);

    assert_eq!(library.count(MediaKind::Music), 2);
    assert_eq!(library.count(MediaKind::Movies), 1);
    assert_eq!(library.count(MediaKind::All), 3);
}

#[test]
fn search_filters_by_substring_case_insensitively() {
    let mut library = Library::open("");
    library.add("Test One", "file:///one.ogg", MediaKind::Music, None, None);
    library.add("Other", "file:///other.ogg", MediaKind::Music, None, None);

    let hits = library.search(MediaKind::All, "test");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title(), "Test One");

    assert!(library.search(MediaKind::All, "absent").is_empty());
}

#[test]
fn search_matches_album_names() {
    let mut library = Library::open("");
    library.add(
        "Opening",
        "file:///01.ogg",
        MediaKind::Music,
        None,
        Some("Road Trip"),
    );
    library.add("Unrelated", "file:///02.ogg", MediaKind::Music, None, None);

    let hits = library.search(MediaKind::All, "road");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title(), "Opening");
}

#[test]
fn search_respects_kind_filter() {
    let mut library = Library::open("");
    library.add("Shared Name", "file:///song.ogg", MediaKind::Music, None, None);
    library.add("Shared Name", "file:///film.mkv", MediaKind::Movies, None, None);

    let music_hits = library.search(MediaKind::Music, "shared");
    assert_eq!(music_hits.len(), 1);
    assert_eq!(music_hits[0].uri(), "file:///song.ogg");
}

#[test]
fn add_with_wildcard_kind_is_ignored() {
    let mut library = Library::open("");
    library.add("Nothing", "file:///no.ogg", MediaKind::All, None, None);
    assert_eq!(library.count(MediaKind::All), 0);
}

#[test]
fn thumbnails_survive_the_roundtrip() {
    let mut library = Library::open("");
    library.add(
        "Film",
        "file:///film.mkv",
        MediaKind::Movies,
        Some("film.png"),
        None,
    );
    library.add("Plain", "file:///plain.mkv", MediaKind::Movies, None, None);

    let movies = library.list(MediaKind::Movies);
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].title(), "Film");
    assert_eq!(movies[0].thumbnail(), Some("film.png"));
    assert_eq!(movies[1].thumbnail(), None);
}

#[test]
fn list_orders_by_album_then_name() {
    let mut library = Library::open("");
    library.add("Zebra", "file:///z.ogg", MediaKind::Music, None, None);
    library.add("Apple", "file:///a.ogg", MediaKind::Music, None, Some("Beta"));
    library.add("Mango", "file:///m.ogg", MediaKind::Music, None, Some("Alpha"));

    let titles: Vec<String> = library
        .list(MediaKind::All)
        .iter()
        .map(|item| item.title().to_string())
        .collect();

    // Items without an album group first, then albums alphabetically.
    assert_eq!(titles, ["Zebra", "Mango", "Apple"]);
}

#[test]
fn repeated_album_names_share_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");

    {
        let mut library = Library::open(&path);
        library.add("One", "file:///1.ogg", MediaKind::Music, None, Some("Shared"));
        library.add("Two", "file:///2.ogg", MediaKind::Music, None, Some("Shared"));
    }

    let conn = Connection::open(&path, OpenMode::ReadOnly);
    let mut albums = Statement::prepare(&conn, "SELECT COUNT(*) FROM albums");
    assert!(albums.execute() && albums.has_data());
    assert_eq!(albums.column_integer(0), 1);

    let mut linked = Statement::prepare(
        &conn,
        "SELECT COUNT(*) FROM items WHERE album_id IS NOT NULL",
    );
    assert!(linked.execute() && linked.has_data());
    assert_eq!(linked.column_integer(0), 2);
}

#[test]
fn reopening_does_not_remigrate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");

    {
        let mut library = Library::open(&path);
        assert!(library.opened());
        library.add("Keeper", "file:///keep.ogg", MediaKind::Music, None, None);
        assert_eq!(library.count(MediaKind::All), 1);
    }

    let mut reopened = Library::open(&path);
    assert_eq!(reopened.count(MediaKind::All), 1);
}

#[test]
fn version_mismatch_triggers_destructive_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");

    {
        let conn = Connection::open(&path, OpenMode::ReadWrite);
        assert!(
            Statement::prepare(&conn, "CREATE TABLE version (version INTEGER PRIMARY KEY)")
                .execute()
        );
        assert!(Statement::prepare(&conn, "INSERT INTO version (version) VALUES (999)").execute());
    }

    let mut library = Library::open(&path);
    assert!(library.opened());
    assert_eq!(library.count(MediaKind::All), 0);
    drop(library);

    let conn = Connection::open(&path, OpenMode::ReadOnly);
    assert_eq!(conn.tables(), ["albums", "items", "types", "version"]);

    let mut version = Statement::prepare(&conn, "SELECT version FROM version");
    assert!(version.execute() && version.has_data());
    assert_ne!(version.column_integer(0), 999);
}

#[test]
fn unopenable_location_degrades_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("library.db");

    let mut library = Library::open(&path);
    assert!(!library.opened());

    library.add(
        "Ghost",
        "file:///ghost.ogg",
        MediaKind::Music,
        None,
        Some("Nowhere"),
    );
    assert_eq!(library.count(MediaKind::All), 0);
    assert!(library.list(MediaKind::All).is_empty());
    assert!(library.search(MediaKind::All, "ghost").is_empty());
}

#[test]
fn media_items_serialize_roundtrip() {
    let mut library = Library::open("");
    library.add(
        "Song",
        "file:///song.ogg",
        MediaKind::Music,
        Some("song.png"),
        Some("Album"),
    );
    library.add("Bare", "file:///bare.ogg", MediaKind::Music, None, None);

    let items = library.list(MediaKind::Music);
    assert_eq!(items.len(), 2);

    let json = serde_json::to_string(&items).expect("items should serialize");
    let decoded: Vec<MediaItem> = serde_json::from_str(&json).expect("items should deserialize");
    assert_eq!(decoded, items);
}
