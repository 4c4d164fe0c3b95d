//! Integration tests for the tracks vertical slice
//!
//! Covers the upsert algorithm, change detection, cascade deletes and
//! derived aggregate consistency.


use std::path::Path;
use test_helpers::*;
use tonearm_storage::tracks::{self, UpsertOutcome};
use tonearm_storage::{albums, artists, stats};

#[tokio::test]
async fn upsert_creates_track_album_and_artist() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let meta = test_metadata("/music/a.mp3", Some("X"), Some("Y"));
    let (id, outcome) = tracks::upsert(pool, &meta).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let track = tracks::get_by_id(pool, id).await.unwrap().unwrap();
    assert_eq!(track.title, "a");
    assert_eq!(track.artist.as_deref(), Some("X"));
    assert_eq!(track.album.as_deref(), Some("Y"));

    let all_artists = artists::get_all(pool).await.unwrap();
    assert_eq!(all_artists.len(), 1);
    assert_eq!(all_artists[0].name, "X");
    assert_eq!(all_artists[0].track_count, 1);

    let all_albums = albums::get_all(pool).await.unwrap();
    assert_eq!(all_albums.len(), 1);
    assert_eq!(all_albums[0].name, "Y");
    assert_eq!(all_albums[0].track_count, 1);
}

#[tokio::test]
async fn upsert_unchanged_file_is_noop() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let meta = test_metadata("/music/a.mp3", Some("X"), Some("Y"));
    let (first_id, _) = tracks::upsert(pool, &meta).await.unwrap();

    let (second_id, outcome) = tracks::upsert(pool, &meta).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);
    assert_eq!(first_id, second_id);

    let s = stats::get(pool).await.unwrap();
    assert_eq!(s.total_tracks, 1);
}

#[tokio::test]
async fn upsert_changed_file_relinks_and_sweeps_old_links() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let meta = test_metadata("/music/a.mp3", Some("Old Artist"), Some("Old Album"));
    let (id, _) = tracks::upsert(pool, &meta).await.unwrap();

    // Same path, new mtime, retagged to a different artist/album
    let mut changed = test_metadata("/music/a.mp3", Some("New Artist"), Some("New Album"));
    changed.file_mtime += 60;
    let (updated_id, outcome) = tracks::upsert(pool, &changed).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(updated_id, id);

    // The old album/artist lost their last track and must be gone
    let all_artists = artists::get_all(pool).await.unwrap();
    assert_eq!(all_artists.len(), 1);
    assert_eq!(all_artists[0].name, "New Artist");

    let all_albums = albums::get_all(pool).await.unwrap();
    assert_eq!(all_albums.len(), 1);
    assert_eq!(all_albums[0].name, "New Album");
}

#[tokio::test]
async fn two_tracks_share_one_album_row() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let mut one = test_metadata("/music/1.mp3", Some("Lead"), Some("Shared"));
    one.album_artist = Some("Lead".to_string());
    let mut two = test_metadata("/music/2.mp3", Some("Lead feat. Guest"), Some("Shared"));
    two.album_artist = Some("Lead".to_string());

    tracks::upsert(pool, &one).await.unwrap();
    tracks::upsert(pool, &two).await.unwrap();

    let all_albums = albums::get_all(pool).await.unwrap();
    assert_eq!(all_albums.len(), 1);
    assert_eq!(all_albums[0].track_count, 2);

    let album_tracks = tracks::get_by_album(pool, "Shared", Some("Lead")).await.unwrap();
    assert_eq!(album_tracks.len(), 2);
}

#[tokio::test]
async fn remove_last_track_cascades_album_and_artist() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let meta = test_metadata("/music/a.mp3", Some("X"), Some("Y"));
    tracks::upsert(pool, &meta).await.unwrap();

    let removed = tracks::remove_by_path(pool, Path::new("/music/a.mp3"))
        .await
        .unwrap();
    assert!(removed);

    assert!(tracks::get_all(pool).await.unwrap().is_empty());
    assert!(albums::get_all(pool).await.unwrap().is_empty());
    assert!(artists::get_all(pool).await.unwrap().is_empty());

    let s = stats::get(pool).await.unwrap();
    assert_eq!(s.total_tracks, 0);
    assert_eq!(s.total_albums, 0);
    assert_eq!(s.total_artists, 0);
}

#[tokio::test]
async fn remove_under_directory_only_touches_subtree() {
    let db = TestDb::new().await;
    let pool = db.pool();

    tracks::upsert(pool, &test_metadata("/music/rock/a.mp3", Some("A"), None))
        .await
        .unwrap();
    tracks::upsert(pool, &test_metadata("/music/jazz/b.mp3", Some("B"), None))
        .await
        .unwrap();
    // Sibling directory sharing the prefix string must survive
    tracks::upsert(pool, &test_metadata("/music/rockabilly/c.mp3", Some("C"), None))
        .await
        .unwrap();

    let removed = tracks::remove_under_directory(pool, Path::new("/music/rock"))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let remaining = tracks::get_all(pool).await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining
        .iter()
        .all(|t| !t.file_path.starts_with("/music/rock/")));
}

#[tokio::test]
async fn queries_by_artist_and_album_are_case_insensitive() {
    let db = TestDb::new().await;
    let pool = db.pool();

    tracks::upsert(pool, &test_metadata("/music/a.mp3", Some("The Band"), Some("Debut")))
        .await
        .unwrap();

    let by_artist = tracks::get_by_artist(pool, "the band").await.unwrap();
    assert_eq!(by_artist.len(), 1);

    let by_album = tracks::get_by_album(pool, "DEBUT", Some("the band"))
        .await
        .unwrap();
    assert_eq!(by_album.len(), 1);
}

#[tokio::test]
async fn search_matches_title_artist_and_album() {
    let db = TestDb::new().await;
    let pool = db.pool();

    tracks::upsert(pool, &test_metadata("/music/sunrise.mp3", Some("Dawn"), Some("Morning")))
        .await
        .unwrap();
    tracks::upsert(pool, &test_metadata("/music/other.mp3", Some("Night"), Some("Evening")))
        .await
        .unwrap();

    assert_eq!(tracks::search(pool, "sunrise").await.unwrap().len(), 1);
    assert_eq!(tracks::search(pool, "Dawn").await.unwrap().len(), 1);
    assert_eq!(tracks::search(pool, "Morning").await.unwrap().len(), 1);
    assert_eq!(tracks::search(pool, "nothing").await.unwrap().len(), 0);
}

#[tokio::test]
async fn stats_match_row_counts_and_durations() {
    let db = TestDb::new().await;
    let pool = db.pool();

    for i in 0..5 {
        let meta = test_metadata(&format!("/music/{i}.mp3"), Some("X"), Some("Y"));
        tracks::upsert(pool, &meta).await.unwrap();
    }

    let s = stats::get(pool).await.unwrap();
    let all = tracks::get_all(pool).await.unwrap();
    assert_eq!(s.total_tracks, all.len() as i64);
    assert_eq!(s.total_albums, 1);
    assert_eq!(s.total_artists, 1);
    assert_eq!(s.total_duration_ms, 5 * 180_000);
}

#[tokio::test]
async fn track_without_tags_stays_unlinked() {
    let db = TestDb::new().await;
    let pool = db.pool();

    let meta = test_metadata("/music/untagged.mp3", None, None);
    let (id, outcome) = tracks::upsert(pool, &meta).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let track = tracks::get_by_id(pool, id).await.unwrap().unwrap();
    assert!(track.artist.is_none());
    assert!(track.album.is_none());
    assert!(albums::get_all(pool).await.unwrap().is_empty());
    assert!(artists::get_all(pool).await.unwrap().is_empty());
}
