use albums_core::{
    Album, AlbumId, AlbumPatch, AlbumRepository, AlbumService, DbPool, NewAlbum, RepoError,
    RepoResult, SqliteAlbumRepository, DEFAULT_STORE_TIMEOUT,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

/// In-process repository that records the timeout of every call.
#[derive(Default)]
struct RecordingRepository {
    rows: RefCell<BTreeMap<AlbumId, Album>>,
    timeouts: RefCell<Vec<Duration>>,
    drop_before_update: bool,
}

impl RecordingRepository {
    fn record(&self, timeout: Duration) {
        self.timeouts.borrow_mut().push(timeout);
    }
}

impl AlbumRepository for &RecordingRepository {
    fn insert_album(&self, album: &mut Album, timeout: Duration) -> RepoResult<()> {
        self.record(timeout);
        let mut rows = self.rows.borrow_mut();
        album.id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        rows.insert(album.id, album.clone());
        Ok(())
    }

    fn list_albums(&self, timeout: Duration) -> RepoResult<Vec<Album>> {
        self.record(timeout);
        Ok(self.rows.borrow().values().cloned().collect())
    }

    fn get_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<Album> {
        self.record(timeout);
        self.rows
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(RepoError::RecordNotFound(id))
    }

    fn update_album(&self, album: &Album, timeout: Duration) -> RepoResult<()> {
        self.record(timeout);
        let mut rows = self.rows.borrow_mut();
        if self.drop_before_update {
            rows.remove(&album.id);
        }
        match rows.get_mut(&album.id) {
            Some(row) => {
                *row = album.clone();
                Ok(())
            }
            None => Err(RepoError::EditConflict(album.id)),
        }
    }

    fn delete_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<()> {
        self.record(timeout);
        self.rows
            .borrow_mut()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::RecordNotFound(id))
    }
}

fn new_album(title: &str, artist: &str, price: f64) -> NewAlbum {
    NewAlbum {
        title: title.to_string(),
        artist: artist.to_string(),
        price,
    }
}

#[test]
fn every_store_call_receives_the_service_timeout() {
    let timeout = Duration::from_millis(1_250);
    let repo = RecordingRepository::default();
    let service = AlbumService::with_timeout(&repo, timeout);

    let created = service
        .create_album(new_album("Kid A", "Radiohead", 11.0))
        .unwrap();
    service.list_albums().unwrap();
    service.get_album(created.id).unwrap();
    service
        .update_album(created.id, &AlbumPatch::default())
        .unwrap();
    service.delete_album(created.id).unwrap();

    let recorded = repo.timeouts.borrow();
    // update = get + write
    assert_eq!(recorded.len(), 6);
    assert!(recorded.iter().all(|t| *t == timeout));
}

#[test]
fn default_timeout_is_three_seconds() {
    let repo = RecordingRepository::default();
    let service = AlbumService::new(&repo);
    assert_eq!(service.timeout(), Duration::from_secs(3));
    assert_eq!(service.timeout(), DEFAULT_STORE_TIMEOUT);
}

#[test]
fn update_of_missing_album_is_not_found_and_writes_nothing() {
    let repo = RecordingRepository::default();
    let service = AlbumService::new(&repo);

    let patch = AlbumPatch {
        title: Some("ghost".to_string()),
        ..AlbumPatch::default()
    };
    let err = service.update_album(7, &patch).unwrap_err();
    assert!(err.is_not_found());
    assert!(service.list_albums().unwrap().is_empty());
}

#[test]
fn update_of_row_removed_mid_flight_is_edit_conflict() {
    let repo = RecordingRepository {
        drop_before_update: true,
        ..RecordingRepository::default()
    };
    let service = AlbumService::new(&repo);
    let created = service
        .create_album(new_album("Amnesiac", "Radiohead", 8.0))
        .unwrap();

    let err = service
        .update_album(created.id, &AlbumPatch::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::EditConflict(id) if id == created.id));
}

#[derive(Debug)]
enum PatchError {
    Store(RepoError),
    Malformed,
}

impl From<RepoError> for PatchError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

#[test]
fn update_with_missing_album_reports_not_found_before_building_patch() {
    let repo = RecordingRepository::default();
    let service = AlbumService::new(&repo);
    let mut patch_built = false;

    let err = service
        .update_album_with(404, || {
            patch_built = true;
            Err::<AlbumPatch, _>(PatchError::Malformed)
        })
        .unwrap_err();

    assert!(matches!(err, PatchError::Store(RepoError::RecordNotFound(404))));
    assert!(!patch_built);
}

#[test]
fn update_with_failing_patch_writes_nothing() {
    let repo = RecordingRepository::default();
    let service = AlbumService::new(&repo);
    let created = service
        .create_album(new_album("Hail to the Thief", "Radiohead", 12.0))
        .unwrap();

    let err = service
        .update_album_with(created.id, || Err::<AlbumPatch, _>(PatchError::Malformed))
        .unwrap_err();

    assert!(matches!(err, PatchError::Malformed));
    assert_eq!(service.get_album(created.id).unwrap(), created);
    // insert + get + get; no write
    assert_eq!(repo.timeouts.borrow().len(), 3);
}

#[test]
fn create_then_get_returns_equal_album_on_sqlite() {
    let pool = DbPool::open_in_memory().unwrap();
    let service = AlbumService::new(SqliteAlbumRepository::new(&pool));

    let created = service
        .create_album(new_album("OK Computer", "Radiohead", 9.99))
        .unwrap();
    assert!(created.id >= 1);

    let fetched = service.get_album(created.id).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.title, "OK Computer");
    assert_eq!(fetched.artist, "Radiohead");
    assert_eq!(fetched.price, 9.99);
}

#[test]
fn partial_update_on_sqlite_changes_only_provided_fields() {
    let pool = DbPool::open_in_memory().unwrap();
    let service = AlbumService::new(SqliteAlbumRepository::new(&pool));
    let created = service
        .create_album(new_album("Old Name", "Radiohead", 9.99))
        .unwrap();

    let renamed = service
        .update_album(
            created.id,
            &AlbumPatch {
                title: Some("New Name".to_string()),
                ..AlbumPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.title, "New Name");
    assert_eq!(renamed.artist, "Radiohead");
    assert_eq!(renamed.price, 9.99);

    let free = service
        .update_album(
            created.id,
            &AlbumPatch {
                price: Some(0.0),
                ..AlbumPatch::default()
            },
        )
        .unwrap();
    assert_eq!(free.price, 0.0);
    assert_eq!(service.get_album(created.id).unwrap(), free);
}
