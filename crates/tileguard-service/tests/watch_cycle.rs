//! Full-cycle tests for the watcher loop with in-memory collaborators:
//! a canned repository, a canvas-backed fetcher and a recording dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};
use tileguard_core::{
    FetchedTiles, Metadata, NotifyDecision, Pattern, PatternSet, PixelPos, Placement, TileCoord,
    TileGrid,
};
use tileguard_service::{
    FetchError, NotificationDispatcher, PatternRepository, RepositoryError, TileFetcher, Watcher,
};

const INK: Rgba<u8> = Rgba([220, 40, 40, 255]);
const VANDAL: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn grid() -> TileGrid {
    TileGrid::new(16).unwrap()
}

/// Serves whatever snapshot the test last stored.
#[derive(Clone)]
struct FakeRepository {
    current: Arc<Mutex<Option<PatternSet>>>,
}

impl FakeRepository {
    fn new(set: PatternSet) -> Self {
        Self {
            current: Arc::new(Mutex::new(Some(set))),
        }
    }

    fn swap(&self, set: PatternSet) {
        *self.current.lock().unwrap() = Some(set);
    }

    fn fail_next(&self) {
        *self.current.lock().unwrap() = None;
    }
}

impl PatternRepository for FakeRepository {
    fn refresh(&self) -> Result<PatternSet, RepositoryError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RepositoryError::ReadDirectory {
                path: "/gone".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
    }
}

/// Serves tiles from a shared in-memory canvas; absent tiles 404.
#[derive(Clone)]
struct CanvasFetcher {
    canvas: Arc<Mutex<FetchedTiles>>,
}

impl CanvasFetcher {
    fn new(canvas: FetchedTiles) -> Self {
        Self {
            canvas: Arc::new(Mutex::new(canvas)),
        }
    }

    fn paint(&self, tile: TileCoord, x: u32, y: u32, color: Rgba<u8>) {
        self.canvas
            .lock()
            .unwrap()
            .get_mut(&tile)
            .unwrap()
            .put_pixel(x, y, color);
    }

    fn drop_tile(&self, tile: TileCoord) -> RgbaImage {
        self.canvas.lock().unwrap().remove(&tile).unwrap()
    }

    fn restore_tile(&self, tile: TileCoord, image: RgbaImage) {
        self.canvas.lock().unwrap().insert(tile, image);
    }
}

#[async_trait]
impl TileFetcher for CanvasFetcher {
    async fn fetch(&self, tile: TileCoord) -> Result<RgbaImage, FetchError> {
        self.canvas
            .lock()
            .unwrap()
            .get(&tile)
            .cloned()
            .ok_or(FetchError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

/// Records every dispatched decision.
#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<(String, NotifyDecision)>>>,
}

impl Recorder {
    fn take(&self) -> Vec<(String, NotifyDecision)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl NotificationDispatcher for Recorder {
    async fn dispatch(&self, decision: &NotifyDecision, pattern: &Pattern) {
        self.sent
            .lock()
            .unwrap()
            .push((pattern.name().to_string(), decision.clone()));
    }
}

/// A 6x6 pattern crossing the corner between tiles (0,0)..(1,1), plus a
/// canvas that matches it exactly.
fn corner_fixture(grid: &TileGrid) -> (PatternSet, FetchedTiles) {
    let image = RgbaImage::from_pixel(6, 6, INK);
    let placement = Placement::new(TileCoord::new(0, 0), PixelPos::new(13, 13));
    let pattern = Pattern::new(grid, "corner", image, placement, Metadata::default()).unwrap();

    let mut canvas = FetchedTiles::new();
    for coord in grid.tile_span(placement, 6, 6).iter() {
        canvas.insert(coord, RgbaImage::new(grid.tile_size(), grid.tile_size()));
    }
    for (x, y, px) in pattern.image().enumerate_pixels() {
        let g = grid.global_pixel(placement, x, y);
        canvas
            .get_mut(&g.tile)
            .unwrap()
            .put_pixel(g.pos.x, g.pos.y, *px);
    }
    (
        [pattern].into_iter().collect(),
        canvas,
    )
}

fn watcher(
    grid: TileGrid,
    repository: FakeRepository,
    fetcher: CanvasFetcher,
    recorder: Recorder,
) -> Watcher<FakeRepository, CanvasFetcher, Recorder> {
    let mut w = Watcher::new(
        grid,
        repository,
        fetcher,
        recorder,
        chrono::Duration::seconds(3600),
    );
    w.bootstrap().unwrap();
    w
}

#[tokio::test]
async fn matching_canvas_is_silent() {
    let grid = grid();
    let (set, canvas) = corner_fixture(&grid);
    let recorder = Recorder::default();
    let mut w = watcher(
        grid,
        FakeRepository::new(set),
        CanvasFetcher::new(canvas),
        recorder.clone(),
    );

    assert!(w.run_cycle(at(0)).await.is_empty());
    assert!(w.run_cycle(at(60)).await.is_empty());
    assert!(recorder.take().is_empty());
}

#[tokio::test]
async fn defacement_escalates_then_restores() {
    let grid = grid();
    let (set, canvas) = corner_fixture(&grid);
    let fetcher = CanvasFetcher::new(canvas);
    let recorder = Recorder::default();
    let mut w = watcher(grid, FakeRepository::new(set), fetcher.clone(), recorder.clone());

    // vandalize two pixels in the (1,1) quadrant of the pattern
    fetcher.paint(TileCoord::new(1, 1), 0, 0, VANDAL);
    fetcher.paint(TileCoord::new(1, 1), 1, 1, VANDAL);

    let decisions = w.run_cycle(at(0)).await;
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].errors_before, 0);
    assert_eq!(decisions[0].errors_now, 2);
    let sent = recorder.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "corner");

    // unchanged defacement inside the reminder window stays silent
    assert!(w.run_cycle(at(60)).await.is_empty());

    // repaint the canvas: restoration notice
    fetcher.paint(TileCoord::new(1, 1), 0, 0, INK);
    fetcher.paint(TileCoord::new(1, 1), 1, 1, INK);
    let decisions = w.run_cycle(at(120)).await;
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].errors_now, 0);
    assert_eq!(decisions[0].errors_before, 2);
}

#[tokio::test]
async fn missing_tile_never_notifies() {
    let grid = grid();
    let (set, canvas) = corner_fixture(&grid);
    let fetcher = CanvasFetcher::new(canvas);
    let recorder = Recorder::default();
    let mut w = watcher(grid, FakeRepository::new(set), fetcher.clone(), recorder.clone());

    let saved = fetcher.drop_tile(TileCoord::new(1, 1));
    assert!(w.run_cycle(at(0)).await.is_empty());

    // tile comes back clean: still silent, the pixels were never "errors"
    fetcher.restore_tile(TileCoord::new(1, 1), saved);
    assert!(w.run_cycle(at(60)).await.is_empty());
    assert!(recorder.take().is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let grid = grid();
    let (set, canvas) = corner_fixture(&grid);
    let repository = FakeRepository::new(set);
    let fetcher = CanvasFetcher::new(canvas);
    let recorder = Recorder::default();
    let mut w = watcher(grid, repository.clone(), fetcher.clone(), recorder.clone());

    repository.fail_next();
    w.refresh_patterns();
    assert_eq!(w.patterns().len(), 1, "previous snapshot must survive");

    // the surviving snapshot still reconciles
    fetcher.paint(TileCoord::new(0, 0), 13, 13, VANDAL);
    assert_eq!(w.run_cycle(at(0)).await.len(), 1);
}

#[tokio::test]
async fn dropped_pattern_forgets_its_history() {
    let grid = grid();
    let (set, canvas) = corner_fixture(&grid);
    let repository = FakeRepository::new(set.clone());
    let fetcher = CanvasFetcher::new(canvas);
    let recorder = Recorder::default();
    let mut w = watcher(grid, repository.clone(), fetcher.clone(), recorder.clone());

    fetcher.paint(TileCoord::new(0, 0), 13, 13, VANDAL);
    assert_eq!(w.run_cycle(at(0)).await.len(), 1);

    // pattern disappears from the repository, then comes back
    repository.swap(PatternSet::new());
    w.refresh_patterns();
    assert!(w.patterns().is_empty());
    repository.swap(set);
    w.refresh_patterns();

    // same 1-error defacement escalates again: history was discarded
    let decisions = w.run_cycle(at(60)).await;
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].errors_before, 0);
    assert_eq!(decisions[0].errors_now, 1);
}
