//! The scheduling loop.
//!
//! One worker task owns the pattern snapshot and the tracker, and consumes
//! two timers through a single `select!`: a pattern-directory rescan and a
//! reconciliation cycle. Handlers run to completion in arrival order, so the
//! shared state is never touched concurrently and the core needs no locks.
//!
//! Tile fetches within a cycle run concurrently, but every result (or
//! failure) is collected before the comparison reads the snapshot.

use crate::fetch::TileFetcher;
use crate::notify::NotificationDispatcher;
use crate::repository::{PatternRepository, RepositoryError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tileguard_core::{
    compare, required_tiles, DefacementTracker, FetchedTiles, NotifyDecision, PatternSet,
    TileCoord, TileGrid,
};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// The watcher: owns all mutable state and drives the reconciliation cycle.
pub struct Watcher<R, F, D> {
    grid: TileGrid,
    repository: R,
    fetcher: F,
    dispatcher: D,
    patterns: PatternSet,
    tracker: DefacementTracker,
}

impl<R, F, D> Watcher<R, F, D>
where
    R: PatternRepository,
    F: TileFetcher,
    D: NotificationDispatcher,
{
    /// Wire up a watcher; the pattern set starts empty until [`Self::bootstrap`].
    #[must_use]
    pub fn new(
        grid: TileGrid,
        repository: R,
        fetcher: F,
        dispatcher: D,
        remind_interval: chrono::Duration,
    ) -> Self {
        Self {
            grid,
            repository,
            fetcher,
            dispatcher,
            patterns: PatternSet::new(),
            tracker: DefacementTracker::new(remind_interval),
        }
    }

    /// Initial pattern load. Unlike periodic refreshes there is no previous
    /// snapshot to fall back to, so a failure here is fatal.
    pub fn bootstrap(&mut self) -> Result<(), RepositoryError> {
        self.patterns = self.repository.refresh()?;
        info!(patterns = self.patterns.len(), "initial pattern set loaded");
        Ok(())
    }

    /// The active pattern snapshot
    #[must_use]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Rescan the pattern source and swap the snapshot atomically.
    ///
    /// On failure the previous snapshot stays active. State for identities
    /// that disappeared (or moved) is dropped.
    pub fn refresh_patterns(&mut self) {
        match self.repository.refresh() {
            Ok(set) => {
                self.tracker.retain(&set.ids());
                self.patterns = set;
                info!(patterns = self.patterns.len(), "pattern set refreshed");
            }
            Err(err) => {
                warn!(error = %err, "pattern refresh failed, keeping previous set");
            }
        }
    }

    /// One reconciliation cycle: resolve, fetch, compare, track, notify.
    ///
    /// Returns the decisions that fired, which the run loop ignores but tests
    /// assert on.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Vec<NotifyDecision> {
        let required = required_tiles(&self.grid, &self.patterns);
        let required_count = required.len();
        let fetched = self.fetch_all(required).await;
        info!(
            required = required_count,
            fetched = fetched.len(),
            patterns = self.patterns.len(),
            "comparing canvas against patterns"
        );

        let reports = compare(&self.grid, &self.patterns, &fetched);
        let mut decisions = Vec::new();
        for pattern in self.patterns.iter() {
            let id = pattern.id();
            let report = reports.get(&id).copied().unwrap_or_default();
            if let Some(decision) = self.tracker.reconcile(&id, report.errors, now) {
                info!(
                    pattern = %id,
                    errors_before = decision.errors_before,
                    errors = decision.errors_now,
                    unverified = report.unverified,
                    "sending notification"
                );
                self.dispatcher.dispatch(&decision, pattern).await;
                decisions.push(decision);
            }
        }
        decisions
    }

    /// Fetch every required tile concurrently; failures become absent entries.
    async fn fetch_all(&self, required: HashSet<TileCoord>) -> FetchedTiles {
        let fetcher = &self.fetcher;
        let results = join_all(
            required
                .into_iter()
                .map(|tile| async move { (tile, fetcher.fetch(tile).await) }),
        )
        .await;

        let mut fetched = FetchedTiles::new();
        for (tile, result) in results {
            match result {
                Ok(image) => {
                    fetched.insert(tile, image);
                }
                Err(err) => {
                    error!(tile = %tile, error = %err, "unable to fetch tile");
                }
            }
        }
        fetched
    }

    /// Run forever, serializing both timers onto this task.
    pub async fn run(mut self, refresh: Duration, directory_refresh: Duration) {
        let mut cycle = tokio::time::interval(refresh);
        let mut rescan = tokio::time::interval(directory_refresh);
        cycle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // both intervals fire immediately on creation; bootstrap already
        // loaded patterns, so swallow the initial ticks
        cycle.tick().await;
        rescan.tick().await;

        loop {
            tokio::select! {
                _ = rescan.tick() => self.refresh_patterns(),
                _ = cycle.tick() => {
                    self.run_cycle(Utc::now()).await;
                }
            }
        }
    }
}
