use crate::{
    backend::{Backend, BackendError, Metric},
    config::EditorConfig,
    interaction::{DragController, Intent, Point},
    view_model::ViewModel,
};
use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use importer::{
    csv_table::{self, TableError},
    normalize::{NormalizeError, Normalized, Normalizer},
    store::TableStore,
};
use log::{debug, error, info, warn};
use models::{
    table::{TableId, TableSnapshot},
    timetable::TimeTable,
};
use std::{path::Path, sync::Arc};
use strum::{Display, EnumString};
use thiserror::Error;

/// What the room and period headers show when their labels cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum LabelFailurePolicy {
    /// The error text becomes the only label
    ShowError,
    /// No labels, plus a notice
    #[default]
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NoticeKind {
    LabelsUnavailable,
    LockFailed,
    SwapFailed,
}

/// A failure the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("no class is placed at cell {0}")]
    NoSuchCell(usize),
}

/// Answer to one legality query
#[derive(Debug)]
pub struct LegalityCheck {
    pub over: usize,
    pub active: usize,
    pub result: Result<bool, BackendError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The gesture ended without a drop
    NoDrop,
    /// The backend said the move is not allowed
    Refused,
    Swapped,
}

/// Whether `active` may move onto `over`; dropping a cell on itself never is
async fn legality(
    backend: &dyn Backend,
    over: usize,
    active: usize,
) -> Result<bool, BackendError> {
    if over == active {
        return Ok(false);
    }

    backend.is_swappable(over, active).await
}

/// One user's editing session.
///
/// Owns the local [`ViewModel`], the gesture state and the imported tables,
/// and runs every user action against the backend. Actions that change the
/// schedule replace the view model with the snapshot the backend returns;
/// failed actions leave it untouched.
pub struct EditorSession<S> {
    backend: Arc<dyn Backend>,
    store: S,
    normalizer: Normalizer,
    view: ViewModel,
    drag: DragController,
    rooms: Vec<String>,
    periods: Vec<String>,
    label_failure: LabelFailurePolicy,
    pending: FuturesUnordered<BoxFuture<'static, LegalityCheck>>,
    notices: Vec<Notice>,
    last_import: Option<Normalized>,
}

impl<S: TableStore> EditorSession<S> {
    pub fn new(backend: Arc<dyn Backend>, store: S, config: &EditorConfig) -> Self {
        Self {
            backend,
            store,
            normalizer: Normalizer::new(config.reference_policy),
            view: ViewModel::new(),
            drag: DragController::new(config.activation_distance),
            rooms: Vec::new(),
            periods: Vec::new(),
            label_failure: config.label_failure,
            pending: FuturesUnordered::new(),
            notices: Vec::new(),
            last_import: None,
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// The last input handed to the backend
    pub fn last_import(&self) -> Option<&Normalized> {
        self.last_import.as_ref()
    }

    /// Legality queries still in flight
    pub fn pending_checks(&self) -> usize {
        self.pending.len()
    }

    fn notify(&mut self, kind: NoticeKind, message: String) {
        warn!("{kind}: {message}");
        self.notices.push(Notice { kind, message });
    }

    /// Replaces the view model with `result`, or logs the failure.
    ///
    /// Snapshots that break the grid invariants are failures too, whichever
    /// backend produced them. `notice` is raised on failure for actions the
    /// user triggered directly.
    fn apply(
        &mut self,
        action: &'static str,
        result: Result<TimeTable, BackendError>,
        notice: Option<NoticeKind>,
    ) -> Result<(), EditorError> {
        let result = result.and_then(|snapshot| {
            snapshot
                .validate()
                .map(|()| snapshot)
                .map_err(|source| BackendError::InvalidSnapshot {
                    command: action,
                    source,
                })
        });

        match result {
            Ok(snapshot) => {
                debug!(
                    "{action}: {} cells on a {}x{} grid",
                    snapshot.active_cells().count(),
                    snapshot.room_size,
                    snapshot.period_size
                );
                self.view.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                error!("{action} failed: {e}");
                if let Some(kind) = notice {
                    self.notify(kind, format!("{action} failed: {e}"));
                }
                Err(e.into())
            }
        }
    }

    // Tables

    /// Stores a freshly imported table, replacing the previous version
    pub fn import_table(
        &mut self,
        table: TableId,
        snapshot: TableSnapshot,
    ) -> Result<(), EditorError> {
        info!("Imported {} rows into {table}", snapshot.rows.len());
        self.store.put(table, snapshot)?;
        Ok(())
    }

    /// Imports all four tables from their CSV files in `dir`
    pub fn import_csv_dir(&mut self, dir: &Path) -> Result<(), EditorError> {
        let tables = csv_table::read_tables_dir(dir)?;
        for table in TableId::all() {
            self.import_table(table, tables.get(table).clone())?;
        }

        Ok(())
    }

    pub fn edit_cell(
        &mut self,
        table: TableId,
        row: usize,
        column: usize,
        value: &str,
    ) -> Result<(), EditorError> {
        self.store.edit_cell(table, row, column, value)?;
        Ok(())
    }

    /// Fetches the backend's copy of `table` into the store
    pub async fn fetch_table(&mut self, table: TableId) -> Result<TableSnapshot, EditorError> {
        let snapshot = self.backend.get_table(table).await.inspect_err(|e| {
            error!("Failed to fetch {table}: {e}");
        })?;
        self.store.put(table, snapshot.clone())?;

        Ok(snapshot)
    }

    /// Normalizes the stored tables and hands the result to the backend
    pub async fn submit_input(&mut self) -> Result<&Normalized, EditorError> {
        let tables = self.store.raw_tables()?;
        let normalized = self.normalizer.normalize(&tables)?;

        self.backend
            .submit_input(&normalized.input)
            .await
            .inspect_err(|e| error!("Failed to submit input: {e}"))?;
        info!("Submitted {} classes", normalized.input.classes.len());

        Ok(&*self.last_import.insert(normalized))
    }

    /// Makes the backend rebuild its solver from the submitted input
    pub async fn reset_input(&mut self) -> Result<(), EditorError> {
        self.backend
            .adapt_input()
            .await
            .inspect_err(|e| error!("Failed to reset input: {e}"))?;
        Ok(())
    }

    // Labels

    pub async fn load_labels(&mut self) {
        let rooms = self.backend.get_rooms().await;
        self.rooms = self.labels_or_fallback("rooms", rooms);

        let periods = self.backend.get_periods().await;
        self.periods = self.labels_or_fallback("periods", periods);
    }

    fn labels_or_fallback(
        &mut self,
        what: &str,
        result: Result<Vec<String>, BackendError>,
    ) -> Vec<String> {
        match result {
            Ok(labels) => labels,
            Err(e) => {
                error!("Failed to fetch {what}: {e}");
                match self.label_failure {
                    LabelFailurePolicy::ShowError => vec![e.to_string()],
                    LabelFailurePolicy::Clear => {
                        self.notify(
                            NoticeKind::LabelsUnavailable,
                            format!("could not load {what}: {e}"),
                        );
                        Vec::new()
                    }
                }
            }
        }
    }

    // Generation

    /// Runs one solving round, continuing from the current schedule if there is one
    pub async fn run_once(&mut self) -> Result<(), EditorError> {
        let result = self.backend.run_once(self.view.seed_cells()).await;
        self.apply("run", result, None)
    }

    pub async fn run_until_no_violations(&mut self) -> Result<(), EditorError> {
        let result = self
            .backend
            .run_until_no_violations(self.view.seed_cells())
            .await;
        self.apply("run until no violations", result, None)
    }

    // Pointer gestures

    /// Primary button down on cell `id`.
    ///
    /// Classes and blanks can both be picked up; ids off the grid or inside
    /// the tail of a multi-period class cannot.
    pub fn pointer_down(&mut self, id: usize, at: Point) -> bool {
        if self.view.cell(id).is_none() {
            return false;
        }

        self.pending.clear();
        self.drag.press(id, at);
        true
    }

    /// Pointer moved to `at` over the cell `over`, if any
    pub fn pointer_move(&mut self, at: Point, over: Option<usize>) -> Option<Intent> {
        let intent = self.drag.move_to(at, over)?;
        if let Intent::CheckLegality { over, active } = intent {
            self.enqueue_check(over, active);
        }

        Some(intent)
    }

    /// Primary button released over the cell `over`, if any
    pub async fn pointer_up(&mut self, over: Option<usize>) -> Result<DropOutcome, EditorError> {
        let intent = self.drag.release(over);
        self.pending.clear();

        match intent {
            Some(Intent::Drop { over, active }) => self.drop_cell(over, active).await,
            _ => Ok(DropOutcome::NoDrop),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
        self.pending.clear();
    }

    /// Secondary button on cell `id` toggles its lock; a drag in progress is unaffected
    pub async fn secondary_click(&mut self, id: usize) -> Result<(), EditorError> {
        match self.drag.secondary(id) {
            Intent::ToggleLock { id } => self.toggle_lock(id).await,
            intent => {
                debug!("Ignoring {intent:?} from secondary click");
                Ok(())
            }
        }
    }

    /// The `(over, active)` pair the backend sees for a gesture from `source` onto `target`.
    ///
    /// The class always moves: a blank dropped onto a class moves that class
    /// onto the blank. `None` when neither end anchors a class.
    fn moving_pair(&self, target: usize, source: usize) -> Option<(usize, usize)> {
        if self.view.active_cell(source).is_some() {
            Some((target, source))
        } else if self.view.active_cell(target).is_some() {
            Some((source, target))
        } else {
            None
        }
    }

    fn enqueue_check(&mut self, over: usize, active: usize) {
        let backend = Arc::clone(&self.backend);
        let pair = self.moving_pair(over, active);
        self.pending.push(Box::pin(async move {
            let result = match pair {
                Some((over, active)) => legality(backend.as_ref(), over, active).await,
                None => Ok(false),
            };
            LegalityCheck {
                over,
                active,
                result,
            }
        }));
    }

    /// Waits for the next legality query to finish and applies its answer
    pub async fn settle_one(&mut self) -> Option<LegalityCheck> {
        let check = self.pending.next().await?;

        match &check.result {
            Ok(allowed) => self.drag.legality_resolved(*allowed),
            Err(e) => warn!(
                "Legality check of {} onto {} failed: {e}",
                check.active, check.over
            ),
        }

        Some(check)
    }

    /// Applies every outstanding legality query in completion order
    pub async fn settle_all(&mut self) -> usize {
        let mut settled = 0;
        while self.settle_one().await.is_some() {
            settled += 1;
        }

        settled
    }

    // Schedule edits

    /// Drops the cell `active` onto `over` after asking the backend again.
    ///
    /// Whichever of the two anchors a class is the one that moves.
    pub async fn drop_cell(
        &mut self,
        over: usize,
        active: usize,
    ) -> Result<DropOutcome, EditorError> {
        let Some((over, active)) = self.moving_pair(over, active) else {
            info!("Nothing to move between {active} and {over}");
            return Ok(DropOutcome::Refused);
        };

        let allowed = match legality(self.backend.as_ref(), over, active).await {
            Ok(allowed) => allowed,
            Err(e) => {
                self.notify(NoticeKind::SwapFailed, format!("could not check move: {e}"));
                return Err(e.into());
            }
        };

        if !allowed {
            info!("Move of {active} onto {over} refused");
            return Ok(DropOutcome::Refused);
        }

        let result = self.backend.swap_cell(over, active).await;
        self.apply("swap", result, Some(NoticeKind::SwapFailed))?;

        Ok(DropOutcome::Swapped)
    }

    pub async fn toggle_lock(&mut self, id: usize) -> Result<(), EditorError> {
        let result = self.backend.switch_lock(id).await;
        self.apply("lock", result, Some(NoticeKind::LockFailed))
    }

    pub async fn lock_cells(&mut self, over: usize, active: usize) -> Result<(), EditorError> {
        let result = self.backend.lock_cells(over, active).await;
        self.apply("lock", result, Some(NoticeKind::LockFailed))
    }

    pub async fn lock_non_violated(&mut self) -> Result<(), EditorError> {
        let result = self.backend.lock_non_violated().await;
        self.apply("lock", result, Some(NoticeKind::LockFailed))
    }

    pub async fn unlock_violated(&mut self) -> Result<(), EditorError> {
        let result = self.backend.unlock_violated().await;
        self.apply("unlock", result, Some(NoticeKind::LockFailed))
    }

    // Snapshots and tuning

    pub async fn save_snapshot(&mut self) -> Result<(), EditorError> {
        self.backend
            .save_snapshot()
            .await
            .inspect_err(|e| error!("Failed to save timetable: {e}"))?;
        Ok(())
    }

    pub async fn load_snapshot(&mut self) -> Result<(), EditorError> {
        let result = self.backend.load_snapshot().await;
        self.apply("load", result, None)
    }

    pub async fn performance(&self) -> Result<Metric, EditorError> {
        let metric = self
            .backend
            .calc_performance()
            .await
            .inspect_err(|e| error!("Failed to compute performance: {e}"))?;
        info!("Performance: {metric}");

        Ok(metric)
    }

    pub async fn nudge_weight(
        &self,
        class_id: usize,
        room_id: usize,
        period_id: usize,
    ) -> Result<(), EditorError> {
        self.backend
            .nudge_weight(class_id, room_id, period_id)
            .await
            .inspect_err(|e| error!("Failed to nudge class {class_id}: {e}"))?;
        Ok(())
    }

    /// Nudges the class anchored at `id` toward where it currently sits
    pub async fn nudge_cell(&self, id: usize) -> Result<(), EditorError> {
        let cell = self.view.active_cell(id).ok_or(EditorError::NoSuchCell(id))?;
        let class_id = cell.class_index.ok_or(EditorError::NoSuchCell(id))?;

        self.nudge_weight(class_id, cell.room, cell.period).await
    }
}
