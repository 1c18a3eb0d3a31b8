use async_trait::async_trait;
use models::{
    entity::Input,
    table::{TableId, TableSnapshot},
    timetable::{ActiveCell, SnapshotError, TimeTable},
};
use strum::{EnumIter, IntoStaticStr};
use thiserror::Error;

pub mod http;

pub use http::HttpBackend;

/// Opaque performance figure reported by the backend
pub type Metric = serde_json::Value;

/// Commands understood by the scheduling backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum Command {
    #[strum(serialize = "handle_get_rooms")]
    GetRooms,
    #[strum(serialize = "handle_get_periods")]
    GetPeriods,
    #[strum(serialize = "handle_set_input")]
    SetInput,
    #[strum(serialize = "handle_adapt_input")]
    AdaptInput,
    #[strum(serialize = "handle_read_cells")]
    ReadCells,
    #[strum(serialize = "handle_aco_run_once")]
    RunOnce,
    #[strum(serialize = "handle_aco_run_no_violations")]
    RunUntilNoViolations,
    #[strum(serialize = "handle_switch_lock")]
    SwitchLock,
    #[strum(serialize = "is_swappable")]
    IsSwappable,
    #[strum(serialize = "handle_swap_cell")]
    SwapCell,
    #[strum(serialize = "handle_lock_cells")]
    LockCells,
    #[strum(serialize = "handle_lock_no_violation")]
    LockNonViolated,
    #[strum(serialize = "handle_unlock_violation")]
    UnlockViolated,
    #[strum(serialize = "dump_timetable")]
    SaveSnapshot,
    #[strum(serialize = "load_timetable")]
    LoadSnapshot,
    #[strum(serialize = "handle_calc_performance")]
    CalcPerformance,
    #[strum(serialize = "handle_get_table")]
    GetTable,
    #[strum(serialize = "handle_one_hot_pheromone")]
    NudgeWeight,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{command} returned status {status}: {message}")]
    Status {
        command: &'static str,
        status: u16,
        message: String,
    },
    #[error("could not decode reply to {command}: {source}")]
    Decode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{command} returned an invalid timetable: {source}")]
    InvalidSnapshot {
        command: &'static str,
        #[source]
        source: SnapshotError,
    },
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
    /// The backend understood the command but refused it
    #[error("{0}")]
    Rejected(String),
}

/// The remote scheduling engine.
///
/// Every command that changes the schedule answers with the complete new
/// snapshot; the caller replaces its local copy with it.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Room labels in room order
    async fn get_rooms(&self) -> Result<Vec<String>, BackendError>;

    /// Period labels in period order
    async fn get_periods(&self) -> Result<Vec<String>, BackendError>;

    /// Replaces the backend's problem input
    async fn submit_input(&self, input: &Input) -> Result<(), BackendError>;

    /// Rebuilds the solver from the current input, discarding learned state
    async fn adapt_input(&self) -> Result<(), BackendError>;

    /// Runs one solving round. `seed` is the current schedule to continue from.
    async fn run_once(&self, seed: Option<&[Option<ActiveCell>]>)
    -> Result<TimeTable, BackendError>;

    async fn run_until_no_violations(
        &self,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError>;

    /// Flips the lock of the cell whose anchor id is `id`
    async fn switch_lock(&self, id: usize) -> Result<TimeTable, BackendError>;

    /// Whether the class anchored at `active_id` may move to `over_id`
    async fn is_swappable(&self, over_id: usize, active_id: usize) -> Result<bool, BackendError>;

    async fn swap_cell(&self, over_id: usize, active_id: usize)
    -> Result<TimeTable, BackendError>;

    async fn lock_cells(&self, over_id: usize, active_id: usize)
    -> Result<TimeTable, BackendError>;

    async fn lock_non_violated(&self) -> Result<TimeTable, BackendError>;

    async fn unlock_violated(&self) -> Result<TimeTable, BackendError>;

    async fn save_snapshot(&self) -> Result<(), BackendError>;

    async fn load_snapshot(&self) -> Result<TimeTable, BackendError>;

    async fn calc_performance(&self) -> Result<Metric, BackendError>;

    /// The backend's own copy of one input table
    async fn get_table(&self, table: TableId) -> Result<TableSnapshot, BackendError>;

    /// Biases the solver toward placing `class_id` at (`room_id`, `period_id`)
    async fn nudge_weight(
        &self,
        class_id: usize,
        room_id: usize,
        period_id: usize,
    ) -> Result<(), BackendError>;
}
