use super::{Backend, BackendError, Command, Metric};
use async_trait::async_trait;
use log::{debug, warn};
use models::{
    entity::Input,
    table::{TableId, TableSnapshot},
    timetable::{ActiveCell, TimeTable},
};
use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

/// Talks to a scheduling backend that accepts each command as a JSON `POST`
/// to `{base_url}/{command}`.
///
/// Arguments travel as a camelCase JSON object, replies are the JSON encoding
/// of the command's result. Every returned timetable is validated before it
/// is handed to the caller.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, command: Command) -> String {
        format!("{}/{}", self.base_url, command.as_str())
    }

    async fn call<B, T>(&self, command: Command, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let name = command.as_str();
        debug!("Calling {name}");

        let response = self.client.post(self.url(command)).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        decode_reply(command, status, &bytes)
    }

    async fn call_timetable<B>(&self, command: Command, body: &B) -> Result<TimeTable, BackendError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let timetable = self.call(command, body).await?;
        checked_timetable(command, timetable)
    }

    /// Hands the current schedule to the solver before a run
    async fn seed(&self, seed: Option<&[Option<ActiveCell>]>) -> Result<(), BackendError> {
        if let Some(cells) = seed {
            self.call::<_, ()>(Command::ReadCells, &json!({ "cells": cells }))
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_rooms(&self) -> Result<Vec<String>, BackendError> {
        self.call(Command::GetRooms, &json!({})).await
    }

    async fn get_periods(&self) -> Result<Vec<String>, BackendError> {
        self.call(Command::GetPeriods, &json!({})).await
    }

    async fn submit_input(&self, input: &Input) -> Result<(), BackendError> {
        self.call(Command::SetInput, &json!({ "input": input })).await
    }

    async fn adapt_input(&self) -> Result<(), BackendError> {
        self.call(Command::AdaptInput, &json!({})).await
    }

    async fn run_once(
        &self,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError> {
        self.seed(seed).await?;
        self.call_timetable(Command::RunOnce, &json!({})).await
    }

    async fn run_until_no_violations(
        &self,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError> {
        self.seed(seed).await?;
        self.call_timetable(Command::RunUntilNoViolations, &json!({}))
            .await
    }

    async fn switch_lock(&self, id: usize) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::SwitchLock, &json!({ "id": id }))
            .await
    }

    async fn is_swappable(&self, over_id: usize, active_id: usize) -> Result<bool, BackendError> {
        self.call(Command::IsSwappable, &pair(over_id, active_id))
            .await
    }

    async fn swap_cell(
        &self,
        over_id: usize,
        active_id: usize,
    ) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::SwapCell, &pair(over_id, active_id))
            .await
    }

    async fn lock_cells(
        &self,
        over_id: usize,
        active_id: usize,
    ) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::LockCells, &pair(over_id, active_id))
            .await
    }

    async fn lock_non_violated(&self) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::LockNonViolated, &json!({}))
            .await
    }

    async fn unlock_violated(&self) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::UnlockViolated, &json!({}))
            .await
    }

    async fn save_snapshot(&self) -> Result<(), BackendError> {
        self.call(Command::SaveSnapshot, &json!({})).await
    }

    async fn load_snapshot(&self) -> Result<TimeTable, BackendError> {
        self.call_timetable(Command::LoadSnapshot, &json!({})).await
    }

    async fn calc_performance(&self) -> Result<Metric, BackendError> {
        self.call(Command::CalcPerformance, &json!({})).await
    }

    async fn get_table(&self, table: TableId) -> Result<TableSnapshot, BackendError> {
        self.call(Command::GetTable, &json!({ "tableType": table.as_str() }))
            .await
    }

    async fn nudge_weight(
        &self,
        class_id: usize,
        room_id: usize,
        period_id: usize,
    ) -> Result<(), BackendError> {
        let body = json!({ "classId": class_id, "roomId": room_id, "periodId": period_id });
        self.call(Command::NudgeWeight, &body).await
    }
}

fn pair(over_id: usize, active_id: usize) -> serde_json::Value {
    json!({ "overId": over_id, "activeId": active_id })
}

/// Turns the status and body of a reply to `command` into its result
fn decode_reply<T: DeserializeOwned>(
    command: Command,
    status: StatusCode,
    bytes: &[u8],
) -> Result<T, BackendError> {
    let name = command.as_str();

    if !status.is_success() {
        let message = String::from_utf8_lossy(bytes).trim().to_string();
        warn!("{name} failed with {status}: {message}");

        return Err(match status {
            StatusCode::NOT_FOUND => BackendError::Unsupported(name),
            s if s.is_client_error() && !message.is_empty() => BackendError::Rejected(message),
            s => BackendError::Status {
                command: name,
                status: s.as_u16(),
                message,
            },
        });
    }

    // Commands without a result may answer with an empty body
    let payload: &[u8] = if bytes.is_empty() { b"null" } else { bytes };
    serde_json::from_slice(payload).map_err(|source| BackendError::Decode {
        command: name,
        source,
    })
}

fn checked_timetable(command: Command, timetable: TimeTable) -> Result<TimeTable, BackendError> {
    timetable
        .validate()
        .map_err(|source| BackendError::InvalidSnapshot {
            command: command.as_str(),
            source,
        })?;

    Ok(timetable)
}
