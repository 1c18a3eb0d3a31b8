#![allow(dead_code)]

use async_trait::async_trait;
use editor::backend::{Backend, BackendError, Command, Metric};
use models::{
    entity::Input,
    grid::{Coordinate, GridShape},
    table::{TableId, TableSnapshot},
    timetable::{ActiveCell, TimeTable},
};
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
    time::Duration,
};

/// Everything the fake backend knows, open for tests to inspect and tweak
#[derive(Debug, Default)]
pub struct FakeState {
    pub shape: GridShape,
    pub rooms: Vec<String>,
    pub periods: Vec<String>,
    pub input: Option<Input>,
    pub adapted: bool,
    pub timetable: Option<TimeTable>,
    pub saved: Option<TimeTable>,
    pub tables: HashMap<TableId, TableSnapshot>,
    /// Length of the seed each run received, `None` for unseeded runs
    pub seeds: Vec<Option<usize>>,
    pub nudges: Vec<(usize, usize, usize)>,
    pub calls: Vec<&'static str>,
    pub failing: HashSet<&'static str>,
    /// Delay before answering a legality query for (over, active)
    pub delays: HashMap<(usize, usize), Duration>,
}

/// An in-process stand-in for the scheduling backend.
///
/// Runs place class `i` at room `i % rooms`, period `i / rooms`. Moves, locks
/// and legality follow the real backend's rules on the stored timetable.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(shape: GridShape) -> Self {
        let state = FakeState {
            shape,
            rooms: (0..shape.room_size).map(|r| format!("R{}", r + 1)).collect(),
            periods: (0..shape.period_size).map(|p| format!("P{}", p + 1)).collect(),
            ..FakeState::default()
        };

        Self {
            state: Mutex::new(state),
        }
    }

    /// A backend that already holds `timetable`
    pub fn with_timetable(timetable: TimeTable) -> Self {
        let backend = Self::new(timetable.shape());
        backend.state().timetable = Some(timetable);
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, command: Command) {
        self.state().failing.insert(command.as_str());
    }

    pub fn delay_check(&self, over: usize, active: usize, delay: Duration) {
        self.state().delays.insert((over, active), delay);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn called(&self, command: Command) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|&&name| name == command.as_str())
            .count()
    }

    fn begin(&self, command: Command) -> Result<MutexGuard<'_, FakeState>, BackendError> {
        let mut state = self.state();
        state.calls.push(command.as_str());

        if state.failing.contains(command.as_str()) {
            return Err(BackendError::Rejected(format!("{} failed", command.as_str())));
        }
        Ok(state)
    }

    fn timetable(state: &mut FakeState) -> Result<&mut TimeTable, BackendError> {
        state
            .timetable
            .as_mut()
            .ok_or_else(|| BackendError::Rejected("No timetable found".into()))
    }

    fn generate(
        &self,
        command: Command,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(command)?;
        state.seeds.push(seed.map(<[_]>::len));

        let input = state
            .input
            .clone()
            .filter(|_| state.adapted)
            .ok_or_else(|| BackendError::Rejected("No ACOSolver".into()))?;
        let shape = state.shape;

        let mut timetable = TimeTable::new(shape);
        for (i, class) in input.classes.iter().enumerate() {
            let coordinate = Coordinate::new(i % shape.room_size, i / shape.room_size);
            let teacher_names = class
                .teacher_indexes
                .iter()
                .map(|r| r.resolved().and_then(|t| input.teachers.get(t)))
                .map(|t| t.map(|t| t.name.clone()).unwrap_or_default())
                .collect();
            let student_group_names = class
                .students_group_indexes
                .iter()
                .map(|r| r.resolved().and_then(|g| input.student_groups.get(g)))
                .map(|g| g.map(|g| g.name.clone()).unwrap_or_default())
                .collect();

            timetable.class_list.push(Some(ActiveCell {
                id: shape.to_linear_id(coordinate),
                room: coordinate.room,
                period: coordinate.period,
                size: 1,
                class_index: Some(i),
                class_name: class.name.clone(),
                teacher_names,
                student_group_names,
                student_count: class.num_of_students,
                color_hex: Some("#ffffff".into()),
                is_locked: false,
                violations: None,
            }));
        }

        state.timetable = Some(timetable.clone());
        Ok(timetable)
    }

    fn swappable(timetable: &TimeTable, over: usize, active: usize) -> Result<bool, BackendError> {
        if over == active {
            return Ok(false);
        }

        let shape = timetable.shape();
        let cell = timetable
            .active_cell(active)
            .ok_or_else(|| BackendError::Rejected(format!("no class at {active}")))?;
        let target = shape
            .to_coordinate(over)
            .ok_or_else(|| BackendError::Rejected(format!("{over} is off the grid")))?;

        let occupancy = timetable.occupancy();
        for period in target.period..target.period + cell.size {
            if period >= shape.period_size {
                return Ok(false);
            }
            let unit = shape.to_linear_id(Coordinate::new(target.room, period));
            if occupancy[unit].is_some_and(|id| id != active) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn set_lock(cell: &mut ActiveCell, locked: bool) {
        cell.is_locked = locked;
        cell.color_hex = Some(if locked { "#aaaaff" } else { "#ffffff" }.into());
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_rooms(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.begin(Command::GetRooms)?.rooms.clone())
    }

    async fn get_periods(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.begin(Command::GetPeriods)?.periods.clone())
    }

    async fn submit_input(&self, input: &Input) -> Result<(), BackendError> {
        let mut state = self.begin(Command::SetInput)?;
        state.input = Some(input.clone());
        state.adapted = false;
        Ok(())
    }

    async fn adapt_input(&self) -> Result<(), BackendError> {
        let mut state = self.begin(Command::AdaptInput)?;
        if state.input.is_none() {
            return Err(BackendError::Rejected("no input!".into()));
        }
        state.adapted = true;
        Ok(())
    }

    async fn run_once(
        &self,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError> {
        self.generate(Command::RunOnce, seed)
    }

    async fn run_until_no_violations(
        &self,
        seed: Option<&[Option<ActiveCell>]>,
    ) -> Result<TimeTable, BackendError> {
        self.generate(Command::RunUntilNoViolations, seed)
    }

    async fn switch_lock(&self, id: usize) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::SwitchLock)?;
        let timetable = Self::timetable(&mut state)?;

        let cell = timetable
            .class_list
            .iter_mut()
            .flatten()
            .find(|cell| cell.id == id)
            .ok_or_else(|| BackendError::Rejected(format!("no class at {id}")))?;
        let locked = !cell.is_locked;
        Self::set_lock(cell, locked);

        Ok(timetable.clone())
    }

    async fn is_swappable(&self, over_id: usize, active_id: usize) -> Result<bool, BackendError> {
        let delay = {
            let state = self.begin(Command::IsSwappable)?;
            state.delays.get(&(over_id, active_id)).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        Self::swappable(Self::timetable(&mut state)?, over_id, active_id)
    }

    async fn swap_cell(
        &self,
        over_id: usize,
        active_id: usize,
    ) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::SwapCell)?;
        let timetable = Self::timetable(&mut state)?;
        let shape = timetable.shape();
        let target = shape
            .to_coordinate(over_id)
            .ok_or_else(|| BackendError::Rejected(format!("{over_id} is off the grid")))?;

        let cell = timetable
            .class_list
            .iter_mut()
            .flatten()
            .find(|cell| cell.id == active_id)
            .ok_or_else(|| BackendError::Rejected(format!("no class at {active_id}")))?;
        cell.id = over_id;
        cell.room = target.room;
        cell.period = target.period;

        Ok(timetable.clone())
    }

    async fn lock_cells(
        &self,
        over_id: usize,
        active_id: usize,
    ) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::LockCells)?;
        let timetable = Self::timetable(&mut state)?;

        for cell in timetable.class_list.iter_mut().flatten() {
            if cell.id == over_id || cell.id == active_id {
                Self::set_lock(cell, true);
            }
        }

        Ok(timetable.clone())
    }

    async fn lock_non_violated(&self) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::LockNonViolated)?;
        let timetable = Self::timetable(&mut state)?;

        for cell in timetable.class_list.iter_mut().flatten() {
            if !cell.is_violated() {
                Self::set_lock(cell, true);
            }
        }

        Ok(timetable.clone())
    }

    async fn unlock_violated(&self) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::UnlockViolated)?;
        let timetable = Self::timetable(&mut state)?;

        for cell in timetable.class_list.iter_mut().flatten() {
            if cell.is_violated() {
                Self::set_lock(cell, false);
            }
        }

        Ok(timetable.clone())
    }

    async fn save_snapshot(&self) -> Result<(), BackendError> {
        let mut state = self.begin(Command::SaveSnapshot)?;
        let timetable = Self::timetable(&mut state)?.clone();
        state.saved = Some(timetable);
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<TimeTable, BackendError> {
        let mut state = self.begin(Command::LoadSnapshot)?;
        let saved = state
            .saved
            .clone()
            .ok_or_else(|| BackendError::Rejected("No saved timetable".into()))?;
        state.timetable = Some(saved.clone());
        Ok(saved)
    }

    async fn calc_performance(&self) -> Result<Metric, BackendError> {
        let mut state = self.begin(Command::CalcPerformance)?;
        let timetable = Self::timetable(&mut state)?;
        let violated = timetable.active_cells().filter(|c| c.is_violated()).count();

        Ok(json!({ "cells": timetable.active_cells().count(), "violated": violated }))
    }

    async fn get_table(&self, table: TableId) -> Result<TableSnapshot, BackendError> {
        let state = self.begin(Command::GetTable)?;
        state
            .tables
            .get(&table)
            .cloned()
            .ok_or_else(|| BackendError::Rejected(format!("no {table} table")))
    }

    async fn nudge_weight(
        &self,
        class_id: usize,
        room_id: usize,
        period_id: usize,
    ) -> Result<(), BackendError> {
        let mut state = self.begin(Command::NudgeWeight)?;
        state.nudges.push((class_id, room_id, period_id));
        Ok(())
    }
}
