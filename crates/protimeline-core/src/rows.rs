//! Row model builder
//!
//! Converts a role-tagged [`DataTable`] into the normalized, date-sorted
//! list of [`ProjectRow`]s that every later layout stage works from.
//!
//! Optional columns never fail the build: an unbound role, a null cell or an
//! unparseable date simply means the feature is absent for that row. Only the
//! PM assign date is required; rows without one cannot be positioned and are
//! reported in [`RowModel::skipped`] instead of being drawn.
//!
//! Row ids are unique within a model. A host identity that is empty or
//! already taken is replaced by the index-derived `row-N`, suffixed when
//! even that collides.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::{CellValue, DataTable, ProjectRow, Role, RowId, TerminalStatus};

/// Why a source row did not become a [`ProjectRow`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// No column carries the `pmAssign` role
    MissingAssignColumn,
    /// The `pmAssign` cell is null or not a date
    InvalidAssignDate,
}

/// A source row excluded from layout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Position in the source table
    pub index: usize,
    pub project_name: String,
    pub reason: SkipReason,
}

/// Result of a build: drawable rows plus the rows that were left out
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RowModel {
    pub rows: Vec<ProjectRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Builds [`RowModel`]s relative to a fixed "now"
#[derive(Clone, Copy, Debug)]
pub struct RowModelBuilder {
    now: NaiveDate,
}

impl RowModelBuilder {
    pub fn new(now: NaiveDate) -> Self {
        Self { now }
    }

    pub fn now(&self) -> NaiveDate {
        self.now
    }

    /// Build and sort all rows of `table`
    pub fn build(&self, table: &DataTable) -> RowModel {
        let mut model = RowModel::default();
        let mut issued = HashSet::new();

        for index in 0..table.rows.len() {
            match self.build_row(table, index) {
                Ok(mut row) => {
                    row.id = unique_id(table, index, &mut issued);
                    model.rows.push(row);
                }
                Err(skipped) => {
                    warn!(
                        index = skipped.index,
                        project = %skipped.project_name,
                        reason = ?skipped.reason,
                        "row cannot be placed on the timeline"
                    );
                    model.skipped.push(skipped);
                }
            }
        }

        // Stable: rows sharing an assign date keep their input order
        model.rows.sort_by_key(|r| r.pm_assign_date);

        debug!(
            rows = model.rows.len(),
            skipped = model.skipped.len(),
            "built row model"
        );
        model
    }

    fn build_row(&self, table: &DataTable, index: usize) -> Result<ProjectRow, SkippedRow> {
        let project_name = table
            .cell(index, Role::Project)
            .map(CellValue::as_text)
            .unwrap_or_default();

        let pm_assign_date = match table.cell(index, Role::PmAssign) {
            None => {
                return Err(SkippedRow {
                    index,
                    project_name,
                    reason: SkipReason::MissingAssignColumn,
                })
            }
            Some(cell) => cell.as_date().ok_or_else(|| SkippedRow {
                index,
                project_name: project_name.clone(),
                reason: SkipReason::InvalidAssignDate,
            })?,
        };

        let (end_date, has_end_date) = match date_for(table, index, Role::EndDate) {
            Some(end) => (end, true),
            None => (self.now, false),
        };

        let pens_down = date_for(table, index, Role::PensDown);
        let active_program = !has_end_date && pens_down.is_none();

        let transition_to_sustaining = table
            .cell(index, Role::TransitionToSustaining)
            .map(|cell| cell.as_date().unwrap_or(end_date));

        let mut error = table
            .cell(index, Role::Error)
            .is_some_and(CellValue::as_bool);
        if end_date < pm_assign_date {
            warn!(
                index,
                project = %project_name,
                %pm_assign_date,
                %end_date,
                "end date precedes assign date, flagging row as error"
            );
            error = true;
        }

        let id = RowId::from_index(index);
        let terminal = TerminalStatus::derive(&project_name, pens_down.is_some(), active_program);

        Ok(ProjectRow {
            id,
            project_name,
            pm_assign_date,
            end_date,
            has_end_date,
            deal_sign: date_for(table, index, Role::DealSign),
            deal_close: date_for(table, index, Role::DealClose),
            day2: date_for(table, index, Role::Day2),
            pens_down,
            transition_to_sustaining,
            error,
            active_program,
            terminal,
        })
    }
}

/// Host identity of row `index` unless it is blank or already issued
fn unique_id(table: &DataTable, index: usize, issued: &mut HashSet<RowId>) -> RowId {
    let host = table
        .identities
        .get(index)
        .filter(|identity| !identity.is_empty())
        .map(|identity| RowId::new(identity.as_str()));

    if let Some(id) = host {
        if issued.insert(id.clone()) {
            return id;
        }
        warn!(index, identity = %id, "duplicate row identity, using index id");
    }

    let mut id = RowId::from_index(index);
    let mut suffix = 1;
    while !issued.insert(id.clone()) {
        id = RowId::new(format!("row-{index}-{suffix}"));
        suffix += 1;
    }
    id
}

fn date_for(table: &DataTable, index: usize, role: Role) -> Option<NaiveDate> {
    table.cell(index, role).and_then(CellValue::as_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn now() -> NaiveDate {
        date(2020, 3, 15)
    }

    fn full_table() -> DataTable {
        DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
            Column::new("End").role(Role::EndDate),
            Column::new("Deal Sign").role(Role::DealSign),
            Column::new("Deal Close").role(Role::DealClose),
            Column::new("Day 2").role(Role::Day2),
            Column::new("Error").role(Role::Error),
            Column::new("Pens Down").role(Role::PensDown),
            Column::new("TTS").role(Role::TransitionToSustaining),
        ])
    }

    fn cells(values: [CellValue; 9]) -> Vec<CellValue> {
        values.to_vec()
    }

    #[test]
    fn builds_and_sorts_example_projects() {
        let table = full_table()
            .row(cells([
                "eASIC".into(),
                "2018-02-02".into(),
                CellValue::Null,
                "8/7/2018".into(),
                "9/9/2018".into(),
                CellValue::Null,
                false.into(),
                CellValue::Null,
                CellValue::Null,
            ]))
            .row(cells([
                "Altera".into(),
                "2015-06-01".into(),
                "2018-11-30".into(),
                "2015-06-01".into(),
                "2015-07-13".into(),
                CellValue::Null,
                false.into(),
                CellValue::Null,
                CellValue::Null,
            ]));

        let model = RowModelBuilder::new(now()).build(&table);
        let names: Vec<&str> = model.rows.iter().map(|r| r.project_name.as_str()).collect();
        assert_eq!(names, vec!["Altera", "eASIC"]);

        let altera = &model.rows[0];
        assert!(!altera.active_program);
        assert!(altera.has_end_date);
        assert_eq!(altera.end_date, date(2018, 11, 30));
        assert_eq!(altera.deal_close, Some(date(2015, 7, 13)));
        assert_eq!(altera.day2, None);
        assert_eq!(altera.terminal, TerminalStatus::TransitionToSustaining);
        assert_eq!(altera.id, RowId::from_index(1));

        let easic = &model.rows[1];
        assert!(easic.active_program);
        assert!(!easic.has_end_date);
        assert_eq!(easic.end_date, now());
        assert_eq!(easic.terminal, TerminalStatus::ActiveProgram);
        assert!(model.skipped.is_empty());
    }

    #[test]
    fn sort_is_stable_for_equal_assign_dates() {
        let table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["B".into(), "2016-07-20".into()])
        .row(vec!["A".into(), "2015-01-01".into()])
        .row(vec!["C".into(), "2016-07-20".into()])
        .row(vec!["D".into(), "2016-07-20".into()]);

        let model = RowModelBuilder::new(now()).build(&table);
        let names: Vec<&str> = model.rows.iter().map(|r| r.project_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn missing_end_role_means_active() {
        let table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["eASIC".into(), "2018-02-02".into()]);

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert!(row.active_program);
        assert_eq!(row.end_date, now());
        assert!(!row.error);
        assert_eq!(row.pens_down, None);
        assert_eq!(row.transition_to_sustaining, None);
    }

    #[test]
    fn invalid_end_date_means_active() {
        let table = full_table().row(cells([
            "X".into(),
            "2018-02-02".into(),
            "someday".into(),
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
        ]));

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert!(row.active_program);
        assert!(!row.has_end_date);
        assert_eq!(row.end_date, now());
    }

    #[test]
    fn pens_down_overrides_active() {
        let table = full_table().row(cells([
            "Pens Down Test".into(),
            "2016-07-20".into(),
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            "2016-09-20".into(),
            CellValue::Null,
        ]));

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert!(!row.active_program);
        assert_eq!(row.pens_down, Some(date(2016, 9, 20)));
        assert_eq!(row.terminal, TerminalStatus::PensDown);
    }

    #[test]
    fn invalid_pens_down_is_absent() {
        let table = full_table().row(cells([
            "X".into(),
            "2016-07-20".into(),
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            "n/a".into(),
            CellValue::Null,
        ]));

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert_eq!(row.pens_down, None);
        assert!(row.active_program);
    }

    #[test]
    fn transition_falls_back_to_end_date() {
        let base = |tts: CellValue| {
            full_table().row(cells([
                "X".into(),
                "2016-07-20".into(),
                "2017-12-18".into(),
                CellValue::Null,
                CellValue::Null,
                CellValue::Null,
                CellValue::Null,
                CellValue::Null,
                tts,
            ]))
        };
        let builder = RowModelBuilder::new(now());

        let valid = &builder.build(&base("2018-01-05".into())).rows[0];
        assert_eq!(valid.transition_to_sustaining, Some(date(2018, 1, 5)));

        let invalid = &builder.build(&base("pending".into())).rows[0];
        assert_eq!(invalid.transition_to_sustaining, Some(date(2017, 12, 18)));

        let null = &builder.build(&base(CellValue::Null)).rows[0];
        assert_eq!(null.transition_to_sustaining, Some(date(2017, 12, 18)));
    }

    #[test]
    fn error_flag_is_cast_to_bool() {
        let table = full_table().row(cells([
            "MAVinci GmbH".into(),
            "2016-07-20".into(),
            "2017-12-18".into(),
            "2016-09-05".into(),
            "2016-10-01".into(),
            "2017-10-10".into(),
            1.0.into(),
            CellValue::Null,
            CellValue::Null,
        ]));

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert!(row.error);
        assert_eq!(row.day2, Some(date(2017, 10, 10)));
    }

    #[test]
    fn end_before_start_flags_error() {
        let table = full_table().row(cells([
            "Backwards".into(),
            "2019-01-01".into(),
            "2018-01-01".into(),
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            false.into(),
            CellValue::Null,
            CellValue::Null,
        ]));

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert!(row.error);
    }

    #[test]
    fn rows_without_assign_column_are_skipped() {
        let table = DataTable::new(vec![Column::new("Project").role(Role::Project)])
            .row(vec!["Orphan".into()]);

        let model = RowModelBuilder::new(now()).build(&table);
        assert!(model.rows.is_empty());
        assert_eq!(
            model.skipped,
            vec![SkippedRow {
                index: 0,
                project_name: "Orphan".into(),
                reason: SkipReason::MissingAssignColumn,
            }]
        );
    }

    #[test]
    fn rows_with_invalid_assign_date_are_skipped() {
        let table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["Good".into(), "2018-02-02".into()])
        .row(vec!["Bad".into(), CellValue::Null]);

        let model = RowModelBuilder::new(now()).build(&table);
        assert_eq!(model.rows.len(), 1);
        assert_eq!(model.skipped[0].index, 1);
        assert_eq!(model.skipped[0].reason, SkipReason::InvalidAssignDate);
    }

    #[test]
    fn missing_project_role_yields_empty_name() {
        let table = DataTable::new(vec![Column::new("PM Assign").role(Role::PmAssign)])
            .row(vec!["2018-02-02".into()]);

        let row = &RowModelBuilder::new(now()).build(&table).rows[0];
        assert_eq!(row.project_name, "");
        assert_eq!(row.terminal, TerminalStatus::None);
    }

    #[test]
    fn host_identities_become_row_ids() {
        let mut table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["A".into(), "2018-02-02".into()])
        .row(vec!["B".into(), "2017-02-02".into()]);
        table.identities = vec!["sel-a".into(), "sel-b".into()];

        let model = RowModelBuilder::new(now()).build(&table);
        assert_eq!(model.rows[0].id, RowId::new("sel-b"));
        assert_eq!(model.rows[1].id, RowId::new("sel-a"));
    }

    #[test]
    fn duplicate_identities_get_distinct_ids() {
        let mut table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["Alpha".into(), "2016-01-01".into()])
        .row(vec!["Beta".into(), "2017-01-01".into()])
        .row(vec!["Gamma".into(), "2018-01-01".into()]);
        table.identities = vec!["dup".into(), "dup".into(), String::new()];

        let model = RowModelBuilder::new(now()).build(&table);
        let ids: Vec<&str> = model.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "row-1", "row-2"]);
    }

    #[test]
    fn index_ids_avoid_host_identities() {
        let mut table = DataTable::new(vec![
            Column::new("Project").role(Role::Project),
            Column::new("PM Assign").role(Role::PmAssign),
        ])
        .row(vec!["A".into(), "2016-01-01".into()])
        .row(vec!["B".into(), "2017-01-01".into()])
        .row(vec!["C".into(), "2018-01-01".into()]);
        table.identities = vec!["row-1".into()];

        let model = RowModelBuilder::new(now()).build(&table);
        let ids: Vec<&str> = model.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["row-1", "row-1-1", "row-2"]);

        let distinct: HashSet<&RowId> = model.rows.iter().map(|r| &r.id).collect();
        assert_eq!(distinct.len(), model.rows.len());
    }

    #[test]
    fn empty_table_builds_empty_model() {
        let model = RowModelBuilder::new(now()).build(&full_table());
        assert_eq!(model, RowModel::default());
    }
}
