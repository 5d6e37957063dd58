//! The character-encoding repair plan and its report types.
//!
//! After a restore from a legacy dump, a known set of text columns comes
//! back with the wrong type/collation and Turkish characters render as
//! mojibake. The repair is a fixed, ordered plan over four tables; each
//! (table, column) pair is one independent unit of work. The plan itself is
//! pure data -- the `api` crate drives it against the store.

use serde::Serialize;

/// Target collation for all repaired columns (Turkish, ICU).
pub const TARGET_COLLATION: &str = "tr-TR-x-icu";

/// The `data_type` string information-schema reports for the target type.
pub const TARGET_DATA_TYPE: &str = "character varying";

/// One column the repair plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairTarget {
    /// Step number in the overall procedure (step 1 is the collation
    /// diagnostic, step 6 the final verification).
    pub step: u32,
    pub table: &'static str,
    pub column: &'static str,
    /// Target `varchar` length.
    pub max_len: i32,
}

/// The fixed repair plan, in execution order. Do not reorder: step numbers
/// and the final verification snapshot depend on this sequence.
pub const REPAIR_PLAN: &[RepairTarget] = &[
    // Step 2: atms
    RepairTarget { step: 2, table: "atms", column: "name", max_len: 200 },
    RepairTarget { step: 2, table: "atms", column: "address", max_len: 500 },
    RepairTarget { step: 2, table: "atms", column: "district", max_len: 100 },
    // Step 3: banks
    RepairTarget { step: 3, table: "banks", column: "name", max_len: 200 },
    RepairTarget { step: 3, table: "banks", column: "city", max_len: 100 },
    // Step 4: maintenance_records
    RepairTarget { step: 4, table: "maintenance_records", column: "description", max_len: 1000 },
    RepairTarget { step: 4, table: "maintenance_records", column: "technician_name", max_len: 200 },
    // Step 5: work_orders
    RepairTarget { step: 5, table: "work_orders", column: "title", max_len: 300 },
    RepairTarget { step: 5, table: "work_orders", column: "notes", max_len: 1000 },
];

impl RepairTarget {
    /// The `ALTER TABLE` statement that moves this column to the target
    /// type and collation. Table/column names come from the static plan,
    /// never from callers.
    pub fn alter_sql(&self) -> String {
        format!(
            "ALTER TABLE \"{}\" ALTER COLUMN \"{}\" TYPE varchar({}) COLLATE \"{}\"",
            self.table, self.column, self.max_len, TARGET_COLLATION
        )
    }

    /// Whether a column's live metadata already matches this target.
    pub fn is_already_correct(
        &self,
        data_type: &str,
        max_len: Option<i32>,
        collation: Option<&str>,
    ) -> bool {
        data_type == TARGET_DATA_TYPE
            && max_len == Some(self.max_len)
            && collation == Some(TARGET_COLLATION)
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Outcome of one (table, column) repair unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOutcome {
    Altered,
    AlreadyCorrect,
    Error,
}

/// One entry in the repair report, produced once per (table, column) pair.
#[derive(Debug, Clone, Serialize)]
pub struct RepairStepReport {
    pub step_number: u32,
    pub table_name: String,
    pub column_name: String,
    pub before_type: String,
    pub after_type: String,
    pub outcome: RepairOutcome,
    pub message: String,
}

/// Aggregate counters over the whole run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RepairSummary {
    pub total_steps: u32,
    pub successful_steps: u32,
    pub failed_steps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_covers_four_tables_in_step_order() {
        let mut steps: Vec<u32> = REPAIR_PLAN.iter().map(|t| t.step).collect();
        let sorted = steps.clone();
        steps.sort_unstable();
        assert_eq!(steps, sorted, "plan must be in ascending step order");

        let mut tables: Vec<&str> = REPAIR_PLAN.iter().map(|t| t.table).collect();
        tables.dedup();
        assert_eq!(
            tables,
            vec!["atms", "banks", "maintenance_records", "work_orders"]
        );
    }

    #[test]
    fn every_table_has_two_or_three_columns() {
        for table in ["atms", "banks", "maintenance_records", "work_orders"] {
            let n = REPAIR_PLAN.iter().filter(|t| t.table == table).count();
            assert!((2..=3).contains(&n), "{table} has {n} columns");
        }
    }

    #[test]
    fn alter_sql_targets_type_and_collation() {
        let target = &REPAIR_PLAN[0];
        let sql = target.alter_sql();
        assert_eq!(
            sql,
            "ALTER TABLE \"atms\" ALTER COLUMN \"name\" TYPE varchar(200) COLLATE \"tr-TR-x-icu\""
        );
    }

    #[test]
    fn already_correct_requires_type_length_and_collation() {
        let t = &REPAIR_PLAN[0]; // atms.name varchar(200)
        assert!(t.is_already_correct("character varying", Some(200), Some(TARGET_COLLATION)));
        assert!(!t.is_already_correct("text", None, Some(TARGET_COLLATION)));
        assert!(!t.is_already_correct("character varying", Some(100), Some(TARGET_COLLATION)));
        assert!(!t.is_already_correct("character varying", Some(200), Some("en_US.utf8")));
        assert!(!t.is_already_correct("character varying", Some(200), None));
    }
}
