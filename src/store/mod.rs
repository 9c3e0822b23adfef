// Store module entry point
// Students and selections held in memory, flushed to the data file after every mutation

mod export;
mod persist;
mod types;

use chrono::{Local, NaiveDateTime, SubsecRound};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::StoreError;

pub use export::write_selections_csv;
pub use types::{Database, Selection, Stats, Student, Upsert};

/// Two-table store backed by a JSON data file
pub struct Store {
    /// Path to the data file
    path: PathBuf,
    /// Current contents, always equal to what was last written
    data: Database,
}

impl Store {
    /// Open the store, loading existing data if the file is present
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = persist::load(&path)?;
        Ok(Self { path, data })
    }

    pub fn students(&self) -> &[Student] {
        &self.data.students
    }

    pub fn selections(&self) -> &[Selection] {
        &self.data.selections
    }

    pub fn is_registered(&self, reg: &str) -> bool {
        self.data.students.iter().any(|s| s.reg == reg)
    }

    /// Find a student whose `reg` and `dob` both match after trimming
    pub fn find_student(&self, reg: &str, dob: &str) -> Option<&Student> {
        let (reg, dob) = (reg.trim(), dob.trim());
        self.data
            .students
            .iter()
            .find(|s| s.reg == reg && s.dob == dob)
    }

    pub fn has_selection(&self, reg: &str) -> bool {
        self.data.selections.iter().any(|s| s.reg == reg)
    }

    /// Register a new student
    pub fn add_student(&mut self, reg: &str, dob: &str) -> Result<Student, StoreError> {
        let (reg, dob) = (reg.trim(), dob.trim());
        if reg.is_empty() || dob.is_empty() {
            return Err(StoreError::MissingFields(
                "Register number and DOB are required",
            ));
        }
        if self.is_registered(reg) {
            return Err(StoreError::DuplicateStudent(reg.to_string()));
        }

        let student = Student {
            reg: reg.to_string(),
            dob: dob.to_string(),
            added_at: now(),
        };

        self.commit(|db| db.students.push(student.clone()))?;
        Ok(student)
    }

    /// Remove a student and any selection it owns
    pub fn delete_student(&mut self, reg: &str) -> Result<Student, StoreError> {
        let Some(index) = self.data.students.iter().position(|s| s.reg == reg) else {
            return Err(StoreError::StudentNotFound(reg.to_string()));
        };

        let removed = self.data.students[index].clone();
        self.commit(|db| {
            db.students.remove(index);
            db.selections.retain(|s| s.reg != removed.reg);
        })?;
        Ok(removed)
    }

    /// Create or overwrite the selection for `reg`
    ///
    /// An existing entry is replaced in place so export order stays stable.
    /// The student is not required to be registered.
    pub fn upsert_selection(
        &mut self,
        reg: &str,
        nme: &str,
        activity: &str,
    ) -> Result<Upsert, StoreError> {
        let (reg, nme, activity) = (reg.trim(), nme.trim(), activity.trim());
        if reg.is_empty() || nme.is_empty() || activity.is_empty() {
            return Err(StoreError::MissingFields("Missing fields"));
        }

        let entry = Selection {
            reg: reg.to_string(),
            nme: nme.to_string(),
            activity: activity.to_string(),
            timestamp: Some(now()),
        };

        let existing = self.data.selections.iter().position(|s| s.reg == reg);
        self.commit(|db| match existing {
            Some(i) => db.selections[i] = entry,
            None => db.selections.push(entry),
        })?;

        Ok(if existing.is_some() {
            Upsert::Replaced
        } else {
            Upsert::Created
        })
    }

    /// Tally selections per `nme` and per `activity`
    pub fn stats(&self) -> Stats {
        let mut nme_breakdown = BTreeMap::new();
        let mut activity_breakdown = BTreeMap::new();
        for s in &self.data.selections {
            *nme_breakdown.entry(s.nme.clone()).or_insert(0) += 1;
            *activity_breakdown.entry(s.activity.clone()).or_insert(0) += 1;
        }

        Stats {
            total_students: self.data.students.len(),
            total_submitted: self.data.selections.len(),
            nme_breakdown,
            activity_breakdown,
        }
    }

    /// Apply `mutate` to a copy, persist it, then swap it in
    fn commit(&mut self, mutate: impl FnOnce(&mut Database)) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        mutate(&mut next);
        persist::save(&self.path, &next)?;
        self.data = next;
        Ok(())
    }
}

/// Local wall-clock time at the precision the data file keeps
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}
