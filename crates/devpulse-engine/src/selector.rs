use chrono::{DateTime, Utc};
use tracing::instrument;

use devpulse_core::ids::CohortProgramId;
use devpulse_core::EnrollError;
use devpulse_store::cohort_programs::{CohortProgram, CohortProgramRepo};
use devpulse_store::programs::ProgramRepo;
use devpulse_store::{Database, StoreError};

/// Pick the cohort-program a new trainee is enrolled into.
///
/// An invite that pins a schedule wins outright, even when its start date
/// lies in the future; a pinned reference that no longer resolves falls
/// back to the default selection. That default resolves the entry program
/// (prerequisite rank 0) and picks the latest already-started pairing of
/// it; pairings without a start date count as started now. Ties on start
/// date keep the earliest-created pairing.
#[instrument(skip(db, explicit))]
pub fn select_cohort_program(
    db: &Database,
    explicit: Option<&CohortProgramId>,
    now: DateTime<Utc>,
) -> Result<CohortProgram, EnrollError> {
    if let Some(id) = explicit {
        match CohortProgramRepo::new(db.clone()).get(id) {
            Ok(pairing) => return Ok(pairing),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let programs = ProgramRepo::new(db.clone());
    let entry = programs
        .find_by_prerequisite(0)?
        .ok_or(EnrollError::NoEntryProgram)?;
    // The id is re-resolved through the display name, so a rename between
    // the two lookups surfaces as a missing entry program.
    let entry_id = programs
        .id_by_name(&entry.name)?
        .ok_or(EnrollError::NoEntryProgram)?;

    let mut best: Option<CohortProgram> = None;
    for pairing in CohortProgramRepo::new(db.clone()).all()? {
        if pairing.program_id != entry_id || pairing.effective_start(now) > now {
            continue;
        }
        let replaces = match &best {
            Some(current) => pairing.effective_start(now) > current.effective_start(now),
            None => true,
        };
        if replaces {
            best = Some(pairing);
        }
    }

    best.ok_or(EnrollError::NoEligibleCohortProgram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devpulse_core::ids::{CohortId, ProgramId};
    use devpulse_store::cohort_programs::NewCohortProgram;
    use devpulse_store::cohorts::CohortRepo;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (Database, CohortId, ProgramId) {
        let db = Database::in_memory().unwrap();
        let cohort = CohortRepo::new(db.clone()).create("Cohort 23", true).unwrap();
        let program = ProgramRepo::new(db.clone()).create("Bootcamp", 0, true).unwrap();
        (db, cohort.id, program.id)
    }

    fn pair(
        db: &Database,
        cohort_id: &CohortId,
        program_id: &ProgramId,
        start: Option<DateTime<Utc>>,
    ) -> CohortProgram {
        CohortProgramRepo::new(db.clone())
            .create(&NewCohortProgram {
                cohort_id: cohort_id.clone(),
                program_id: program_id.clone(),
                start_date: start,
                auto_populate: true,
            })
            .unwrap()
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn no_programs_means_no_entry_program() {
        let db = Database::in_memory().unwrap();
        let result = select_cohort_program(&db, None, now());
        assert_eq!(result.unwrap_err(), EnrollError::NoEntryProgram);
    }

    #[test]
    fn entry_program_without_pairings_is_ineligible() {
        let (db, _, _) = setup();
        let result = select_cohort_program(&db, None, now());
        assert_eq!(result.unwrap_err(), EnrollError::NoEligibleCohortProgram);
    }

    #[test]
    fn future_dated_pairings_are_filtered_out() {
        let (db, cohort_id, program_id) = setup();
        pair(&db, &cohort_id, &program_id, Some(at(2024, 1, 1)));

        let result = select_cohort_program(&db, None, now());
        assert_eq!(result.unwrap_err(), EnrollError::NoEligibleCohortProgram);
    }

    #[test]
    fn picks_the_latest_started_pairing() {
        let (db, cohort_id, program_id) = setup();
        pair(&db, &cohort_id, &program_id, Some(at(2023, 1, 1)));
        let june = pair(&db, &cohort_id, &program_id, Some(at(2023, 6, 1)));
        pair(&db, &cohort_id, &program_id, Some(at(2023, 3, 1)));

        let selected = select_cohort_program(&db, None, now()).unwrap();
        assert_eq!(selected.id, june.id);
    }

    #[test]
    fn undated_pairing_counts_as_started_now() {
        let (db, cohort_id, program_id) = setup();
        let undated = pair(&db, &cohort_id, &program_id, None);
        pair(&db, &cohort_id, &program_id, Some(at(2023, 1, 1)));

        // An undated pairing is treated as starting at the selection
        // instant, so it outranks anything dated earlier.
        let selected = select_cohort_program(&db, None, now()).unwrap();
        assert_eq!(selected.id, undated.id);
    }

    #[test]
    fn ties_keep_the_earliest_created_pairing() {
        let (db, cohort_id, program_id) = setup();
        let first = pair(&db, &cohort_id, &program_id, Some(at(2023, 6, 1)));
        pair(&db, &cohort_id, &program_id, Some(at(2023, 6, 1)));

        let selected = select_cohort_program(&db, None, now()).unwrap();
        assert_eq!(selected.id, first.id);
    }

    #[test]
    fn only_entry_program_pairings_are_considered() {
        let (db, cohort_id, _) = setup();
        let advanced = ProgramRepo::new(db.clone())
            .create("Apprenticeship", 1, true)
            .unwrap();
        pair(&db, &cohort_id, &advanced.id, Some(at(2023, 6, 1)));

        let result = select_cohort_program(&db, None, now());
        assert_eq!(result.unwrap_err(), EnrollError::NoEligibleCohortProgram);
    }

    #[test]
    fn explicit_schedule_overrides_selection() {
        let (db, cohort_id, program_id) = setup();
        pair(&db, &cohort_id, &program_id, Some(at(2023, 6, 1)));
        // Pinned to a future-dated pairing; the date filter does not apply.
        let pinned = pair(&db, &cohort_id, &program_id, Some(at(2024, 1, 1)));

        let selected = select_cohort_program(&db, Some(&pinned.id), now()).unwrap();
        assert_eq!(selected.id, pinned.id);
    }

    #[test]
    fn unresolvable_schedule_falls_back_to_default() {
        let (db, cohort_id, program_id) = setup();
        let started = pair(&db, &cohort_id, &program_id, Some(at(2023, 6, 1)));

        let ghost = CohortProgramId::from_raw("cp_ghost");
        let selected = select_cohort_program(&db, Some(&ghost), now()).unwrap();
        assert_eq!(selected.id, started.id);
    }

    #[test]
    fn unresolvable_schedule_with_empty_catalog_still_fails() {
        let db = Database::in_memory().unwrap();
        let ghost = CohortProgramId::from_raw("cp_ghost");
        let result = select_cohort_program(&db, Some(&ghost), now());
        assert_eq!(result.unwrap_err(), EnrollError::NoEntryProgram);
    }
}
