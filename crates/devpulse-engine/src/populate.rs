use tracing::{debug, instrument};

use devpulse_core::EnrollError;
use devpulse_store::cohort_programs::{CohortProgramRepo, NewCohortProgram};
use devpulse_store::cohorts::{Cohort, CohortRepo};
use devpulse_store::programs::{Program, ProgramRepo};
use devpulse_store::Database;

/// The entity whose creation (or update) kicks off auto-population.
#[derive(Clone, Debug)]
pub enum PopulateTrigger {
    Cohort(Cohort),
    Program(Program),
}

impl PopulateTrigger {
    fn auto_populate(&self) -> bool {
        match self {
            Self::Cohort(cohort) => cohort.auto_populate,
            Self::Program(program) => program.auto_populate,
        }
    }
}

/// Pairs a newly created cohort with every opted-in program (and vice
/// versa), so the catalog stays combinatorially connected without manual
/// pairing.
///
/// The guard is coarse: a trigger that already participates in any pairing
/// is skipped wholesale, so counterparts added after the trigger's first
/// run are never paired retroactively through this path.
pub struct AutoPopulator {
    db: Database,
}

impl AutoPopulator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run population for one trigger. Returns how many pairings were
    /// created; zero when the trigger opted out or was already paired.
    #[instrument(skip(self, trigger))]
    pub fn run(&self, trigger: &PopulateTrigger) -> Result<usize, EnrollError> {
        if !trigger.auto_populate() {
            return Ok(0);
        }

        let pairings = CohortProgramRepo::new(self.db.clone());
        let mut created = 0;

        match trigger {
            PopulateTrigger::Cohort(cohort) => {
                if pairings.count_for_cohort(&cohort.id)? > 0 {
                    debug!(cohort_id = %cohort.id, "cohort already paired, skipping");
                    return Ok(0);
                }
                for program in ProgramRepo::new(self.db.clone()).all()? {
                    if !program.auto_populate {
                        continue;
                    }
                    pairings.create(&NewCohortProgram {
                        cohort_id: cohort.id.clone(),
                        program_id: program.id,
                        start_date: None,
                        auto_populate: true,
                    })?;
                    created += 1;
                }
            }
            PopulateTrigger::Program(program) => {
                if pairings.count_for_program(&program.id)? > 0 {
                    debug!(program_id = %program.id, "program already paired, skipping");
                    return Ok(0);
                }
                for cohort in CohortRepo::new(self.db.clone()).all()? {
                    if !cohort.auto_populate {
                        continue;
                    }
                    pairings.create(&NewCohortProgram {
                        cohort_id: cohort.id,
                        program_id: program.id.clone(),
                        start_date: None,
                        auto_populate: true,
                    })?;
                    created += 1;
                }
            }
        }

        debug!(created, "auto-population finished");
        Ok(created)
    }
}
