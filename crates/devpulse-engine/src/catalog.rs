use tracing::{debug, instrument};

use devpulse_core::ids::ProgramId;
use devpulse_core::EnrollError;
use devpulse_store::cohorts::{Cohort, CohortRepo};
use devpulse_store::programs::{Program, ProgramRepo, ProgramUpdate};
use devpulse_store::Database;

use crate::populate::{AutoPopulator, PopulateTrigger};

/// Cohort and program lifecycle. Every create or update runs the
/// auto-populator for the touched entity, the way the admin tooling's
/// save hooks do.
pub struct CatalogService {
    db: Database,
    populator: AutoPopulator,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self {
            populator: AutoPopulator::new(db.clone()),
            db,
        }
    }

    #[instrument(skip(self))]
    pub fn create_cohort(&self, name: &str, auto_populate: bool) -> Result<Cohort, EnrollError> {
        let cohort = CohortRepo::new(self.db.clone()).create(name, auto_populate)?;
        let paired = self.populator.run(&PopulateTrigger::Cohort(cohort.clone()))?;
        debug!(cohort_id = %cohort.id, paired, "cohort created");
        Ok(cohort)
    }

    #[instrument(skip(self))]
    pub fn create_program(
        &self,
        name: &str,
        prerequisite: i64,
        auto_populate: bool,
    ) -> Result<Program, EnrollError> {
        let program = ProgramRepo::new(self.db.clone()).create(name, prerequisite, auto_populate)?;
        let paired = self.populator.run(&PopulateTrigger::Program(program.clone()))?;
        debug!(program_id = %program.id, paired, "program created");
        Ok(program)
    }

    /// Apply a partial update, then re-run population so a program that
    /// just opted in gets paired. The populator's own guard keeps
    /// already-paired programs untouched.
    #[instrument(skip(self, update), fields(program_id = %id))]
    pub fn update_program(
        &self,
        id: &ProgramId,
        update: &ProgramUpdate,
    ) -> Result<Program, EnrollError> {
        let program = ProgramRepo::new(self.db.clone()).update(id, update)?;
        let paired = self.populator.run(&PopulateTrigger::Program(program.clone()))?;
        debug!(program_id = %program.id, paired, "program updated");
        Ok(program)
    }
}
