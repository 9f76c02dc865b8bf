/// Typed error hierarchy for invitation and enrollment operations.
/// Classifies failures as validation (caller mistake, surfaced immediately)
/// or not-found (hard failure of registration).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnrollError {
    // Validation — surfaced immediately, never retried
    #[error("please specify the email")]
    MissingEmail,
    #[error("please provide your {0}")]
    MissingField(&'static str),
    #[error("user with email {0} exists")]
    UserExists(String),
    #[error("invite to {0} already sent")]
    InviteAlreadySent(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("email is already taken")]
    EmailTaken,
    #[error("register action is currently disabled")]
    RegistrationDisabled,

    // Not found — registration aborts
    #[error("you're not authorized to register")]
    NotInvited,
    #[error("cannot find user role")]
    RoleNotFound,
    #[error("no entry program is defined")]
    NoEntryProgram,
    #[error("no cohort program has started yet")]
    NoEligibleCohortProgram,
    #[error("not found: {0}")]
    NotFound(String),

    // Entity store failure
    #[error("store error: {0}")]
    Store(String),
}

impl EnrollError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingEmail
                | Self::MissingField(_)
                | Self::UserExists(_)
                | Self::InviteAlreadySent(_)
                | Self::UsernameTaken
                | Self::EmailTaken
                | Self::RegistrationDisabled
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotInvited
                | Self::RoleNotFound
                | Self::NoEntryProgram
                | Self::NoEligibleCohortProgram
                | Self::NotFound(_)
        )
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingEmail => "missing_email",
            Self::MissingField(_) => "missing_field",
            Self::UserExists(_) => "user_exists",
            Self::InviteAlreadySent(_) => "invite_already_sent",
            Self::UsernameTaken => "username_taken",
            Self::EmailTaken => "email_taken",
            Self::RegistrationDisabled => "registration_disabled",
            Self::NotInvited => "not_invited",
            Self::RoleNotFound => "role_not_found",
            Self::NoEntryProgram => "no_entry_program",
            Self::NoEligibleCohortProgram => "no_eligible_cohort_program",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store",
        }
    }
}
