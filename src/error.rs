use thiserror::Error;

/// Domain-specific errors for the solver core.
#[derive(Error, Debug)]
pub enum TimetableError {
    // Input / parse errors
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    // Model compiler errors
    #[error("subject '{subject_id}' assigned to classroom '{classroom_id}' of a level it has no eligible teacher for")]
    LevelMismatch {
        subject_id: String,
        classroom_id: String,
    },

    #[error("subject '{subject_id}' has no eligible teacher for classroom '{classroom_id}'")]
    NoEligibleTeacher {
        subject_id: String,
        classroom_id: String,
    },

    #[error("classroom '{classroom_id}' weekly demand ({demand}) exceeds weekly capacity ({capacity})")]
    CapacityExceeded {
        classroom_id: String,
        demand: u32,
        capacity: u32,
    },

    #[error("subject '{subject_id}': block_hours + triple_block_hours exceeds weekly_hours, or block_hours/triple_block_hours has the wrong parity")]
    BlockSumInvalid { subject_id: String },

    #[error("fixed assignment for classroom '{classroom_id}' targets an out-of-range day/period")]
    FixedOutOfRange { classroom_id: String },

    #[error("pinned teacher '{teacher_id}' is not qualified for subject '{subject_id}'")]
    PinUnqualified {
        teacher_id: String,
        subject_id: String,
    },

    #[error("duplicate {id_type} id: '{id}'")]
    DuplicateId { id_type: String, id: String },

    // Search outcome errors
    #[error("no feasible solution found: {reason}")]
    Infeasible { reason: String },

    #[error("solve cancelled")]
    Cancelled,

    #[error("CP backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("exact solver failed: {0}")]
    SolverFailed(String),
}

/// Use `anyhow::Result` at application boundaries, matching the teacher's
/// own `type Result<T> = anyhow::Result<T>;`.
pub type Result<T> = anyhow::Result<T>;
