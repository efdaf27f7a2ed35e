/// A raw FMI status code, shared by FMI 1.0 and 2.0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[default]
    OK,
    Warning,
    Discard,
    Error,
    Fatal,
    /// Only valid for asynchronous Co-Simulation; unexpected from a Model-Exchange call.
    Pending,
}

impl Status {
    /// Convert to [`Result<FmiRes, FmiError>`]
    #[inline]
    pub fn ok(self) -> Result<FmiRes, FmiError> {
        self.into()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error | Status::Fatal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmiRes {
    /// All well
    OK,
    /// Things are not quite right, but the computation can continue. The FMU logger was called
    /// with an explanation.
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FmiError {
    /// It is recommended to perform a smaller step size and evaluate the model equations again,
    /// for example because an iterative solver in the model did not converge. If this is not
    /// possible, the simulation has to be terminated.
    #[error("Discard")]
    Discard,
    /// The FMU encountered an error. The simulation cannot be continued with this FMU instance.
    #[error("Error")]
    Error,
    /// The model computations are irreparably corrupted for all FMU instances.
    #[error("Fatal")]
    Fatal,
    /// A Model-Exchange call answered with the asynchronous `Pending` status.
    #[error("Unexpected Pending status")]
    Pending,
    /// A string argument could not be handed to the FMU.
    #[error("String contains an interior nul byte")]
    InvalidString,
    /// The value-reference and value slices handed to a bulk get/set differ in length.
    #[error("{refs} value references but {values} values")]
    LengthMismatch { refs: usize, values: usize },
}

impl FmiError {
    /// Guard for bulk get/set calls, which pass a single count for both arrays.
    pub fn check_lengths(refs: usize, values: usize) -> Result<(), FmiError> {
        if refs == values {
            Ok(())
        } else {
            Err(FmiError::LengthMismatch { refs, values })
        }
    }
}

impl From<Status> for Result<FmiRes, FmiError> {
    fn from(status: Status) -> Self {
        match status {
            Status::OK => Ok(FmiRes::OK),
            Status::Warning => Ok(FmiRes::Warning),
            Status::Discard => Err(FmiError::Discard),
            Status::Error => Err(FmiError::Error),
            Status::Fatal => Err(FmiError::Fatal),
            Status::Pending => Err(FmiError::Pending),
        }
    }
}

impl From<FmiError> for Status {
    fn from(err: FmiError) -> Self {
        match err {
            FmiError::Discard => Status::Discard,
            FmiError::Error | FmiError::InvalidString | FmiError::LengthMismatch { .. } => {
                Status::Error
            }
            FmiError::Fatal => Status::Fatal,
            FmiError::Pending => Status::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_normalization() {
        assert_eq!(Status::OK.ok(), Ok(FmiRes::OK));
        assert_eq!(Status::Warning.ok(), Ok(FmiRes::Warning));
        assert_eq!(Status::Discard.ok(), Err(FmiError::Discard));
        assert_eq!(Status::Fatal.ok(), Err(FmiError::Fatal));
        assert_eq!(Status::Pending.ok(), Err(FmiError::Pending));
        assert!(Status::Error.is_error());
        assert!(!Status::Discard.is_error());
    }

    #[test]
    fn test_length_guard() {
        assert_eq!(FmiError::check_lengths(2, 2), Ok(()));
        assert_eq!(
            FmiError::check_lengths(2, 1),
            Err(FmiError::LengthMismatch { refs: 2, values: 1 })
        );
        assert_eq!(
            Status::from(FmiError::LengthMismatch { refs: 0, values: 3 }),
            Status::Error
        );
    }
}
