//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        Self::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::Infra(InfraError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Parse { .. } => crate::exitcode::DATAERR,
                InfraError::Xml { .. } => crate::exitcode::CANTCREAT,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::InvalidPattern { .. } => crate::exitcode::USAGE,
                    ApplicationError::NothingSelected(_) => crate::exitcode::DATAERR,
                    ApplicationError::Domain(DomainError::MalformedDocument { .. }) => {
                        crate::exitcode::DATAERR
                    }
                    _ => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_errors_when_mapping_exit_codes_then_sysexits_apply() {
        let parse = CliError::from(InfraError::Parse {
            path: "a.xml".into(),
            source: DomainError::malformed("x"),
        });
        let config = CliError::from(ApplicationError::Config {
            message: "x".into(),
        });
        let io = CliError::from(InfraError::io(
            "read",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        ));

        assert_eq!(parse.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(config.exit_code(), crate::exitcode::CONFIG);
        assert_eq!(io.exit_code(), crate::exitcode::IOERR);
        assert_eq!(CliError::Usage("x".into()).exit_code(), crate::exitcode::USAGE);
    }
}
