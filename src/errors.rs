use crate::parsers::Rule;
use std::{fmt, io};

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// Remote `zfs` reported that the dataset does not exist. Carries the message as printed.
        DatasetNotFound(msg: String) {
            display("dataset does not exist: {}", msg)
        }
        /// Remote `zpool` reported that the pool does not exist.
        PoolNotFound(msg: String) {
            display("no such pool: {}", msg)
        }
        /// `zpool list -v` returned nothing at all, not even the pool line.
        PoolLayoutUnavailable(pool: String) {
            display("failed to read pool layout of {}", pool)
        }
        /// Anything else remote side printed on stderr.
        RemoteCommand(stderr: String) {
            display("remote command failed: {}", stderr)
        }
        /// Connection failure or the command didn't finish in time.
        Transport(err: io::Error) {
            cause(err)
            display("transport failure: {}", err)
        }
        PropertyModeInvalid(mode: String) {
            display("invalid value {} for property_mode", mode)
        }
        PropertyOverrideConflict(name: String) {
            display("don't set '{}' as a property block, use the dedicated attribute instead", name)
        }
        Parse(msg: String) {
            display("failed to parse output: {}", msg)
        }
        UnsupportedDatasetType { kind: String, guid: String } {
            display("unsupported zfs dataset type {} with guid {}", kind, guid)
        }
        /// Nothing with that guid on the remote host.
        ResourceNotFound(guid: String) {
            display("no resource found with guid {}", guid)
        }
        InvalidInput(msg: String) {
            display("invalid input: {}", msg)
        }
        InvalidConfig(msg: String) {
            display("invalid configuration: {}", msg)
        }
        /// Operation that was attempted when `err` happened.
        Context { operation: String, err: Box<Error> } {
            cause(err)
            display("{}: {}", operation, err)
        }
    }
}

impl From<pest::error::Error<Rule>> for Error {
    fn from(err: pest::error::Error<Rule>) -> Error { Error::Parse(err.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DatasetNotFound(_) => ErrorKind::DatasetNotFound,
            Error::PoolNotFound(_) => ErrorKind::PoolNotFound,
            Error::PoolLayoutUnavailable(_) => ErrorKind::PoolLayoutUnavailable,
            Error::RemoteCommand(_) => ErrorKind::RemoteCommand,
            Error::Transport(_) => ErrorKind::Transport,
            Error::PropertyModeInvalid(_) => ErrorKind::PropertyModeInvalid,
            Error::PropertyOverrideConflict(_) => ErrorKind::PropertyOverrideConflict,
            Error::Parse(_) => ErrorKind::Parse,
            Error::UnsupportedDatasetType { .. } => ErrorKind::UnsupportedDatasetType,
            Error::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Context { err, .. } => err.kind(),
        }
    }

    /// Classify whatever the remote side printed on stderr. Order matters: the first match wins.
    pub(crate) fn from_stderr(stderr: &str) -> Self {
        let message = stderr.trim_end().to_string();
        if stderr.contains("dataset does not exist") {
            Error::DatasetNotFound(message)
        } else if stderr.contains("no such pool") {
            Error::PoolNotFound(message)
        } else {
            Error::RemoteCommand(stderr.to_string())
        }
    }

    pub(crate) fn timed_out() -> Self {
        Error::Transport(io::Error::new(io::ErrorKind::TimedOut, "command timed out"))
    }

    /// Prefix the error with the operation that was attempted.
    pub fn context<O: Into<String>>(self, operation: O) -> Self {
        Error::Context { operation: operation.into(), err: Box::new(self) }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorKind {
    DatasetNotFound,
    PoolNotFound,
    PoolLayoutUnavailable,
    RemoteCommand,
    Transport,
    PropertyModeInvalid,
    PropertyOverrideConflict,
    Parse,
    UnsupportedDatasetType,
    ResourceNotFound,
    InvalidInput,
    InvalidConfig,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool { self.kind() == other.kind() }
}

/// Create failed, but the thing might exist anyway. `zfs create` and `zpool create` can leave a
/// dataset or pool behind when a later step of the same command fails, so whatever could be
/// described afterwards travels with the original error.
#[derive(Debug, Getters)]
#[get = "pub"]
pub struct CreateFailure<T> {
    error:    Error,
    existing: Option<T>,
}

impl<T> CreateFailure<T> {
    pub(crate) fn new(error: Error, existing: Option<T>) -> Self { CreateFailure { error, existing } }

    pub fn into_parts(self) -> (Error, Option<T>) { (self.error, self.existing) }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CreateFailure<U> {
        CreateFailure { error: self.error, existing: self.existing.map(f) }
    }
}

impl<T> From<Error> for CreateFailure<T> {
    fn from(error: Error) -> Self { CreateFailure { error, existing: None } }
}

impl<T> fmt::Display for CreateFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.error.fmt(f) }
}

impl<T: fmt::Debug> std::error::Error for CreateFailure<T> {}

pub type CreateResult<T> = std::result::Result<T, CreateFailure<T>>;

#[cfg(test)]
mod test {
    use super::{Error, ErrorKind};

    #[test]
    fn test_error_ds_not_found() {
        let stderr = "cannot open 's/asd/asd': dataset does not exist\n";

        let err = Error::from_stderr(stderr);
        assert_eq!(ErrorKind::DatasetNotFound, err.kind());
        if let Error::DatasetNotFound(msg) = err {
            assert_eq!("cannot open 's/asd/asd': dataset does not exist", msg);
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn test_error_no_such_pool() {
        let err = Error::from_stderr("cannot open 'tank': no such pool\n");
        assert_eq!(ErrorKind::PoolNotFound, err.kind());
    }

    #[test]
    fn test_dataset_wins_over_pool() {
        let err = Error::from_stderr("no such pool\ndataset does not exist");
        assert_eq!(ErrorKind::DatasetNotFound, err.kind());
    }

    #[test]
    fn test_error_rubbish() {
        let stderr = "there is no way there is an error like this";

        let err = Error::from_stderr(stderr);
        assert_eq!(Error::RemoteCommand(stderr.to_string()), err);
        assert_eq!(ErrorKind::RemoteCommand, err.kind());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let err = Error::from_stderr("Dataset Does Not Exist");
        assert_eq!(ErrorKind::RemoteCommand, err.kind());
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = Error::from_stderr("cannot open 'tank': no such pool").context("reading zpool tank");
        assert_eq!(ErrorKind::PoolNotFound, err.kind());
        assert_eq!("reading zpool tank: no such pool: cannot open 'tank': no such pool", err.to_string());
    }
}
