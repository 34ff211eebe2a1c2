use std::fmt::{Display, Formatter};
use std::io;

/// Host-side failures. The guest has no fault mechanism; anything that
/// lands here aborts the run.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "host I/O failure: {}", err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
