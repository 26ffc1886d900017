use crate::Hash256;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// The underlying database engine returned an error. The cache treats
    /// this as fatal and never swallows it.
    DBError { message: String },
    /// Neither the cache nor the database holds a state for the block root.
    StateNotFound(Hash256),
    /// A cache bounded at zero entries cannot satisfy its invariants.
    ZeroCacheSize,
}

impl From<DBError> for Error {
    fn from(e: DBError) -> Error {
        Error::DBError { message: e.message }
    }
}

#[derive(Debug)]
pub struct DBError {
    pub message: String,
}

impl DBError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}
