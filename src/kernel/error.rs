use std::fmt;
use std::io;
use std::path::PathBuf;

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug)]
pub enum DirectoryError {
    EmptyName,
    InvalidCharacter(char),
    DuplicateName(String),
    /// Another directory document owns the file; its window was asked to come forward.
    AlreadyOpenElsewhere(PathBuf),
    NotADocument(PathBuf),
    NotOwned(PathBuf),
    Materialize { path: PathBuf, source: io::Error },
    Coordination(io::Error),
    Closed,
}

impl DirectoryError {
    /// User-correctable naming problems, raised before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DirectoryError::EmptyName
                | DirectoryError::InvalidCharacter(_)
                | DirectoryError::DuplicateName(_)
        )
    }

    pub fn is_already_open_elsewhere(&self) -> bool {
        matches!(self, DirectoryError::AlreadyOpenElsewhere(_))
    }

    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            DirectoryError::Materialize { source, .. } => Some(source.kind()),
            DirectoryError::Coordination(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// A copy for fanning one outcome out to several waiters. I/O errors
    /// keep their kind and message but lose any OS payload.
    pub(crate) fn duplicate(&self) -> Self {
        fn copy_io(e: &io::Error) -> io::Error {
            io::Error::new(e.kind(), e.to_string())
        }

        match self {
            DirectoryError::EmptyName => DirectoryError::EmptyName,
            DirectoryError::InvalidCharacter(ch) => DirectoryError::InvalidCharacter(*ch),
            DirectoryError::DuplicateName(name) => DirectoryError::DuplicateName(name.clone()),
            DirectoryError::AlreadyOpenElsewhere(path) => {
                DirectoryError::AlreadyOpenElsewhere(path.clone())
            }
            DirectoryError::NotADocument(path) => DirectoryError::NotADocument(path.clone()),
            DirectoryError::NotOwned(path) => DirectoryError::NotOwned(path.clone()),
            DirectoryError::Materialize { path, source } => DirectoryError::Materialize {
                path: path.clone(),
                source: copy_io(source),
            },
            DirectoryError::Coordination(e) => DirectoryError::Coordination(copy_io(e)),
            DirectoryError::Closed => DirectoryError::Closed,
        }
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::EmptyName => write!(f, "name cannot be empty"),
            DirectoryError::InvalidCharacter(ch) => {
                write!(f, "name cannot contain the character {ch:?}")
            }
            DirectoryError::DuplicateName(name) => {
                write!(f, "an item named \"{name}\" already exists")
            }
            DirectoryError::AlreadyOpenElsewhere(path) => {
                write!(f, "{} is already open in another window", path.display())
            }
            DirectoryError::NotADocument(path) => {
                write!(f, "{} is a directory", path.display())
            }
            DirectoryError::NotOwned(path) => {
                write!(f, "{} is not open in this window", path.display())
            }
            DirectoryError::Materialize { path, source } => {
                write!(f, "could not open {}: {}", path.display(), source)
            }
            DirectoryError::Coordination(e) => write!(f, "{e}"),
            DirectoryError::Closed => write!(f, "directory document is closed"),
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryError::Materialize { source, .. } => Some(source),
            DirectoryError::Coordination(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DirectoryError {
    fn from(e: io::Error) -> Self {
        DirectoryError::Coordination(e)
    }
}
