use crate::physics::{BodyKey, Kind};

/// Errors from building or validating a level.
///
/// Nothing in the per-tick simulation returns these;
/// they only come out of spawning, linking and parameter validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Tunnel {tunnel_id:?} has {count} portals, expected exactly 2")]
    UnpairedTunnel { tunnel_id: String, count: usize },
    #[error("Body {0:?} does not exist")]
    MissingBody(BodyKey),
    #[error("Body {key:?} is {found:?}, expected {expected:?}")]
    WrongKind {
        key: BodyKey,
        expected: Kind,
        found: Kind,
    },
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Recipe refers to entry {0}, which is not a linkable mechanism")]
    UnknownRecipeTarget(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for parameter validation.
pub(crate) fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(Error::InvalidParams(msg()))
    }
}
