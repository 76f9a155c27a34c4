use thiserror::Error;

/// Expected domain failures surfaced by engine operations.
///
/// These are routine outcomes of caller decisions (moving onto an occupied
/// cell, attacking out of range), not exceptional conditions. The display
/// string is the reason the presentation layer shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown unit")]
    UnknownUnit,

    #[error("battle has ended")]
    BattleEnded,

    #[error("cannot move")]
    CannotMove,

    #[error("invalid target")]
    InvalidTarget,

    #[error("out of range")]
    OutOfRange,

    #[error("no valid path")]
    NoValidPath,

    #[error("cannot act")]
    CannotAct,

    #[error("no target")]
    NoTarget,

    #[error("cannot attack ally")]
    CannotAttackAlly,

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, ActionError>;
