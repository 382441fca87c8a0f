//! Typed errors for asset, target and installer management.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised when a mapping-domain expression cannot be translated into a
/// binding query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("Unknown asset mapping field: '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' does not hold a map and cannot be accessed by key")]
    KeyAccessNotSupported(String),

    #[error("Comparison on field '{field}' requires a string value")]
    NonStringOperand { field: String },
}

/// Domain errors of the asset, target and installer managers.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Install target '{0}' does not exist")]
    NoSuchTarget(String),

    #[error("No default install target is configured")]
    NoDefaultTarget,

    #[error("Installer '{0}' does not exist")]
    NoSuchInstaller(String),

    #[error("Asset mapping {0} does not exist")]
    NoSuchAssetMapping(Uuid),

    #[error("Asset mapping {0} already exists")]
    DuplicateAssetMapping(Uuid),

    #[error("Installer '{0}' is built in and cannot be changed or removed")]
    BuiltinInstaller(String),

    #[error("Invalid asset mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid installer: {0}")]
    InvalidInstaller(String),

    #[error("Invalid install target: {0}")]
    InvalidTarget(String),

    #[error("Installer '{installer}' has no parameter '{parameter}'")]
    NoSuchParameter { installer: String, parameter: String },

    #[error("Installer '{installer}' requires parameter '{parameter}'")]
    MissingParameter { installer: String, parameter: String },

    #[error("Asset mapping {uuid} is not installable: {reason}")]
    NotInstallable { uuid: Uuid, reason: String },

    #[error("Cannot generate URL for '{path}': {reason}")]
    CannotGenerateUrl { path: String, reason: String },
}
