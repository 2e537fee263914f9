use crate::ArgsError;
use thiserror::Error;

/// Errors raised by pools, the assembler and the reclaimer.
///
/// All of them are local and synchronous; nothing is retried.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("{pool}: configuration '{alias}' is not registered")]
    ConfigurationNotFound { pool: &'static str, alias: String },

    #[error("{pool}: collection '{alias}' is not registered")]
    CollectionNotFound { pool: &'static str, alias: String },

    #[error("{pool}: collection '{alias}' is already registered")]
    DuplicateCollection { pool: &'static str, alias: String },

    #[error("{pool}: '{alias}' is not available, all {max_amount} instances are active")]
    PoolExhausted {
        pool: &'static str,
        alias: String,
        max_amount: usize,
    },

    #[error("entity type '{alias}' has no max amount and can not be requested explicitly")]
    UncappedExplicitRequest { alias: String },

    #[error("entity type '{alias}' is not a container, can not add children to it")]
    NotAContainer { alias: String },

    #[error("attaching entity {child} under {parent} would make it its own ancestor")]
    CyclicAttachment { parent: String, child: String },

    #[error("reclaiming requires a non-empty identifier")]
    MissingIdentifier,

    #[error("{pool}: object {handle} is already idle")]
    AlreadyIdle { pool: &'static str, handle: String },

    #[error("{pool}: handle {handle} does not refer to a live object")]
    StaleHandle { pool: &'static str, handle: String },

    #[error("failed to configure '{type_id}'")]
    Configure {
        type_id: String,
        #[source]
        source: ArgsError,
    },

    #[error("recipe '{name}' is not registered")]
    RecipeNotFound { name: String },

    #[error("unknown claim mode '{mode}', expected \"type\" or \"configuration\"")]
    UnknownClaimMode { mode: String },
}
