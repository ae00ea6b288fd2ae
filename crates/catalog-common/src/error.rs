/// Error types shared by the catalog crates.
///
/// These cover infrastructure failures (snapshot persistence, Redis) that sit below the
/// catalog domain. Application-specific errors are defined in the binary crate and wrap
/// `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis unavailable, snapshot not written")]
    RedisUnavailable,

    #[error("snapshot io error: {0}")]
    SnapshotIo(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    SnapshotJson(#[from] serde_json::Error),
}
