use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("canvas must have positive size, got {width}x{height}")]
    EmptyCanvas { width: f64, height: f64 },
    #[error("boundary margin {margin} leaves no room inside a {width}x{height} canvas")]
    MarginTooLarge { margin: f64, width: f64, height: f64 },
    #[error("time step must be positive, got {0}")]
    TimeStep(f64),
    #[error("damping must lie in [0, 1], got {0}")]
    Damping(f64),
    #[error("epsilon must be positive, got {0}")]
    Epsilon(f64),
    #[error("frame interval must be at least 1ms")]
    FrameInterval,
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid layout config: {0}")]
    Config(#[from] ConfigError),
    #[error("{kind} entity with an empty id")]
    EmptyId { kind: &'static str },
    #[error("duplicate local entity id {0:?}")]
    DuplicateLocal(String),
    #[error("duplicate global entity id {id:?} (families {first:?} and {second:?})")]
    DuplicateGlobal {
        id: String,
        first: String,
        second: String,
    },
    #[error("layout loop aborted: {0}")]
    LoopAborted(String),
}
