#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write rendered output: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T = ()> = Result<T, RenderError>;
