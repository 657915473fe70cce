//! Application-level errors

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
