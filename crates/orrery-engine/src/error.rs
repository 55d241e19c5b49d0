use thiserror::Error;

/// Errors surfaced by the session lifecycle layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured container could not be resolved to a live element.
    ///
    /// Raised synchronously during construction, before any GPU resource is
    /// touched.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// An accessor was consulted while the corresponding field is absent,
    /// i.e. before initialization completed or after teardown.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    /// Construction failed partway through. Whatever was partially built has
    /// already been torn down when this is returned.
    #[error("session initialization failed")]
    Init(#[source] anyhow::Error),

    /// A render hook or draw call failed during a frame tick. The loop stops
    /// scheduling further ticks; the session itself stays alive until
    /// `destroy()` is called.
    #[error("frame tick failed")]
    Render(#[source] anyhow::Error),
}
