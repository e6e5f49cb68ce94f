use thiserror::Error;

/// Pipeline stage that produced a failure, reported to the caller so
/// CLI output can say where a bad input fell over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Sampling,
    ScaleComputation,
    Layout,
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Metadata => "metadata extraction",
            Stage::Sampling => "latitude sampling",
            Stage::ScaleComputation => "scale computation",
            Stage::Layout => "tick layout",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Error taxonomy for scale-bar generation
///
/// All computation errors surface immediately; nothing is retried and
/// no output file is written once an error occurs.
#[derive(Debug, Error)]
pub enum LatbarError {
    /// Bad or unsupported configuration: unrecognized projection family,
    /// missing extent in projstring mode, clip latitude outside the
    /// sampled range, and similar.
    #[error("configuration error during {stage}: {message}")]
    Configuration { stage: Stage, message: String },

    /// A scale relation produced NaN, infinity, or a division by zero.
    /// Typically a degenerate spheroid or a latitude of origin at a pole
    /// combined with an incompatible central meridian.
    #[error("numeric domain error during {stage}: {message}")]
    NumericDomain { stage: Stage, message: String },

    /// Raster unreadable, geo tags absent, or spatial reference missing.
    #[error("data source error: {message}")]
    DataSource { message: String },

    #[error("i/o error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
}

impl LatbarError {
    pub fn configuration(stage: Stage, message: impl Into<String>) -> Self {
        LatbarError::Configuration {
            stage,
            message: message.into(),
        }
    }

    pub fn numeric(stage: Stage, message: impl Into<String>) -> Self {
        LatbarError::NumericDomain {
            stage,
            message: message.into(),
        }
    }

    pub fn data_source(message: impl Into<String>) -> Self {
        LatbarError::DataSource {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LatbarError>;
