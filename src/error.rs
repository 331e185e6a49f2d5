/// Pipeline stage an error originated from.
///
/// Every stage failure is fatal to the run, but the kind lets callers (and the
/// process exit code) distinguish a network problem from a fit that did not
/// converge or a chart that could not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Ingest,
    EmptySeries,
    Fit,
    Render,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Ingest => 3,
            ErrorKind::EmptySeries => 4,
            ErrorKind::Fit => 5,
            ErrorKind::Render => 6,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn ingest(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ingest, message)
    }

    pub fn empty_series(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptySeries, message)
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fit, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let kinds = [
            ErrorKind::Config,
            ErrorKind::Ingest,
            ErrorKind::EmptySeries,
            ErrorKind::Fit,
            ErrorKind::Render,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn constructors_tag_kind() {
        assert_eq!(AppError::fit("x").kind(), ErrorKind::Fit);
        assert_eq!(AppError::empty_series("x").exit_code(), 4);
        assert_eq!(AppError::ingest("no network").to_string(), "no network");
    }
}
