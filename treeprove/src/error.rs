use truthtree::szs::{self, NoSuccessKind};

type Source = Box<dyn std::error::Error>;

/// Failure of a prover run, classified by its SZS status.
pub struct Error {
    kind: NoSuccessKind,
    source: Option<Source>,
}

impl Error {
    pub fn new(kind: NoSuccessKind, source: impl Into<Source>) -> Self {
        let source = Some(source.into());
        Self { kind, source }
    }

    pub fn kind(&self) -> NoSuccessKind {
        self.kind
    }

    /// Details to be reported as SZS output.
    pub fn source(&self) -> Option<&dyn std::error::Error> {
        self.source.as_deref()
    }
}

impl From<NoSuccessKind> for Error {
    fn from(kind: NoSuccessKind) -> Self {
        Self { kind, source: None }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(szs::OsError, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(szs::OsError, e)
    }
}

impl From<truthtree::Error> for Error {
    fn from(e: truthtree::Error) -> Self {
        Self::new(NoSuccessKind::from(&e), e)
    }
}

impl From<truthtree::ParseError> for Error {
    fn from(e: truthtree::ParseError) -> Self {
        Self::from(truthtree::Error::from(e))
    }
}
