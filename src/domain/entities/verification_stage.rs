/// Progress of a single notification through verification. Stages are passed
/// strictly in declaration order; any failure ends the run with the error
/// that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerificationStage {
    Unverified,
    HeaderChecked,
    TypeChecked,
    CertificateFetched,
    ChainValidated,
    SubjectValidated,
    SignatureValidated,
}

impl VerificationStage {
    /// The stage that follows this one, or `None` once verification is
    /// complete.
    pub fn next(self) -> Option<Self> {
        use VerificationStage::*;
        match self {
            Unverified => Some(HeaderChecked),
            HeaderChecked => Some(TypeChecked),
            TypeChecked => Some(CertificateFetched),
            CertificateFetched => Some(ChainValidated),
            ChainValidated => Some(SubjectValidated),
            SubjectValidated => Some(SignatureValidated),
            SignatureValidated => None,
        }
    }
}
