/// Result of handing generated source to a native compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    pub diagnostics: String,
}

impl CompileOutcome {
    pub fn succeeded(diagnostics: impl Into<String>) -> Self {
        Self {
            success: true,
            diagnostics: diagnostics.into(),
        }
    }
    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostics: diagnostics.into(),
        }
    }
}

/// An external collaborator that accepts generated C and reports back.
///
/// The library never spawns processes itself; the binary supplies an
/// implementation that drives the system C compiler.
pub trait Toolchain {
    fn compile(&self, source: &str) -> CompileOutcome;
}
