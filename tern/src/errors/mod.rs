mod builder;

use tern_evaluator::{Diagnostic, FileId, Level};

pub use self::builder::DiagnosticBuilder;
use crate::source::{SourceFileRef, SourceFiles};

/// Renders diagnostics against the source files they point into.
pub struct DiagnosticsContext<'files> {
    files: &'files SourceFiles,
}

impl<'files> DiagnosticsContext<'files> {
    pub fn new(files: &'files SourceFiles) -> Self {
        Self { files }
    }

    fn file(&self, id: FileId) -> Option<&'files SourceFileRef> {
        self.files.get(id)
    }

    /// A printable name for `id`, even if it is not one of ours.
    fn origin(&self, id: FileId) -> String {
        match self.file(id) {
            Some(file) => file.name().to_owned(),
            None => id.to_string(),
        }
    }

    /// Groups each error or warning with the notes that follow it.
    pub fn build_all(&self, diagnostics: &[Diagnostic]) -> Vec<DiagnosticBuilder<'_, 'files>> {
        let mut res: Vec<DiagnosticBuilder<'_, 'files>> = Vec::new();

        for diag in diagnostics {
            if diag.level == Level::Note {
                if let Some(builder) = res.pop() {
                    res.push(match diag.loc {
                        Some(loc) => builder.note_label(loc, &diag.message),
                        None => builder.note(&diag.message),
                    });
                    continue;
                }
            }

            let builder = DiagnosticBuilder::new(diag.message.clone(), diag.level, self);

            res.push(match diag.loc {
                Some(loc) => builder.with_loc(loc),
                None => builder,
            });
        }

        res
    }

    pub fn emit_all(&self, diagnostics: &[Diagnostic]) {
        for builder in self.build_all(diagnostics) {
            builder.emit();
        }
    }
}
