use annotate_snippets::{
    display_list::{DisplayList, FormatOptions},
    snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation},
};
use tern_evaluator::{FileId, Level, SourceLoc};

use super::DiagnosticsContext;

fn annotation_type(level: Level) -> AnnotationType {
    match level {
        Level::Error => AnnotationType::Error,
        Level::Warning => AnnotationType::Warning,
        Level::Note => AnnotationType::Note,
    }
}

struct Label {
    contents: Option<String>,
    level: Level,
    loc: SourceLoc,
}

impl<'label> From<&'label Label> for SourceAnnotation<'label> {
    fn from(label: &'label Label) -> Self {
        SourceAnnotation {
            label: label.contents.as_deref().unwrap_or(""),
            range: (label.loc.span.start, label.loc.span.end()),
            annotation_type: annotation_type(label.level),
        }
    }
}

struct Footer {
    contents: String,
    level: Level,
}

impl<'footer> From<&'footer Footer> for Annotation<'footer> {
    fn from(footer: &'footer Footer) -> Self {
        Annotation {
            label: Some(&footer.contents),
            id: None,
            annotation_type: annotation_type(footer.level),
        }
    }
}

#[must_use = "must emit the diagnostic for it to be seen"]
pub struct DiagnosticBuilder<'ctx, 'files> {
    title: String,
    level: Level,
    labels: Vec<Label>,
    footers: Vec<Footer>,
    context: &'ctx DiagnosticsContext<'files>,
}

impl<'ctx, 'files> DiagnosticBuilder<'ctx, 'files> {
    pub(super) fn new(
        title: String,
        level: Level,
        context: &'ctx DiagnosticsContext<'files>,
    ) -> Self {
        Self {
            title,
            level,
            labels: Vec::new(),
            footers: Vec::new(),
            context,
        }
    }

    /// Add a label to a highlighted location with the `Level::Note` level.
    pub fn note_label(self, loc: SourceLoc, message: impl ToString) -> Self {
        self.label(loc, Level::Note, Some(message.to_string()))
    }

    /// Highlight the given location with the current error level and no
    /// label.
    pub fn with_loc(self, loc: SourceLoc) -> Self {
        let level = self.level;
        self.label(loc, level, None)
    }

    /// Labels that cannot be drawn under the source become footers, so a
    /// file with no text or an empty span still gets its message shown.
    fn label(mut self, loc: SourceLoc, level: Level, contents: Option<String>) -> Self {
        if loc.span.is_empty() || self.context.file(loc.file).is_none() {
            let origin = self.context.origin(loc.file);

            self.footers.push(Footer {
                contents: match contents {
                    Some(contents) => format!("{} (in {})", contents, origin),
                    None => format!("in {}", origin),
                },
                level,
            });
        } else {
            self.labels.push(Label {
                contents,
                level,
                loc,
            });
        }

        self
    }

    /// Adds a `note: ...` footer.
    pub fn note(mut self, message: impl ToString) -> Self {
        self.footers.push(Footer {
            contents: message.to_string(),
            level: Level::Note,
        });
        self
    }

    /// Files with labels in them, in the order they were first labelled.
    fn labelled_files(&self) -> Vec<FileId> {
        let mut files = Vec::new();

        for label in &self.labels {
            if !files.contains(&label.loc.file) {
                files.push(label.loc.file);
            }
        }

        files
    }

    pub fn render(&self, color: bool) -> String {
        let slices = self
            .labelled_files()
            .into_iter()
            .filter_map(|id| self.context.file(id))
            .map(|file| Slice {
                source: file.text(),
                line_start: 1,
                origin: Some(file.name()),
                fold: true,
                annotations: self
                    .labels
                    .iter()
                    .filter(|label| label.loc.file == file.id())
                    .map(SourceAnnotation::from)
                    .collect(),
            })
            .collect();

        let snippet = Snippet {
            title: Some(Annotation {
                label: Some(&self.title),
                id: None,
                annotation_type: annotation_type(self.level),
            }),

            footer: self.footers.iter().map(Annotation::from).collect(),
            slices,

            opt: FormatOptions {
                color,
                ..Default::default()
            },
        };

        DisplayList::from(snippet).to_string()
    }

    pub fn emit(self) {
        eprintln!("{}", self.render(true));
    }
}
