//! crates/docurp_core/src/catalog.rs
//!
//! A user's document listing and its partition into MIME-type families.
//! Families are derived at display time and never persisted.

use crate::domain::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFamily {
    Pdf,
    Word,
    Excel,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 3] = [DocumentFamily::Pdf, DocumentFamily::Word, DocumentFamily::Excel];

    /// Maps a MIME type onto its family. Types outside the three families yield `None`.
    pub fn classify(mime_type: &str) -> Option<Self> {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            Some(Self::Pdf)
        } else if mime.contains("word") && !mime.contains("sheet") {
            Some(Self::Word)
        } else if mime.contains("excel") || mime.contains("sheet") || mime.contains("spreadsheet") {
            Some(Self::Excel)
        } else {
            None
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
        }
    }
}

/// The documents of one identity, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    documents: Vec<Document>,
}

impl Catalog {
    pub fn new(mut documents: Vec<Document>) -> Self {
        // stable, so equal timestamps keep the store's order
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { documents }
    }

    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn family(&self, family: DocumentFamily) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| DocumentFamily::classify(&d.mime_type) == Some(family))
            .collect()
    }

    /// Documents that belong to no family. They are still listed and deletable.
    pub fn uncategorized(&self) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| DocumentFamily::classify(&d.mime_type).is_none())
            .collect()
    }

    /// Case-insensitive substring match over filename and description.
    ///
    /// A blank term returns the whole catalog, so clearing the search restores the full view.
    pub fn search(&self, term: &str) -> Catalog {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.clone();
        }
        let documents = self
            .documents
            .iter()
            .filter(|d| {
                d.filename.to_lowercase().contains(&term)
                    || d
                        .description
                        .as_deref()
                        .is_some_and(|desc| desc.to_lowercase().contains(&term))
            })
            .cloned()
            .collect();
        Catalog { documents }
    }
}
