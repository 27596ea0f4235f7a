use crate::models::DocumentRef;

/// Known documents plus the one questions and flashcards target.
#[derive(Debug, Clone, Default)]
pub struct DocumentSelection {
    documents: Vec<DocumentRef>,
    selected: Option<String>,
}

impl DocumentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[DocumentRef] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&DocumentRef> {
        let id = self.selected.as_deref()?;
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.documents.iter().position(|doc| doc.id == id)
    }

    /// Replace the collection with a fresh listing.
    pub fn replace(&mut self, documents: Vec<DocumentRef>) {
        self.documents = documents;
        self.repair();
    }

    /// Add (or refresh) one document, e.g. after an upload.
    pub fn add(&mut self, document: DocumentRef) {
        match self.documents.iter_mut().find(|doc| doc.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
        self.repair();
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.selected = None;
    }

    /// Select by id. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.documents.iter().any(|doc| doc.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Move the selection by `step`, wrapping.
    pub fn cycle(&mut self, step: isize) {
        if self.documents.is_empty() {
            return;
        }
        let len = self.documents.len() as isize;
        let current = self.selected_index().unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.selected = Some(self.documents[next].id.clone());
    }

    // Keep the selection pointing at an existing document: fall back to the
    // first one, or nothing when the collection is empty.
    fn repair(&mut self) {
        let still_present = self
            .selected
            .as_deref()
            .map(|id| self.documents.iter().any(|doc| doc.id == id))
            .unwrap_or(false);
        if !still_present {
            self.selected = self.documents.first().map(|doc| doc.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> DocumentRef {
        DocumentRef {
            id: id.to_string(),
            title: format!("{}.pdf", id),
        }
    }

    #[test]
    fn test_first_document_selected_automatically() {
        let mut sel = DocumentSelection::new();
        assert_eq!(sel.selected_id(), None);
        sel.replace(vec![doc("a"), doc("b")]);
        assert_eq!(sel.selected_id(), Some("a"));
    }

    #[test]
    fn test_existing_selection_survives_refresh() {
        let mut sel = DocumentSelection::new();
        sel.replace(vec![doc("a"), doc("b")]);
        assert!(sel.select("b"));
        sel.replace(vec![doc("b"), doc("c")]);
        assert_eq!(sel.selected_id(), Some("b"));
    }

    #[test]
    fn test_vanished_selection_is_repaired() {
        let mut sel = DocumentSelection::new();
        sel.replace(vec![doc("a"), doc("b")]);
        sel.select("b");
        sel.replace(vec![doc("c")]);
        assert_eq!(sel.selected_id(), Some("c"));
        sel.replace(Vec::new());
        assert_eq!(sel.selected_id(), None);
    }

    #[test]
    fn test_upload_adds_without_stealing_selection() {
        let mut sel = DocumentSelection::new();
        sel.add(doc("a"));
        assert_eq!(sel.selected_id(), Some("a"));
        sel.add(doc("b"));
        assert_eq!(sel.selected_id(), Some("a"));
        assert_eq!(sel.documents().len(), 2);
    }

    #[test]
    fn test_cycle_wraps() {
        let mut sel = DocumentSelection::new();
        sel.replace(vec![doc("a"), doc("b"), doc("c")]);
        sel.cycle(-1);
        assert_eq!(sel.selected_id(), Some("c"));
        sel.cycle(1);
        assert_eq!(sel.selected_id(), Some("a"));
        assert!(!sel.select("zzz"));
        assert_eq!(sel.selected_id(), Some("a"));
    }
}
