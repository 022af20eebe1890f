pub mod cfg;
pub mod dir;
pub mod text;

use crate::ircore::common::DocId;

#[derive(PartialEq, Debug, Clone)]
pub struct Document {
    id: DocId,
    content: String,
    path: String,
}

impl Document {
    pub fn new(id: impl Into<DocId>, content: String, path: String) -> Self {
        Document {
            id: id.into(),
            content,
            path,
        }
    }
    pub fn id(&self) -> &DocId {
        &self.id
    }
    pub fn get_content(&self) -> &str {
        &self.content
    }
    pub fn get_path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document() {
        let doc = Document::new("Doc3", "It is snowing".to_string(), "corpus/Doc3.txt".to_string());
        assert_eq!(doc.id().key(), Some(3));
        assert_eq!(doc.get_content(), "It is snowing");
        assert_eq!(doc.get_path(), "corpus/Doc3.txt");
    }
}
