use serde::{Deserialize, Serialize};

/// A note as submitted by the client, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    /// Owner identity. Not checked against the profiles collection.
    pub firebase_uid: String,
    pub subject: String,
    pub chapter: String,
    pub content: String,
}

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub firebase_uid: String,
    pub subject: String,
    pub chapter: String,
    pub content: String,
}

impl Note {
    pub fn from_new(id: String, note: NewNote) -> Self {
        Self {
            id,
            firebase_uid: note.firebase_uid,
            subject: note.subject,
            chapter: note.chapter,
            content: note.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_wire_format() {
        let json = r#"{
            "id": "abc",
            "firebaseUid": "uid-1",
            "subject": "Math",
            "chapter": "Algebra",
            "content": ""
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.firebase_uid, "uid-1");
        assert!(note.content.is_empty());

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["firebaseUid"], "uid-1");
    }
}
