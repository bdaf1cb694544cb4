use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Course and game identification pulled from a game's tag pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub course: Option<String>,
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2"
}

impl GameMetadata {
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| headers.get(*k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty() && *v != "?")
                .map(str::to_string)
        };

        Self {
            course: first(&["StudyName", "Course", "Event"]),
            chapter: first(&["ChapterName", "Chapter"]),
            section: first(&["Section"]),
            white: first(&["White"]),
            black: first(&["Black"]),
            result: first(&["Result"]).filter(|r| r != "*"),
        }
    }
}
