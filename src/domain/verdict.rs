use serde::{Deserialize, Serialize};

/// Which channel produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Realtime,
    Upload,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Realtime => "realtime",
            Source::Upload => "upload",
        }
    }

    /// Parses a filter value; anything but the two known sources is
    /// treated as "no source filter".
    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "realtime" => Some(Source::Realtime),
            "upload" => Some(Source::Upload),
            _ => None,
        }
    }
}

/// "Pass" for the passing class, "Fail" for every other class.
pub fn status_label(class_id: u32) -> &'static str {
    if class_id == 0 {
        "Pass"
    } else {
        "Fail"
    }
}

/// The single highest-confidence surviving detection of one frame,
/// representing the overall call for that frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub cls: u32,
    pub status: String,
    pub reason: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Insert shape for one verdict. `id` and `timestamp` are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewVerdict {
    pub source: Source,
    pub session_id: Option<String>,
    pub cls: u32,
    pub reason: String,
    pub confidence: f32,
    pub bbox: Option<[f32; 4]>,
    pub image_size: ImageSize,
    pub model_name: String,
}

/// One persisted decision. Immutable once written; only deletion
/// removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub id: i64,
    pub timestamp: String,
    pub source: Source,
    pub session_id: Option<String>,
    pub cls: u32,
    pub reason: String,
    pub confidence: f32,
    pub bbox: Option<[f32; 4]>,
    pub image_size: ImageSize,
    pub model_name: String,
}
