//! Call-stack signatures used as aggregation keys.
//!
//! Frames are ordered outermost first, matching the collapsed stack
//! convention: "main;handle_request;parse_body".

use crate::utils::config::FRAME_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single symbolized stack frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Frame {
    /// Function name as reported by the symbolizer
    pub function: String,

    /// Source file (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Source line (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Frame {
    /// Frame with only a function name
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            file: None,
            line: None,
        }
    }

    /// Frame with a source location
    pub fn with_location(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{} ({}:{})", self.function, file, line),
            (Some(file), None) => write!(f, "{} ({})", self.function, file),
            _ => write!(f, "{}", self.function),
        }
    }
}

/// Ordered sequence of frames identifying where an allocation happened.
///
/// Equality and hashing are structural, so two captures of the same stack
/// aggregate into one entry. Cloning is cheap: frames are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Frame>", into = "Vec<Frame>")]
pub struct CallStackSignature {
    frames: Arc<[Frame]>,
}

impl CallStackSignature {
    pub fn new(frames: impl Into<Vec<Frame>>) -> Self {
        let frames: Vec<Frame> = frames.into();
        Self {
            frames: Arc::from(frames.into_boxed_slice()),
        }
    }

    /// Build a signature from bare function names, outermost first
    pub fn from_functions<I, S>(functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(functions.into_iter().map(Frame::new).collect::<Vec<_>>())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost frame, i.e. the allocation site
    pub fn leaf(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Collapsed representation used as a report key
    pub fn key(&self) -> String {
        if self.frames.is_empty() {
            return "<unknown>".to_string();
        }

        let mut key = String::new();
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                key.push(FRAME_SEPARATOR);
            }
            key.push_str(&frame.to_string());
        }
        key
    }
}

impl From<Vec<Frame>> for CallStackSignature {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl From<CallStackSignature> for Vec<Frame> {
    fn from(signature: CallStackSignature) -> Self {
        signature.frames.to_vec()
    }
}

impl fmt::Display for CallStackSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = CallStackSignature::from_functions(["main", "load", "parse"]);
        let b = CallStackSignature::new(vec![
            Frame::new("main"),
            Frame::new("load"),
            Frame::new("parse"),
        ]);

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_frame_order_matters() {
        let a = CallStackSignature::from_functions(["main", "parse"]);
        let b = CallStackSignature::from_functions(["parse", "main"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_includes_location() {
        let sig = CallStackSignature::new(vec![
            Frame::new("main"),
            Frame::with_location("alloc_buf", "src/buf.rs", 42),
        ]);

        assert_eq!(sig.key(), "main;alloc_buf (src/buf.rs:42)");
        assert_eq!(sig.leaf().unwrap().function, "alloc_buf");
        assert_eq!(sig.depth(), 2);
    }

    #[test]
    fn test_empty_signature_key() {
        let sig = CallStackSignature::new(Vec::<Frame>::new());
        assert!(sig.is_empty());
        assert_eq!(sig.key(), "<unknown>");
    }
}
