//! Trailer and sidecar codec for the portable label wire format.
//!
//! This is the minimal internal surface needed to make property P5 and
//! end-to-end scenario 5 testable; the outer file-format *design* (where
//! the trailer lives relative to other file metadata, PDF/Office native
//! metadata lookup, walker integration) is external glue per the
//! purpose-and-scope non-goals. What lives here is byte-exact
//! marker handling and strict JSON parsing -- nothing more.

use crate::error::{OpenRiskError, Result};
use crate::label::LabelSet;

/// Leading marker: appears once, immediately before the label JSON.
const TRAILER_START: &str = "\n---OPENLABEL-V1---\n";
/// Trailing marker: appears once, immediately after the label JSON.
const TRAILER_END: &str = "\n---END-OPENLABEL---";

/// Appends a compact-JSON trailer carrying `tag` to `content`. The
/// result is `content + START + json + "\n" + END`, matching the format
/// in the external-interfaces contract byte-for-byte.
pub fn write_trailer(content: &str, tag: &LabelSet) -> Result<String> {
    let json = serde_json::to_string(tag)?;
    let mut out = String::with_capacity(content.len() + TRAILER_START.len() + json.len() + 1 + TRAILER_END.len());
    out.push_str(content);
    out.push_str(TRAILER_START);
    out.push_str(&json);
    out.push('\n');
    out.push_str(TRAILER_END);
    Ok(out)
}

/// Locates the end marker from EOF, scans backward for the start marker,
/// and strictly parses the JSON between them. Returns `(original_content,
/// tag)`. Rejects malformed input (missing markers, unparsable JSON)
/// rather than guessing.
pub fn read_trailer(data: &str) -> Result<(String, LabelSet)> {
    if !data.ends_with(TRAILER_END) {
        return Err(OpenRiskError::CodecError("missing trailer end marker".into()));
    }
    let before_end = &data[..data.len() - TRAILER_END.len()];
    let start_idx = before_end
        .rfind(TRAILER_START)
        .ok_or_else(|| OpenRiskError::CodecError("missing trailer start marker".into()))?;

    let content = &before_end[..start_idx];
    let json_with_newline = &before_end[start_idx + TRAILER_START.len()..];
    let json = json_with_newline.strip_suffix('\n').unwrap_or(json_with_newline);

    let tag: LabelSet = serde_json::from_str(json).map_err(|e| OpenRiskError::CodecError(e.to_string()))?;
    Ok((content.to_string(), tag))
}

/// Sidecar payload: the same `LabelSet` JSON, with a required file
/// reference so a bare sidecar file can be matched back to its subject
/// without relying on filename convention alone.
pub fn write_sidecar(tag: &LabelSet) -> Result<String> {
    if tag.file_ref.is_none() {
        return Err(OpenRiskError::CodecError("sidecar payload requires file_ref".into()));
    }
    Ok(serde_json::to_string(tag)?)
}

/// Parses a sidecar JSON document, requiring `file_ref` to be present.
pub fn read_sidecar(json: &str) -> Result<LabelSet> {
    let tag: LabelSet = serde_json::from_str(json).map_err(|e| OpenRiskError::CodecError(e.to_string()))?;
    if tag.file_ref.is_none() {
        return Err(OpenRiskError::CodecError("sidecar payload missing file_ref".into()));
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{FileRef, Label};

    fn sample_tag() -> LabelSet {
        let mut tag = LabelSet::new("gen:0.1", 1_706_140_800);
        tag.insert(Label { entity_type: "SSN".into(), count: 1, confidence_avg: 0.99, detector_kind: "checksum".into(), value_hash: "15e2b0".into() });
        tag
    }

    #[test]
    fn trailer_round_trips_content_and_tag() {
        let content = "the quick brown fox jumps over the lazy dog";
        let tag = sample_tag();
        let written = write_trailer(content, &tag).unwrap();
        let (read_content, read_tag) = read_trailer(&written).unwrap();
        assert_eq!(read_content, content);
        assert_eq!(read_tag, tag);
    }

    #[test]
    fn trailer_round_trips_empty_content() {
        let tag = sample_tag();
        let written = write_trailer("", &tag).unwrap();
        let (read_content, read_tag) = read_trailer(&written).unwrap();
        assert_eq!(read_content, "");
        assert_eq!(read_tag, tag);
    }

    #[test]
    fn trailer_markers_are_present_verbatim() {
        let written = write_trailer("x", &sample_tag()).unwrap();
        assert!(written.contains(TRAILER_START));
        assert!(written.ends_with(TRAILER_END));
    }

    #[test]
    fn read_trailer_rejects_missing_end_marker() {
        assert!(read_trailer("just some content, no trailer").is_err());
    }

    #[test]
    fn read_trailer_rejects_malformed_json() {
        let broken = format!("content{}not valid json{}", TRAILER_START, TRAILER_END);
        assert!(read_trailer(&broken).is_err());
    }

    #[test]
    fn sidecar_round_trips_with_file_ref() {
        let mut tag = sample_tag();
        tag.file_ref = Some(FileRef { name: "report.pdf".into(), size: 1024, hash: "abcdef".into() });
        let json = write_sidecar(&tag).unwrap();
        let read_back = read_sidecar(&json).unwrap();
        assert_eq!(read_back, tag);
    }

    #[test]
    fn sidecar_requires_file_ref_on_write() {
        assert!(write_sidecar(&sample_tag()).is_err());
    }

    #[test]
    fn sidecar_requires_file_ref_on_read() {
        let json = serde_json::to_string(&sample_tag()).unwrap();
        assert!(read_sidecar(&json).is_err());
    }
}
