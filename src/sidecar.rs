use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use crate::errors::{BrainExtractError, Result};

/// Provenance sidecar written next to each mask.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Sidecar {
    #[serde(rename = "Sources")]
    pub sources: Vec<String>,
}

impl Sidecar {
    /// Sidecar pointing at a single source file using a BIDS URI.
    pub fn from_source(dataset_name: &str, relative_path: &str) -> Self {
        Self {
            sources: vec![format!("bids:{dataset_name}:{relative_path}")],
        }
    }

    /// Pretty JSON with two-space indentation, sorted keys and non-ASCII
    /// characters written as `\uXXXX` escapes.
    pub fn to_json(&self) -> Result<String> {
        // serde_json::Map is a BTreeMap, so going through Value sorts the keys
        let value = serde_json::to_value(self).map_err(|e| BrainExtractError::Serialization {
            operation: "sidecar to value".to_string(),
            source: e,
        })?;

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter::default());
        value
            .serialize(&mut serializer)
            .map_err(|e| BrainExtractError::Serialization {
                operation: "sidecar to string".to_string(),
                source: e,
            })?;

        // only ASCII is ever written
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| BrainExtractError::file_system(path, "write sidecar", e))
    }
}

/// Pretty printer that escapes everything outside ASCII, including
/// characters beyond the BMP as UTF-16 surrogate pairs.
#[derive(Default)]
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_json_layout() -> Result<()> {
        let sidecar = Sidecar::from_source("MyStudy", "sub-01/anat/sub-01_T1w.nii.gz");
        assert_eq!(
            sidecar.to_json()?,
            "{\n  \"Sources\": [\n    \"bids:MyStudy:sub-01/anat/sub-01_T1w.nii.gz\"\n  ]\n}"
        );
        Ok(())
    }

    #[test]
    fn test_non_ascii_is_escaped() -> Result<()> {
        let sidecar = Sidecar::from_source("Étude", "sub-01/anat/sub-01_T1w.nii.gz");
        let json = sidecar.to_json()?;

        assert_eq!(
            json,
            "{\n  \"Sources\": [\n    \"bids:\\u00c9tude:sub-01/anat/sub-01_T1w.nii.gz\"\n  ]\n}"
        );
        assert!(json.is_ascii());

        let sidecar = Sidecar::from_source("脳🧠", "a_T1w.nii.gz");
        assert!(sidecar.to_json()?.contains("bids:\\u8133\\ud83e\\udde0:a_T1w.nii.gz"));

        let parsed: serde_json::Value = serde_json::from_str(&sidecar.to_json()?)?;
        assert_eq!(parsed["Sources"][0], "bids:脳🧠:a_T1w.nii.gz");
        Ok(())
    }

    #[test]
    fn test_sidecar_write() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let path = temp_dir.path().join("sub-01_space-T1w_desc-brain_mask.json");

        Sidecar::from_source("MyStudy", "sub-01/anat/sub-01_T1w.nii.gz").write(&path)?;

        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(
            parsed,
            serde_json::json!({"Sources": ["bids:MyStudy:sub-01/anat/sub-01_T1w.nii.gz"]})
        );
        Ok(())
    }
}
