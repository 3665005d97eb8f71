//! Object-text parser
//!
//! Reads and writes the block-structured text format used for entity and
//! scene files:
//!
//! ```text
//! # comment
//! Entity
//! {
//!     name : Crate
//!     position : 0.00000 1.00000 0.00000
//! }
//! ```
//!
//! A header is the first token of a non-indented line and must be at least
//! three characters long. Its body runs from the next `{` to the next `}`; a
//! second `{` before the `}` is a syntax error that aborts the file. Body
//! lines are `key : value`; malformed lines are reported and skipped.

use std::fmt;
use std::path::Path;

use log::{error, warn};

use super::store::{KeyValueStore, MAX_KEY_LEN};

/// Type of a parsed object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Entity definition
    Entity,
    /// Scene-wide settings
    SceneConfig,
    /// Archetype reference placed in a scene
    SceneEntityEntry,
    /// Player state
    Player,
    /// Model description
    Model,
    /// Material description
    Material,
    /// Any other header, kept verbatim
    Unknown(String),
}

impl ObjectKind {
    /// Map a header token to a kind
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Entity" => Self::Entity,
            "Scene_Config" => Self::SceneConfig,
            "Scene_Entity_Entry" => Self::SceneEntityEntry,
            "Player" => Self::Player,
            "Model" => Self::Model,
            "Material" => Self::Material,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Header token written for this kind
    pub fn type_name(&self) -> &str {
        match self {
            Self::Entity => "Entity",
            Self::SceneConfig => "Scene_Config",
            Self::SceneEntityEntry => "Scene_Entity_Entry",
            Self::Player => "Player",
            Self::Model => "Model",
            Self::Material => "Material",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One `TypeName { ... }` block
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedObject {
    /// Block type
    pub kind: ObjectKind,
    /// Body entries
    pub data: KeyValueStore,
}

impl ParsedObject {
    /// Create an empty object of the given kind
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            data: KeyValueStore::new(),
        }
    }
}

/// Syntax and I/O errors that abort a file
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Header without a following `{`
    #[error("syntax error in {file}: expected '{{' at line {line}")]
    ExpectedOpeningBrace {
        /// Source name
        file: String,
        /// 1-based line of the header
        line: usize,
    },

    /// Body never closed
    #[error("syntax error in {file}: expected '}}' at line {line}")]
    ExpectedClosingBrace {
        /// Source name
        file: String,
        /// 1-based line where input ended
        line: usize,
    },

    /// A new body opened before the current one closed
    #[error("syntax error in {file}: expected '}}' before line {line} but found '{{'")]
    UnexpectedOpeningBrace {
        /// Source name
        file: String,
        /// 1-based line of the second `{`
        line: usize,
    },

    /// File could not be read or written
    #[error("IO error on {file}: {source}")]
    Io {
        /// Path involved
        file: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Minimum length of a header token
const MIN_TYPE_NAME_LEN: usize = 3;

/// Parse every object in `text`
///
/// `source_name` only labels diagnostics.
pub fn read_objects(text: &str, source_name: &str) -> Result<Vec<ParsedObject>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut objects = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        let line_number = index + 1;
        index += 1;

        if line.trim().is_empty() || line.starts_with(char::is_whitespace) || line.starts_with('#') {
            continue;
        }

        let Some(type_name) = line.split_whitespace().next() else {
            continue;
        };
        if type_name.len() < MIN_TYPE_NAME_LEN || type_name == "{" || type_name == "}" {
            warn!("Invalid object type '{type_name}' on line {line_number} of {source_name}");
            continue;
        }

        let header_rest = &line[type_name.len()..];
        let (body, next_index) = extract_body(&lines, index, header_rest, line_number, source_name)?;
        index = next_index;

        let mut object = ParsedObject::new(ObjectKind::from_type_name(type_name));
        for (body_line_number, body_line) in body {
            parse_body_line(&mut object.data, body_line, body_line_number, source_name);
        }
        objects.push(object);
    }

    Ok(objects)
}

/// Collect the lines between the braces that follow a header.
///
/// Returns `(line_number, text)` pairs for the body and the index of the
/// first line after the closing brace.
fn extract_body<'a>(
    lines: &[&'a str],
    start_index: usize,
    header_rest: &'a str,
    header_line: usize,
    source_name: &str,
) -> Result<(Vec<(usize, &'a str)>, usize), ParseError> {
    let mut segments: Vec<(usize, &'a str)> = Vec::with_capacity(lines.len() - start_index + 1);
    segments.push((header_line, header_rest));
    segments.extend(lines[start_index..].iter().enumerate().map(|(i, l)| (start_index + i + 1, *l)));

    let mut body = Vec::new();
    let mut opened = false;

    for (segment_index, (line_number, segment)) in segments.iter().enumerate() {
        let mut text = *segment;

        if !opened {
            match text.find(['{', '}']) {
                Some(at) if text.as_bytes()[at] == b'{' => {
                    opened = true;
                    text = &text[at + 1..];
                }
                _ => continue,
            }
        }

        match text.find(['{', '}']) {
            Some(at) if text.as_bytes()[at] == b'{' => {
                error!(
                    "Syntax error while loading {source_name}, expected '}}' before line {line_number} but found '{{'"
                );
                return Err(ParseError::UnexpectedOpeningBrace {
                    file: source_name.to_string(),
                    line: *line_number,
                });
            }
            Some(at) => {
                body.push((*line_number, &text[..at]));
                // Lines are consumed up to and including the closing brace
                let next_index = start_index + segment_index;
                return Ok((body, next_index));
            }
            None => body.push((*line_number, text)),
        }
    }

    let last_line = start_index.max(lines.len());
    if opened {
        error!("Syntax error while loading {source_name}, expected '}}' at line {last_line}");
        Err(ParseError::ExpectedClosingBrace {
            file: source_name.to_string(),
            line: last_line,
        })
    } else {
        error!("Syntax error while loading {source_name}, expected '{{' at line {header_line}");
        Err(ParseError::ExpectedOpeningBrace {
            file: source_name.to_string(),
            line: header_line,
        })
    }
}

fn parse_body_line(data: &mut KeyValueStore, line: &str, line_number: usize, source_name: &str) {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return;
    }

    let key_end = trimmed
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(trimmed.len());
    let key = &trimmed[..key_end];
    let Some(value) = trimmed[key_end..].trim_start().strip_prefix(':') else {
        warn!("Malformed line {line_number} in {source_name}: '{trimmed}'");
        return;
    };
    let value = value.trim();

    if key.is_empty() || value.is_empty() || key.len() > MAX_KEY_LEN {
        warn!("Malformed line {line_number} in {source_name}: '{trimmed}'");
        return;
    }
    data.set(key, value);
}

/// Render objects in file order
pub fn write_objects(objects: &[ParsedObject]) -> String {
    let mut out = String::new();
    for object in objects {
        out.push_str(object.kind.type_name());
        out.push_str("\n{\n");
        for (key, value) in object.data.iter() {
            out.push('\t');
            out.push_str(key);
            out.push_str(" : ");
            out.push_str(&value.to_text());
            out.push('\n');
        }
        out.push_str("}\n\n");
    }
    out
}

/// Read and parse a file
pub fn load_objects(path: &Path) -> Result<Vec<ParsedObject>, ParseError> {
    let file = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| {
        error!("Failed to open {file} for reading: {source}");
        ParseError::Io { file: file.clone(), source }
    })?;
    read_objects(&text, &file)
}

/// Write objects to a file, creating parent directories as needed
pub fn save_objects(path: &Path, objects: &[ParsedObject]) -> Result<(), ParseError> {
    let file = path.display().to_string();
    let io_error = |source: std::io::Error| {
        error!("Failed to open {file} for writing: {source}");
        ParseError::Io { file: file.clone(), source }
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, write_objects(objects)).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::Value;

    const SAMPLE: &str = "\
# A comment line
Entity
{
\tname : Crate
\tposition : 1.00000 2.00000 3.00000

\t# inner comment
\ttype : 1
}

Scene_Config
{
\tfog_density : 0.1
}
";

    #[test]
    fn test_read_two_objects_in_order() {
        let objects = read_objects(SAMPLE, "sample").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind, ObjectKind::Entity);
        assert_eq!(objects[1].kind, ObjectKind::SceneConfig);
        assert_eq!(objects[0].data.get("name"), Some(&Value::from("Crate")));
        assert_eq!(objects[0].data.len(), 3);
        assert_eq!(objects[1].data.get("fog_density"), Some(&Value::from("0.1")));
    }

    #[test]
    fn test_brace_on_header_line_and_inline_close() {
        let text = "Material {\n\tshininess : 4\n}\nModel\n{ geometry : box.obj }\n";
        let objects = read_objects(text, "inline").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].data.get("shininess"), Some(&Value::from("4")));
        assert_eq!(objects[1].data.get("geometry"), Some(&Value::from("box.obj")));
    }

    #[test]
    fn test_malformed_body_line_is_skipped() {
        let text = "Entity\n{\n\tjust some words\n\tname : Door\n\t: novalue\n}\n";
        let objects = read_objects(text, "malformed").unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].data.len(), 1);
        assert!(objects[0].data.exists("name"));
    }

    #[test]
    fn test_short_header_is_skipped() {
        let text = "ab\nEntity\n{\n\tname : x\n}\n";
        let objects = read_objects(text, "short").unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_missing_opening_brace_aborts() {
        let err = read_objects("Entity\n\tname : x\n", "open").unwrap_err();
        assert!(matches!(err, ParseError::ExpectedOpeningBrace { line: 1, .. }));
    }

    #[test]
    fn test_second_opening_brace_aborts() {
        let text = "Entity\n{\n\tname : a\nEntity\n{\n\tname : b\n}\n";
        let err = read_objects(text, "nested").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedOpeningBrace { line: 5, .. }));
    }

    #[test]
    fn test_missing_closing_brace_aborts() {
        let err = read_objects("Entity\n{\n\tname : a\n", "close").unwrap_err();
        assert!(matches!(err, ParseError::ExpectedClosingBrace { .. }));
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let objects = read_objects("Weather\n{\n\train : true\n}\n", "unknown").unwrap();
        assert_eq!(objects[0].kind, ObjectKind::Unknown("Weather".to_string()));
    }

    #[test]
    fn test_write_format() {
        let mut object = ParsedObject::new(ObjectKind::Player);
        object.data.set("name", "Player");
        let text = write_objects(&[object]);
        assert_eq!(text, "Player\n{\n\tname : Player\n}\n\n");
    }

    #[test]
    fn test_written_text_reads_back() {
        let mut first = ParsedObject::new(ObjectKind::Entity);
        first.data.set("loop", true);
        first.data.set("volume", 0.5_f32);
        let text = write_objects(&[first]);

        let objects = read_objects(&text, "written").unwrap();
        assert_eq!(objects[0].data.get_as::<bool>("loop"), Ok(true));
        assert_eq!(objects[0].data.get_as::<f32>("volume"), Ok(0.5));
        assert_eq!(write_objects(&objects), text);
    }

    #[test]
    fn test_crlf_values_are_trimmed() {
        let objects = read_objects("Entity\r\n{\r\n\tname : Lamp\r\n}\r\n", "crlf").unwrap();
        assert_eq!(objects[0].data.get("name"), Some(&Value::from("Lamp")));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("scene_core_parser_missing.symtres");
        assert!(matches!(load_objects(&path), Err(ParseError::Io { .. })));
    }
}
