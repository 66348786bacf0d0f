use crate::level::types::{Level, Model, Segment};
use crate::ParserError;
use std::io::{Read, Write};

pub struct LevelReader {}

impl LevelReader {
    pub fn parse_level<R: Read>(rdr: &mut R) -> Result<Level, ParserError> {
        let mut buf = Vec::new();
        rdr.read_to_end(&mut buf)?;
        LevelReader::parse_level_from_slice(&buf)
    }

    pub fn parse_level_from_slice(data: &[u8]) -> Result<Level, ParserError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(ParserError::EmptySource);
        }

        let level: Level = serde_json::from_slice(data)?;
        for model in &level.models {
            LevelReader::validate_model(model)?;
        }

        Ok(level)
    }

    pub fn write_level<W: Write>(w: &mut W, level: &Level) -> Result<(), ParserError> {
        serde_json::to_writer(w, level)?;
        Ok(())
    }

    // Index ranges aren't checked here, the importer reports them per segment group.
    fn validate_model(model: &Model) -> Result<(), ParserError> {
        for (idx, segment) in model.segments.iter().enumerate() {
            LevelReader::validate_segment(segment).map_err(|reason| ParserError::FormatError {
                reason: format!("model {}, segment {}: {}", model.name, idx, reason),
            })?;
        }
        Ok(())
    }

    fn validate_segment(segment: &Segment) -> Result<(), String> {
        let vertex_count = segment.vertex_count();

        if !segment.normals.is_empty() && segment.normals.len() != vertex_count {
            return Err(format!(
                "{} normals for {} vertices",
                segment.normals.len(),
                vertex_count
            ));
        }

        if !segment.uvs.is_empty() && segment.uvs.len() != vertex_count {
            return Err(format!("{} uvs for {} vertices", segment.uvs.len(), vertex_count));
        }

        let weights = segment.vertex_weights.len();
        if (vertex_count == 0 && weights != 0) || (vertex_count != 0 && weights % vertex_count != 0) {
            return Err(format!("{} vertex weights for {} vertices", weights, vertex_count));
        }

        Ok(())
    }
}
