//! Wavefront-style mesh text parser (`v`, `vt`, `vn`, `f`).
//!
//! Produces the raw attribute tables and face list; interleaving is left to
//! [`crate::assemble`]. Unknown record kinds are skipped.

use crate::error::ParseError;
use crate::mesh::{Face, FaceVertex};

/// Attribute tables and faces in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
}

impl ObjData {
    /// Total number of face corners.
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Face::len).sum()
    }
}

/// Parse mesh text into attribute tables and faces.
pub fn parse(text: &str) -> Result<ObjData, ParseError> {
    let mut data = ObjData::default();

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => data.positions.push(parse_floats(parts, line_no, "v")?),
            "vt" => data.texcoords.push(parse_floats(parts, line_no, "vt")?),
            "vn" => data.normals.push(parse_floats(parts, line_no, "vn")?),
            "f" => {
                let corners = parts
                    .map(|token| parse_face_vertex(token, line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.is_empty() {
                    return Err(ParseError::EmptyFace { line: line_no });
                }
                data.faces.push(Face(corners));
            }
            _ => {
                // Comments, o/g/s/usemtl/mtllib and anything else.
            }
        }
    }

    log::debug!(
        "Parsed mesh text: {} positions, {} texcoords, {} normals, {} faces",
        data.positions.len(),
        data.texcoords.len(),
        data.normals.len(),
        data.faces.len()
    );

    Ok(data)
}

/// Reads exactly `N` leading floats; trailing components (e.g. `w`) are ignored.
fn parse_floats<'a, const N: usize>(
    parts: impl Iterator<Item = &'a str>,
    line_no: usize,
    record: &'static str,
) -> Result<[f32; N], ParseError> {
    let mut out = [0.0f32; N];
    let mut found = 0;
    for token in parts.take(N) {
        out[found] = token.parse::<f32>().map_err(|_| ParseError::MalformedNumber {
            line: line_no,
            token: token.to_owned(),
        })?;
        found += 1;
    }
    if found < N {
        return Err(ParseError::MissingComponent {
            line: line_no,
            record,
            expected: N,
            found,
        });
    }
    Ok(out)
}

fn parse_face_vertex(token: &str, line_no: usize) -> Result<FaceVertex, ParseError> {
    let mut split = token.split('/');

    let position = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, line_no)?,
        _ => {
            return Err(ParseError::InvalidIndex {
                line: line_no,
                token: token.to_owned(),
            });
        }
    };
    let texcoord = optional_index(split.next(), line_no)?;
    let normal = optional_index(split.next(), line_no)?;

    Ok(FaceVertex::new(position, texcoord, normal))
}

fn optional_index(value: Option<&str>, line_no: usize) -> Result<Option<usize>, ParseError> {
    match value {
        Some(value) if !value.is_empty() => resolve_index(value, line_no).map(Some),
        _ => Ok(None),
    }
}

/// 1-based text index to 0-based. Bounds are checked by the assembler.
fn resolve_index(token: &str, line_no: usize) -> Result<usize, ParseError> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| ParseError::MalformedNumber {
            line: line_no,
            token: token.to_owned(),
        })?;
    if raw < 1 {
        return Err(ParseError::InvalidIndex {
            line: line_no,
            token: token.to_owned(),
        });
    }
    usize::try_from(raw - 1).map_err(|_| ParseError::InvalidIndex {
        line: line_no,
        token: token.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            # a comment
            o tri
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            s off
            f 1/1/1 2/2/1 3/3/1
        "#;
        let data = parse(src).expect("parse triangle");
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.texcoords.len(), 3);
        assert_eq!(data.normals, vec![[0.0, 0.0, 1.0]]);
        assert_eq!(data.faces.len(), 1);
        assert_eq!(
            data.faces[0].corners(),
            &[
                FaceVertex::new(0, Some(0), Some(0)),
                FaceVertex::new(1, Some(1), Some(0)),
                FaceVertex::new(2, Some(2), Some(0)),
            ]
        );
    }

    #[test]
    fn tables_keep_declaration_order() {
        let data = parse("v 3 3 3\nv 1 1 1\nv 2 2 2\n").unwrap();
        assert_eq!(
            data.positions,
            vec![[3.0, 3.0, 3.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]
        );
    }

    #[test]
    fn absent_sub_indices_are_none() {
        let data = parse("f 1//2 3 4/5\n").unwrap();
        assert_eq!(
            data.faces[0].corners(),
            &[
                FaceVertex::new(0, None, Some(1)),
                FaceVertex::new(2, None, None),
                FaceVertex::new(3, Some(4), None),
            ]
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = parse("v 0 0 0\nv 1.0 abc 2.0\nv 1 1 1").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedNumber {
                line: 2,
                token: "abc".into()
            }
        );
    }

    #[test]
    fn parse_floats_builds_no_partial_tuple() {
        let parts = "1.0 abc 2.0".split_whitespace();
        let tuple: Result<[f32; 3], _> = parse_floats(parts, 1, "v");
        assert!(tuple.is_err());
    }

    #[test]
    fn malformed_face_index_is_an_error() {
        let err = parse("v 0 0 0\nf 1/x/1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedNumber { line: 2, .. }));
    }

    #[test]
    fn zero_and_negative_indices_are_rejected() {
        assert!(matches!(
            parse("f 0 1 2").unwrap_err(),
            ParseError::InvalidIndex { line: 1, .. }
        ));
        assert!(matches!(
            parse("f -1 -2 -3").unwrap_err(),
            ParseError::InvalidIndex { line: 1, .. }
        ));
        assert!(matches!(
            parse("f /1/1").unwrap_err(),
            ParseError::InvalidIndex { line: 1, .. }
        ));
    }

    #[test]
    fn short_records_report_missing_components() {
        assert_eq!(
            parse("\nvn 0 1").unwrap_err(),
            ParseError::MissingComponent {
                line: 2,
                record: "vn",
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn extra_components_are_ignored() {
        let data = parse("v 1 2 3 1.0\nvt 0.5 0.25 0.0").unwrap();
        assert_eq!(data.positions, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(data.texcoords, vec![[0.5, 0.25]]);
    }

    #[test]
    fn empty_face_is_an_error() {
        assert_eq!(
            parse("f\n").unwrap_err(),
            ParseError::EmptyFace { line: 1 }
        );
    }

    #[test]
    fn unknown_records_are_skipped() {
        let data = parse("mtllib x.mtl\nusemtl red\ng group\nl 1 2\nvp 0.1\n").unwrap();
        assert_eq!(data, ObjData::default());
    }

    #[test]
    fn corner_count_sums_faces() {
        let data = parse("f 1 2 3\nf 1 2 3 4\n").unwrap();
        assert_eq!(data.corner_count(), 7);
    }
}
