use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use renderer::math_prelude::*;
use renderer::Vertex;
use thiserror::Error;

use crate::mesh::Mesh;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("model file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("file ends before the 80-byte header and triangle count")]
    MissingHeader,
    #[error("declared triangle count is zero")]
    NoTriangles,
    #[error("file truncated: {parsed} of {expected} triangle records present")]
    Truncated { expected: u32, parsed: u32 },
    #[error("i/o error while reading model")]
    Io(#[from] io::Error),
}

pub fn load_binary_stl<P: AsRef<Path>>(path: P) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => StlError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => StlError::Io(err),
    })?;
    read_binary_stl(BufReader::new(file))
}

/// Parses binary STL from any reader: an ignored 80-byte header, a
/// little-endian `u32` triangle count, then 50-byte records of one
/// normal, three corner positions and an ignored attribute word.
///
/// Every record becomes three private vertices sharing the record's
/// normal, indexed sequentially. No welding of shared corners.
pub fn read_binary_stl<R: Read>(mut reader: R) -> Result<Mesh, StlError> {
    let mut header = [0u8; HEADER_LEN + 4];
    reader.read_exact(&mut header).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => StlError::MissingHeader,
        _ => StlError::Io(err),
    })?;
    let triangle_count = u32::from_le_bytes([
        header[HEADER_LEN],
        header[HEADER_LEN + 1],
        header[HEADER_LEN + 2],
        header[HEADER_LEN + 3],
    ]);
    if triangle_count == 0 {
        return Err(StlError::NoTriangles);
    }

    let mut vertices = Vec::with_capacity(triangle_count as usize * 3);
    let mut indices = Vec::with_capacity(triangle_count as usize * 3);
    let mut record = [0u8; RECORD_LEN];
    for parsed in 0..triangle_count {
        reader.read_exact(&mut record).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => StlError::Truncated {
                expected: triangle_count,
                parsed,
            },
            _ => StlError::Io(err),
        })?;

        let normal = vec3_at(&record, 0);
        for corner in 0..3 {
            let position = vec3_at(&record, 12 + corner * 12);
            indices.push(vertices.len() as u32);
            vertices.push(Vertex::new(position, normal));
        }
        // Bytes 48..50 are the attribute word, ignored.
    }

    Ok(Mesh::new(vertices, indices, triangle_count))
}

fn vec3_at(record: &[u8], at: usize) -> Vec3 {
    let f = |at: usize| {
        f32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
    };
    Vec3::new(f(at), f(at + 4), f(at + 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type Record = ([f32; 3], [[f32; 3]; 3]);

    fn stl_bytes(records: &[Record]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for (normal, corners) in records {
            for value in normal.iter() {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            for corner in corners.iter() {
                for value in corner.iter() {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&0xffffu16.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn parses_a_single_triangle() {
        let bytes = stl_bytes(&[(
            [0.0, 0.0, 1.0],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )]);
        let mesh = read_binary_stl(Cursor::new(bytes)).unwrap();

        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices(), &[0, 1, 2][..]);
        let normal = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(
            mesh.vertices(),
            &[
                Vertex::new(Vec3::new(0.0, 0.0, 0.0), normal),
                Vertex::new(Vec3::new(1.0, 0.0, 0.0), normal),
                Vertex::new(Vec3::new(0.0, 1.0, 0.0), normal),
            ][..]
        );
    }

    #[test]
    fn emits_sequential_indices_across_records() {
        let record: Record = (
            [0.0, 1.0, 0.0],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        );
        let mesh = read_binary_stl(Cursor::new(stl_bytes(&[record; 4]))).unwrap();

        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.vertices().len(), 12);
        let expected: Vec<u32> = (0..12).collect();
        assert_eq!(mesh.indices(), expected.as_slice());
    }

    #[test]
    fn each_record_keeps_its_own_normal() {
        let first: Record = ([1.0, 0.0, 0.0], [[0.0; 3]; 3]);
        let second: Record = ([0.0, 1.0, 0.0], [[0.0; 3]; 3]);
        let mesh = read_binary_stl(Cursor::new(stl_bytes(&[first, second]))).unwrap();

        for vertex in &mesh.vertices()[..3] {
            assert_eq!(vertex.normal, Vec3::new(1.0, 0.0, 0.0));
        }
        for vertex in &mesh.vertices()[3..] {
            assert_eq!(vertex.normal, Vec3::new(0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn rejects_a_zero_triangle_count() {
        let bytes = stl_bytes(&[]);
        assert!(matches!(
            read_binary_stl(Cursor::new(bytes)),
            Err(StlError::NoTriangles)
        ));
    }

    #[test]
    fn rejects_a_truncated_record() {
        let record: Record = (
            [0.0, 0.0, 1.0],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        let mut bytes = stl_bytes(&[record; 3]);
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(
            read_binary_stl(Cursor::new(bytes)),
            Err(StlError::Truncated {
                expected: 3,
                parsed: 2
            })
        ));
    }

    #[test]
    fn rejects_a_file_too_short_for_the_header() {
        let bytes = vec![0u8; HEADER_LEN - 8];
        assert!(matches!(
            read_binary_stl(Cursor::new(bytes)),
            Err(StlError::MissingHeader)
        ));
    }

    #[test]
    fn reports_a_missing_file() {
        let missing = Path::new("definitely/not/here.stl");
        assert!(matches!(
            load_binary_stl(missing),
            Err(StlError::FileNotFound { .. })
        ));
    }
}
