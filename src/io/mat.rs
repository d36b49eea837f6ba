//! Minimal MATLAB Level-5 `.mat` writer.
//!
//! Writes little-endian MAT 5 files containing double matrices and nested
//! structs, which is all the results bundle needs. Layout per element:
//! a 128-byte file header, then one `miMATRIX` data element per top-level
//! variable, each holding array flags, dimensions, name and payload
//! subelements padded to 8-byte boundaries. Struct fields are emitted as
//! nested `miMATRIX` elements with empty names, field names padded to the
//! MATLAB limit of 32 bytes (31 significant characters).

use crate::error::SpineError;
use std::fs;
use std::path::Path;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;

const MX_STRUCT_CLASS: u32 = 2;
const MX_DOUBLE_CLASS: u32 = 6;

const FIELD_NAME_LEN: usize = 32;

/// Value tree writable as a MAT variable.
#[derive(Clone, Debug)]
pub enum MatValue {
    /// Column-major double matrix.
    Matrix {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    /// 1×1 struct with ordered named fields.
    Struct(Vec<(String, MatValue)>),
}

impl MatValue {
    /// Column vector (n × 1).
    pub fn vector(data: Vec<f64>) -> Self {
        MatValue::Matrix {
            rows: data.len(),
            cols: 1,
            data,
        }
    }
}

/// Writes `value` as the single variable `name` into a MAT 5 file at `path`,
/// creating parent directories.
pub fn write_mat(path: &Path, name: &str, value: &MatValue) -> Result<(), SpineError> {
    let mut out = Vec::with_capacity(1024);
    out.extend_from_slice(&header());
    out.extend_from_slice(&emit_matrix(name, value));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SpineError::Io {
                path: parent.to_path_buf(),
                detail: e.to_string(),
            })?;
        }
    }
    fs::write(path, out).map_err(|e| SpineError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn header() -> [u8; 128] {
    let mut h = [0u8; 128];
    let text = b"MATLAB 5.0 MAT-file, created by spine-analyzer";
    h[..text.len()].copy_from_slice(text);
    for b in h[text.len()..116].iter_mut() {
        *b = b' ';
    }
    // bytes 116..124: subsystem data offset, zero
    h[124..126].copy_from_slice(&0x0100u16.to_le_bytes());
    h[126] = b'I';
    h[127] = b'M';
    h
}

fn emit_matrix(name: &str, value: &MatValue) -> Vec<u8> {
    let mut body = Vec::new();
    match value {
        MatValue::Matrix { rows, cols, data } => {
            debug_assert_eq!(data.len(), rows * cols);
            push_subelement(&mut body, MI_UINT32, &array_flags(MX_DOUBLE_CLASS));
            push_subelement(&mut body, MI_INT32, &dims(*rows, *cols));
            push_subelement(&mut body, MI_INT8, name.as_bytes());
            let mut payload = Vec::with_capacity(data.len() * 8);
            for v in data {
                payload.extend_from_slice(&v.to_le_bytes());
            }
            push_subelement(&mut body, MI_DOUBLE, &payload);
        }
        MatValue::Struct(fields) => {
            push_subelement(&mut body, MI_UINT32, &array_flags(MX_STRUCT_CLASS));
            push_subelement(&mut body, MI_INT32, &dims(1, 1));
            push_subelement(&mut body, MI_INT8, name.as_bytes());
            push_subelement(&mut body, MI_INT32, &(FIELD_NAME_LEN as i32).to_le_bytes());
            let mut names = Vec::with_capacity(fields.len() * FIELD_NAME_LEN);
            for (field_name, _) in fields {
                let mut slot = [0u8; FIELD_NAME_LEN];
                let bytes = field_name.as_bytes();
                let n = bytes.len().min(FIELD_NAME_LEN - 1);
                slot[..n].copy_from_slice(&bytes[..n]);
                names.extend_from_slice(&slot);
            }
            push_subelement(&mut body, MI_INT8, &names);
            for (_, field_value) in fields {
                body.extend_from_slice(&emit_matrix("", field_value));
            }
        }
    }

    let mut element = Vec::with_capacity(body.len() + 8);
    element.extend_from_slice(&MI_MATRIX.to_le_bytes());
    element.extend_from_slice(&(body.len() as u32).to_le_bytes());
    element.extend_from_slice(&body);
    element
}

fn array_flags(class: u32) -> [u8; 8] {
    let mut flags = [0u8; 8];
    flags[..4].copy_from_slice(&class.to_le_bytes());
    flags
}

fn dims(rows: usize, cols: usize) -> [u8; 8] {
    let mut d = [0u8; 8];
    d[..4].copy_from_slice(&(rows as i32).to_le_bytes());
    d[4..].copy_from_slice(&(cols as i32).to_le_bytes());
    d
}

fn push_subelement(buf: &mut Vec<u8>, data_type: u32, data: &[u8]) {
    buf.extend_from_slice(&data_type.to_le_bytes());
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(data);
    let rem = data.len() % 8;
    if rem != 0 {
        buf.extend_from_slice(&[0u8; 8][..8 - rem]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn header_carries_version_and_endian_magic() {
        let h = header();
        assert_eq!(&h[124..126], &0x0100u16.to_le_bytes());
        assert_eq!(&h[126..128], b"IM");
        assert!(h[..116].iter().all(|&b| b != 0));
    }

    #[test]
    fn matrix_element_is_aligned_and_tagged() {
        let value = MatValue::Matrix {
            rows: 2,
            cols: 1,
            data: vec![1.5, -2.0],
        };
        let bytes = emit_matrix("ab", &value);
        assert_eq!(read_u32(&bytes, 0), MI_MATRIX);
        assert_eq!(read_u32(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(bytes.len() % 8, 0);
        // Array flags subelement declares a double class.
        assert_eq!(read_u32(&bytes, 8), MI_UINT32);
        assert_eq!(read_u32(&bytes, 16), MX_DOUBLE_CLASS);
    }

    #[test]
    fn struct_element_packs_padded_field_names() {
        let value = MatValue::Struct(vec![
            ("alpha".into(), MatValue::vector(vec![1.0])),
            ("beta".into(), MatValue::vector(vec![2.0])),
        ]);
        let bytes = emit_matrix("s", &value);
        assert_eq!(read_u32(&bytes, 0), MI_MATRIX);
        assert_eq!(read_u32(&bytes, 16), MX_STRUCT_CLASS);
        assert_eq!(bytes.len() % 8, 0);
        // Field names live in a 2 × 32-byte miINT8 block.
        let needle = {
            let mut s = [0u8; 32];
            s[..5].copy_from_slice(b"alpha");
            s
        };
        assert!(bytes.windows(32).any(|w| w == needle));
    }

    #[test]
    fn writes_file_with_parent_creation() {
        let dir = std::env::temp_dir().join("spine-analyzer-mat-test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("results.mat");
        write_mat(&path, "results", &MatValue::vector(vec![1.0, 2.0, 3.0])).expect("write");
        let bytes = fs::read(&path).expect("read back");
        assert_eq!(&bytes[126..128], b"IM");
        assert_eq!((bytes.len() - 128) % 8, 0);
    }
}
