//! ESRI `.shp` main file and `.shx` index writer.
//!
//! File and record headers are big-endian; record content and the rest of
//! the file header are little-endian. Lengths and offsets are counted in
//! 16-bit words.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::{self, Write};

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_BYTES: usize = 100;
const RECORD_HEADER_BYTES: usize = 8;
const NULL_SHAPE: i32 = 0;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundingBox {
    pub(crate) min_x: f64,
    pub(crate) min_y: f64,
    pub(crate) max_x: f64,
    pub(crate) max_y: f64,
}

impl BoundingBox {
    const fn around(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn extend(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f64::<LittleEndian>(self.min_x)?;
        writer.write_f64::<LittleEndian>(self.min_y)?;
        writer.write_f64::<LittleEndian>(self.max_x)?;
        writer.write_f64::<LittleEndian>(self.max_y)
    }
}

/// One shapefile record's geometry, in planar x/y.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    /// A record with no geometry.
    Null,
    /// A single point.
    Point([f64; 2]),
    /// A polyline or polygon, as a list of parts.
    Parts(Vec<Vec<[f64; 2]>>),
}

impl Shape {
    fn point_count(parts: &[Vec<[f64; 2]>]) -> usize {
        parts.iter().map(Vec::len).sum()
    }

    /// Size of the record content in bytes.
    fn content_bytes(&self) -> usize {
        match self {
            Self::Null => 4,
            Self::Point(_) => 4 + 16,
            Self::Parts(parts) => 4 + 32 + 4 + 4 + 4 * parts.len() + 16 * Self::point_count(parts),
        }
    }

    pub(crate) fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Self::Null => None,
            Self::Point([x, y]) => Some(BoundingBox::around(*x, *y)),
            Self::Parts(parts) => {
                let mut points = parts.iter().flatten();
                let [x, y] = points.next()?;
                let mut bbox = BoundingBox::around(*x, *y);
                for [x, y] in points {
                    bbox.extend(&BoundingBox::around(*x, *y));
                }
                Some(bbox)
            }
        }
    }

    fn write_content<W: Write>(&self, shape_type: i32, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Null => writer.write_i32::<LittleEndian>(NULL_SHAPE),
            Self::Point([x, y]) => {
                writer.write_i32::<LittleEndian>(shape_type)?;
                writer.write_f64::<LittleEndian>(*x)?;
                writer.write_f64::<LittleEndian>(*y)
            }
            Self::Parts(parts) => {
                writer.write_i32::<LittleEndian>(shape_type)?;
                let bbox = self
                    .bounding_box()
                    .unwrap_or_else(|| BoundingBox::around(0.0, 0.0));
                bbox.write_to(writer)?;
                writer.write_i32::<LittleEndian>(to_i32(parts.len())?)?;
                writer.write_i32::<LittleEndian>(to_i32(Self::point_count(parts))?)?;

                let mut start = 0;
                for part in parts {
                    writer.write_i32::<LittleEndian>(to_i32(start)?)?;
                    start += part.len();
                }
                for [x, y] in parts.iter().flatten() {
                    writer.write_f64::<LittleEndian>(*x)?;
                    writer.write_f64::<LittleEndian>(*y)?;
                }
                Ok(())
            }
        }
    }
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "shapefile too large"))
}

fn words(bytes: usize) -> io::Result<i32> {
    to_i32(bytes / 2)
}

fn write_header<W: Write>(
    writer: &mut W,
    file_bytes: usize,
    shape_type: i32,
    bbox: &BoundingBox,
) -> io::Result<()> {
    writer.write_i32::<BigEndian>(FILE_CODE)?;
    for _ in 0..5 {
        writer.write_i32::<BigEndian>(0)?;
    }
    writer.write_i32::<BigEndian>(words(file_bytes)?)?;
    writer.write_i32::<LittleEndian>(VERSION)?;
    writer.write_i32::<LittleEndian>(shape_type)?;
    bbox.write_to(writer)?;
    // Z and M ranges
    for _ in 0..4 {
        writer.write_f64::<LittleEndian>(0.0)?;
    }
    Ok(())
}

/// Writes the `.shp` and `.shx` files for one shape type.
///
/// Returns `(shp, shx)`.
pub(crate) fn write_shapes(shape_type: i32, shapes: &[Shape]) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let bbox = shapes
        .iter()
        .filter_map(Shape::bounding_box)
        .reduce(|mut acc, next| {
            acc.extend(&next);
            acc
        })
        .unwrap_or_else(|| BoundingBox::around(0.0, 0.0));

    let shp_bytes = HEADER_BYTES
        + shapes
            .iter()
            .map(|shape| RECORD_HEADER_BYTES + shape.content_bytes())
            .sum::<usize>();
    let shx_bytes = HEADER_BYTES + RECORD_HEADER_BYTES * shapes.len();

    let mut shp = Vec::with_capacity(shp_bytes);
    let mut shx = Vec::with_capacity(shx_bytes);
    write_header(&mut shp, shp_bytes, shape_type, &bbox)?;
    write_header(&mut shx, shx_bytes, shape_type, &bbox)?;

    for (index, shape) in shapes.iter().enumerate() {
        let offset = words(shp.len())?;
        let content = words(shape.content_bytes())?;

        shp.write_i32::<BigEndian>(to_i32(index + 1)?)?;
        shp.write_i32::<BigEndian>(content)?;
        shape.write_content(shape_type, &mut shp)?;

        shx.write_i32::<BigEndian>(offset)?;
        shx.write_i32::<BigEndian>(content)?;
    }

    debug_assert_eq!(shp.len(), shp_bytes);
    Ok((shp, shx))
}
