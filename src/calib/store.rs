//! Parameter file persistence

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::calib::{CalibrationFlags, CalibrationRecord, ImagePoint};
use crate::error::{Error, Result};

/// Destination for calibration records. Existing files are overwritten.
pub trait ParameterStore {
    fn save(&self, path: &Path, record: &CalibrationRecord) -> Result<()>;
}

const YAML_HEADER: &str = "%YAML:1.0\n---\n";
const EXTRINSICS_COMMENT: &str =
    "a set of 6-tuples (rotation vector + translation vector) for each view";

/// Plain YAML writer, matrices laid out as `rows`/`cols`/`dt`/`data` nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlStore;

#[derive(Debug, Serialize, Deserialize)]
struct MatrixNode {
    rows: usize,
    cols: usize,
    dt: String,
    data: Vec<f64>,
}

impl MatrixNode {
    fn doubles(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        Self {
            rows,
            cols,
            dt: "d".into(),
            data,
        }
    }

    fn rows_of<const N: usize>(&self) -> Result<Vec<[f64; N]>> {
        if self.cols != N || self.data.len() != self.rows * N {
            return Err(Error::MalformedParameters(format!(
                "expected a ?x{N} matrix, found {}x{} with {} values",
                self.rows,
                self.cols,
                self.data.len()
            )));
        }
        Ok(self
            .data
            .chunks_exact(N)
            .map(|chunk| {
                let mut row = [0.0; N];
                row.copy_from_slice(chunk);
                row
            })
            .collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    calibration_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nframes: Option<usize>,
    image_width: u32,
    image_height: u32,
    board_width: u32,
    board_height: u32,
    square_size: f32,
    #[serde(rename = "aspectRatio", default, skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<f64>,
    flags: i32,
    camera_matrix: MatrixNode,
    distortion_coefficients: MatrixNode,
    avg_reprojection_error: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    per_view_reprojection_errors: Option<MatrixNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extrinsic_parameters: Option<MatrixNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_points: Option<MatrixNode>,
}

impl From<&CalibrationRecord> for Document {
    fn from(record: &CalibrationRecord) -> Self {
        let camera_matrix = record.camera_matrix.iter().flatten().copied().collect();
        let distortion = &record.distortion_coefficients;

        Self {
            calibration_time: record.calibration_time.clone(),
            nframes: record.nframes,
            image_width: record.image_width,
            image_height: record.image_height,
            board_width: record.board_width,
            board_height: record.board_height,
            square_size: record.square_size,
            aspect_ratio: record.aspect_ratio(),
            flags: record.flags.bits(),
            camera_matrix: MatrixNode::doubles(3, 3, camera_matrix),
            distortion_coefficients: MatrixNode::doubles(distortion.len(), 1, distortion.clone()),
            avg_reprojection_error: record.avg_reprojection_error,
            per_view_reprojection_errors: record
                .per_view_reprojection_errors
                .as_ref()
                .map(|errors| MatrixNode::doubles(errors.len(), 1, errors.clone())),
            extrinsic_parameters: record.extrinsic_parameters.as_ref().map(|views| {
                MatrixNode::doubles(views.len(), 6, views.iter().flatten().copied().collect())
            }),
            image_points: record.image_points.as_ref().map(|views| {
                let cols = views.first().map_or(0, Vec::len);
                MatrixNode {
                    rows: views.len(),
                    cols,
                    dt: "2f".into(),
                    data: views
                        .iter()
                        .flatten()
                        .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
                        .collect(),
                }
            }),
        }
    }
}

impl TryFrom<Document> for CalibrationRecord {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self> {
        let matrix = doc.camera_matrix.rows_of::<3>()?;
        let camera_matrix: [[f64; 3]; 3] = matrix
            .try_into()
            .map_err(|_| Error::MalformedParameters("camera_matrix must be 3x3".into()))?;

        let image_points = doc.image_points.map(|node| {
            let per_view = node.cols.max(1) * 2;
            node.data
                .chunks(per_view)
                .map(|view| {
                    view.chunks_exact(2)
                        .map(|xy| ImagePoint::new(xy[0] as f32, xy[1] as f32))
                        .collect()
                })
                .collect()
        });

        Ok(Self {
            calibration_time: doc.calibration_time,
            nframes: doc.nframes,
            image_width: doc.image_width,
            image_height: doc.image_height,
            board_width: doc.board_width,
            board_height: doc.board_height,
            square_size: doc.square_size,
            flags: CalibrationFlags::from_bits(
                doc.flags,
                doc.aspect_ratio.unwrap_or(CalibrationFlags::default().aspect_ratio),
            ),
            camera_matrix,
            distortion_coefficients: doc.distortion_coefficients.data,
            avg_reprojection_error: doc.avg_reprojection_error,
            per_view_reprojection_errors: doc.per_view_reprojection_errors.map(|node| node.data),
            extrinsic_parameters: doc
                .extrinsic_parameters
                .map(|node| node.rows_of::<6>())
                .transpose()?,
            image_points,
        })
    }
}

/// Put `# comment` lines above the keys they describe
fn annotate(body: &str, record: &CalibrationRecord) -> String {
    let flags_comment = record.flags.describe();
    let mut out = String::with_capacity(body.len() + 128);
    for line in body.lines() {
        if line.starts_with("flags:") {
            if let Some(comment) = &flags_comment {
                out.push_str("# ");
                out.push_str(comment);
                out.push('\n');
            }
        } else if line.starts_with("extrinsic_parameters:") {
            out.push_str("# ");
            out.push_str(EXTRINSICS_COMMENT);
            out.push('\n');
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

impl YamlStore {
    pub fn to_string(record: &CalibrationRecord) -> Result<String> {
        let body = serde_yaml::to_string(&Document::from(record))?;
        Ok(format!("{YAML_HEADER}{}", annotate(&body, record)))
    }

    pub fn parse(text: &str) -> Result<CalibrationRecord> {
        let body = text
            .strip_prefix(YAML_HEADER)
            .or_else(|| text.strip_prefix("%YAML:1.0\n"))
            .unwrap_or(text);
        let doc: Document = serde_yaml::from_str(body)?;
        CalibrationRecord::try_from(doc)
    }

    pub fn load(path: &Path) -> Result<CalibrationRecord> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

impl ParameterStore for YamlStore {
    #[instrument(skip(self, record))]
    fn save(&self, path: &Path, record: &CalibrationRecord) -> Result<()> {
        let text = Self::to_string(record)?;
        fs::write(path, text).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Wrote {} bytes of parameters", fs::metadata(path)?.len());
        Ok(())
    }
}

impl<S: ParameterStore + ?Sized> ParameterStore for Box<S> {
    fn save(&self, path: &Path, record: &CalibrationRecord) -> Result<()> {
        (**self).save(path, record)
    }
}
