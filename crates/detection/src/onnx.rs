//! ONNX Runtime backed capabilities
//!
//! - `OnnxFaceDetector`: YOLOv8-face (box, score, 5 keypoints)
//! - `OnnxObjectDetector`: YOLOv8 trained on COCO-80
//! - `OnnxFaceEmbedder`: ArcFace-style 112x112 embedding model
//! - `OnnxLandmarkExtractor`: 68-point regressor on a square face crop

use frame_capture::VideoFrame;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, error, info};

use crate::capability::{FaceDetector, FaceEmbedder, LandmarkExtractor, ObjectDetector};
use crate::types::{BoundingBox, DetectedObject, FaceBox, Landmarks, Point, LANDMARK_COUNT};
use crate::DetectionError;

/// YOLOv8 input resolution
const YOLO_INPUT_SIZE: u32 = 640;

/// ArcFace input resolution
const EMBEDDING_INPUT_SIZE: u32 = 112;

/// Landmark regressor input resolution
const LANDMARK_INPUT_SIZE: u32 = 112;

/// Margin added around the face box before the landmark crop
const LANDMARK_CROP_PAD: f32 = 0.1;

/// Smallest crop side worth running the landmark model on
const MIN_LANDMARK_CROP: f32 = 8.0;

/// NMS IoU threshold
const NMS_IOU_THRESH: f32 = 0.45;

/// Scores below this never reach the adapter's own threshold
const MIN_RAW_SCORE: f32 = 0.05;

/// Face score below which a YOLO-face anchor is discarded
const FACE_SCORE_THRESH: f32 = 0.25;

/// COCO class ids worth naming; the rest keep a numeric label
const COCO_LABELS: &[(usize, &str)] = &[
    (0, "person"),
    (63, "laptop"),
    (64, "mouse"),
    (65, "remote"),
    (66, "keyboard"),
    (67, "cell_phone"),
    (73, "book"),
];

fn coco_label(class_id: usize) -> String {
    COCO_LABELS
        .iter()
        .find(|(id, _)| *id == class_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("coco_{}", class_id))
}

fn load_session(path: &str, what: &str) -> Result<Session, DetectionError> {
    info!("Loading {} model from {}", what, path);
    Session::builder()
        .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| {
            error!("Failed to load {} model: {}", what, e);
            DetectionError::ModelLoad(e.to_string())
        })
}

/// Resize and pack an RGB image into an NCHW tensor
fn to_nchw(img: &RgbImage, size: u32, normalize: impl Fn(u8) -> f32) -> Array4<f32> {
    let resized = image::imageops::resize(img, size, size, FilterType::Triangle);
    let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = normalize(pixel[c]);
        }
    }
    input
}

fn inference_error(e: ort::Error) -> DetectionError {
    DetectionError::Inference(e.to_string())
}

struct Candidate {
    class_id: usize,
    score: f32,
    bbox: BoundingBox,
}

/// Greedy per-class non-maximum suppression
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Run a YOLO model and return the transposed output with its feature count
fn run_yolo(
    session: &mut Session,
    frame: &VideoFrame,
) -> Result<(Vec<f32>, usize, usize), DetectionError> {
    let img = frame.to_rgb_image()?;
    let input = to_nchw(&img, YOLO_INPUT_SIZE, |v| v as f32 / 255.0);

    let tensor = Tensor::from_array(input).map_err(inference_error)?;
    let outputs = session.run(ort::inputs![tensor]).map_err(inference_error)?;
    let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(inference_error)?;

    // [1, features, anchors]
    if shape.len() != 3 || shape[1] <= 4 {
        return Err(DetectionError::Inference(format!("Unexpected YOLO output shape: {:?}", shape)));
    }
    Ok((data.to_vec(), shape[1] as usize, shape[2] as usize))
}

/// YOLOv8-face detector
pub struct OnnxFaceDetector {
    session: Session,
}

impl OnnxFaceDetector {
    pub fn new(model_path: &str) -> Result<Self, DetectionError> {
        Ok(Self {
            session: load_session(model_path, "face detection")?,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<FaceBox>, DetectionError> {
        let (data, _num_feats, num_anchors) = run_yolo(&mut self.session, frame)?;
        let sx = frame.width() as f32 / YOLO_INPUT_SIZE as f32;
        let sy = frame.height() as f32 / YOLO_INPUT_SIZE as f32;

        // Row layout: cx, cy, w, h, score, then keypoints (unused)
        let mut candidates = Vec::new();
        for i in 0..num_anchors {
            let at = |f: usize| data[f * num_anchors + i];
            let score = at(4);
            if score < FACE_SCORE_THRESH {
                continue;
            }
            let (cx, cy, w, h) = (at(0), at(1), at(2), at(3));
            candidates.push(Candidate {
                class_id: 0,
                score,
                bbox: BoundingBox::new((cx - w / 2.0) * sx, (cy - h / 2.0) * sy, w * sx, h * sy),
            });
        }

        let mut kept = nms(candidates, NMS_IOU_THRESH);
        // Left to right keeps detector order stable across frames
        kept.sort_by(|a, b| a.bbox.x.partial_cmp(&b.bbox.x).unwrap_or(std::cmp::Ordering::Equal));
        debug!("YOLO-face kept {} faces after NMS", kept.len());

        Ok(kept.into_iter().map(|c| FaceBox::new(c.bbox, c.score)).collect())
    }
}

/// YOLOv8 object detector
pub struct OnnxObjectDetector {
    session: Session,
}

impl OnnxObjectDetector {
    pub fn new(model_path: &str) -> Result<Self, DetectionError> {
        Ok(Self {
            session: load_session(model_path, "object detection")?,
        })
    }
}

impl ObjectDetector for OnnxObjectDetector {
    fn detect_objects(
        &mut self,
        frame: &VideoFrame,
    ) -> Result<Vec<DetectedObject>, DetectionError> {
        // Stretch to 640x640, scale to 0..1, output [1, 4 + classes, anchors]
        let (data, num_feats, num_anchors) = run_yolo(&mut self.session, frame)?;
        let num_classes = num_feats - 4;
        let sx = frame.width() as f32 / YOLO_INPUT_SIZE as f32;
        let sy = frame.height() as f32 / YOLO_INPUT_SIZE as f32;

        let mut candidates = Vec::new();
        for i in 0..num_anchors {
            let at = |f: usize| data[f * num_anchors + i];

            let (class_id, score) = (0..num_classes)
                .map(|c| (c, at(4 + c)))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if score < MIN_RAW_SCORE {
                continue;
            }

            let (cx, cy, w, h) = (at(0), at(1), at(2), at(3));
            candidates.push(Candidate {
                class_id,
                score,
                bbox: BoundingBox::new((cx - w / 2.0) * sx, (cy - h / 2.0) * sy, w * sx, h * sy),
            });
        }

        let kept = nms(candidates, NMS_IOU_THRESH);
        debug!("YOLO kept {} detections after NMS", kept.len());

        Ok(kept
            .into_iter()
            .map(|c| DetectedObject::new(coco_label(c.class_id), c.score, c.bbox))
            .collect())
    }
}

/// ArcFace-style face embedder
pub struct OnnxFaceEmbedder {
    session: Session,
}

impl OnnxFaceEmbedder {
    pub fn new(model_path: &str) -> Result<Self, DetectionError> {
        Ok(Self {
            session: load_session(model_path, "face embedding")?,
        })
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn embed(
        &mut self,
        frame: &VideoFrame,
        face: &BoundingBox,
        _landmarks: Option<&Landmarks>,
    ) -> Result<Vec<f32>, DetectionError> {
        let crop = frame
            .crop(
                face.x.max(0.0) as u32,
                face.y.max(0.0) as u32,
                face.width.max(1.0) as u32,
                face.height.max(1.0) as u32,
            )
            .ok_or_else(|| DetectionError::ImageProcessing("Face box outside frame".to_string()))?;

        let img = crop.to_rgb_image()?;
        let input = to_nchw(&img, EMBEDDING_INPUT_SIZE, |v| v as f32 / 127.5 - 1.0);

        let tensor = Tensor::from_array(input).map_err(inference_error)?;
        let outputs = self.session.run(ort::inputs![tensor]).map_err(inference_error)?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>().map_err(inference_error)?;

        let mut embedding = data.to_vec();
        if embedding.is_empty() {
            return Err(DetectionError::Embedding("Model returned an empty embedding".to_string()));
        }

        // L2 normalization
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(embedding)
    }
}

/// Square region `(x, y, w, h)` around a face box, padded and clamped to the frame
fn square_crop(
    face: &BoundingBox,
    frame_width: u32,
    frame_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let size = face.width.max(face.height) * (1.0 + LANDMARK_CROP_PAD);
    let x = (face.x + face.width / 2.0 - size / 2.0).max(0.0);
    let y = (face.y + face.height / 2.0 - size / 2.0).max(0.0);
    let w = size.min(frame_width as f32 - x);
    let h = size.min(frame_height as f32 - y);

    // Also rejects NaN boxes
    if !(w >= MIN_LANDMARK_CROP && h >= MIN_LANDMARK_CROP) {
        return None;
    }
    Some((x as u32, y as u32, w as u32, h as u32))
}

/// Map normalized `[x0, y0, x1, y1, ...]` crop coordinates back into the frame
fn landmarks_from_output(data: &[f32], region: &BoundingBox) -> Result<Landmarks, DetectionError> {
    if data.len() < LANDMARK_COUNT * 2 {
        return Err(DetectionError::LandmarkExtraction(format!(
            "Landmark model returned {} values, expected {}",
            data.len(),
            LANDMARK_COUNT * 2
        )));
    }

    let points = data
        .chunks_exact(2)
        .take(LANDMARK_COUNT)
        .map(|p| Point::new(region.x + p[0] * region.width, region.y + p[1] * region.height))
        .collect();
    Landmarks::new(points)
}

/// 68-point facial landmark regressor (PFLD-style, `[1, 136]` output in crop units)
pub struct OnnxLandmarkExtractor {
    session: Session,
}

impl OnnxLandmarkExtractor {
    pub fn new(model_path: &str) -> Result<Self, DetectionError> {
        Ok(Self {
            session: load_session(model_path, "facial landmark")?,
        })
    }
}

impl LandmarkExtractor for OnnxLandmarkExtractor {
    fn extract(
        &mut self,
        frame: &VideoFrame,
        face: &BoundingBox,
    ) -> Result<Landmarks, DetectionError> {
        let out_of_frame = || {
            DetectionError::LandmarkExtraction("Face box too small or outside frame".to_string())
        };
        let (x, y, w, h) =
            square_crop(face, frame.width(), frame.height()).ok_or_else(out_of_frame)?;
        let crop = frame.crop(x, y, w, h).ok_or_else(out_of_frame)?;
        let (width, height) = (crop.width() as f32, crop.height() as f32);
        let region = BoundingBox::new(x as f32, y as f32, width, height);

        let img = crop.to_rgb_image()?;
        let input = to_nchw(&img, LANDMARK_INPUT_SIZE, |v| v as f32 / 255.0);

        let tensor = Tensor::from_array(input).map_err(inference_error)?;
        let outputs = self.session.run(ort::inputs![tensor]).map_err(inference_error)?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>().map_err(inference_error)?;

        landmarks_from_output(data, &region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_labels() {
        assert_eq!(coco_label(67), "cell_phone");
        assert_eq!(coco_label(2), "coco_2");
    }

    #[test]
    fn test_nms_keeps_best_per_class() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let kept = nms(
            vec![
                Candidate { class_id: 67, score: 0.6, bbox },
                Candidate { class_id: 67, score: 0.9, bbox },
                Candidate { class_id: 73, score: 0.7, bbox },
            ],
            NMS_IOU_THRESH,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_square_crop_pads_and_squares() {
        let face = BoundingBox::new(100.0, 100.0, 40.0, 60.0);
        let (x, y, w, h) = square_crop(&face, 640, 480).unwrap();

        // 60 * 1.1 = 66 around centre (120, 130)
        assert_eq!((x, y), (87, 97));
        assert_eq!((w, h), (66, 66));
    }

    #[test]
    fn test_square_crop_clamped_to_frame() {
        let face = BoundingBox::new(-10.0, 450.0, 50.0, 50.0);
        let (x, y, w, h) = square_crop(&face, 640, 480).unwrap();
        // Top edge at 447.5, so only 32 rows remain below it
        assert_eq!((x, y), (0, 447));
        assert_eq!((w, h), (55, 32));
    }

    #[test]
    fn test_square_crop_rejects_degenerate_boxes() {
        assert!(square_crop(&BoundingBox::new(10.0, 10.0, 2.0, 2.0), 640, 480).is_none());
        assert!(square_crop(&BoundingBox::new(700.0, 10.0, 40.0, 40.0), 640, 480).is_none());
        assert!(square_crop(&BoundingBox::new(f32::NAN, 10.0, 40.0, 40.0), 640, 480).is_none());
    }

    #[test]
    fn test_landmarks_mapped_into_frame() {
        let mut data = vec![0.5; LANDMARK_COUNT * 2];
        data[0] = 0.0;
        data[1] = 1.0;
        let region = BoundingBox::new(100.0, 50.0, 80.0, 80.0);

        let landmarks = landmarks_from_output(&data, &region).unwrap();
        assert_eq!(landmarks.points()[0], Point::new(100.0, 130.0));
        assert_eq!(landmarks.points()[1], Point::new(140.0, 90.0));
    }

    #[test]
    fn test_short_landmark_output_rejected() {
        let region = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(
            landmarks_from_output(&[0.5; 10], &region),
            Err(DetectionError::LandmarkExtraction(_))
        ));
    }
}
