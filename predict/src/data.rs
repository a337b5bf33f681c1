use std::path::{Path, PathBuf};

use image::{imageops::{self, FilterType}, io::Reader as ImageReader, GrayImage, ImageError, RgbImage};
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::{classifier::{InputShape, InputTensor, ShapeKind}, error::PredictError};

const IMAGE_MODE: &str = "image";

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Image { path: PathBuf },
    Tabular { features: String },
}

impl Request {
    /// `args` excludes the program name.
    pub fn from_args(args: &[String]) -> Result<Self, PredictError> {
        match args {
            [mode, path, ..] if mode == IMAGE_MODE => Ok(Request::Image { path: PathBuf::from(path) }),
            [features, ..] => Ok(Request::Tabular { features: features.clone() }),
            [] => Err(PredictError::InputParse(String::from("expected `image <path>` or a JSON feature array"))),
        }
    }
}

/// Builds the model input for `request`.
///
/// Tabular input against an image model is answered with a uniformly random
/// image tensor: the argument only has to be valid JSON, its content is ignored.
pub fn resolve<R: Rng>(request: &Request, shape: &InputShape, rng: &mut R) -> Result<InputTensor, PredictError> {
    let input = match request {
        Request::Image { path } => {
            let not_image = || PredictError::ShapeMismatch(String::from("Model is not an image model"));
            if !shape.is_image() {
                return Err(not_image());
            }
            let ShapeKind::Image { height, width, channels } = shape.kind()? else {
                return Err(not_image());
            };
            load_image(path, height, width, channels)?
        }
        Request::Tabular { features: raw } => {
            let value = parse_json(raw)?;
            match shape.kind()? {
                ShapeKind::Image { height, width, channels } => {
                    debug!("tabular input for an image model, substituting random pixels");
                    let pixels = (0..height * width * channels).map(|_| rng.gen::<f32>()).collect();
                    InputTensor::Image { pixels, height, width, channels }
                }
                ShapeKind::Tabular { features: expected } => {
                    let mut features = Vec::new();
                    flatten(&value, &mut features)?;
                    match expected {
                        Some(expected) if expected != features.len() => {
                            return Err(PredictError::ShapeMismatch(format!(
                                "cannot reshape {} features into (1, {expected})",
                                features.len()
                            )));
                        }
                        _ => InputTensor::Tabular { features },
                    }
                }
            }
        }
    };
    debug!("resolved input tensor {:?}", input.dims());

    Ok(input)
}

/// Parses a JSON number, boolean or rectangular nested array of those into a
/// flat row-major vector.
pub fn parse_features(raw: &str) -> Result<Vec<f32>, PredictError> {
    let mut features = Vec::new();
    flatten(&parse_json(raw)?, &mut features)?;

    Ok(features)
}

fn parse_json(raw: &str) -> Result<Value, PredictError> {
    serde_json::from_str(raw).map_err(|err| PredictError::InputParse(format!("malformed JSON: {err}")))
}

/// Appends the scalars of `value` to `out` and returns its dimensions.
fn flatten(value: &Value, out: &mut Vec<f32>) -> Result<Vec<usize>, PredictError> {
    match value {
        Value::Number(number) => {
            let number = number
                .as_f64()
                .ok_or_else(|| PredictError::InputParse(format!("unrepresentable number {number}")))?;
            out.push(number as f32);
            Ok(Vec::new())
        }
        Value::Bool(flag) => {
            out.push(if *flag { 1.0 } else { 0.0 });
            Ok(Vec::new())
        }
        Value::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let dims = flatten(item, out)?;
                match &inner {
                    Some(expected) if *expected != dims => {
                        return Err(PredictError::InputParse(String::from("feature array is not rectangular")));
                    }
                    Some(_) => {}
                    None => inner = Some(dims),
                }
            }
            let mut dims = vec![items.len()];
            dims.extend(inner.unwrap_or_default());
            Ok(dims)
        }
        other => Err(PredictError::InputParse(format!("expected numbers, found {other}"))),
    }
}

/// Decodes `path` and turns it into a (1, height, width, channels) tensor
/// scaled to [0, 1].
pub fn load_image(path: &Path, height: usize, width: usize, channels: usize) -> Result<InputTensor, PredictError> {
    let decode_err = |source: ImageError| PredictError::Decode { path: path.to_path_buf(), source };
    let image = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|err| decode_err(ImageError::IoError(err)))?
        .decode()
        .map_err(decode_err)?;

    let (width_px, height_px) = (width as u32, height as u32);
    let rgb = image.to_rgb8();
    let bytes = match channels {
        1 => imageops::resize(&to_luma(&rgb), width_px, height_px, FilterType::CatmullRom).into_raw(),
        3 => imageops::resize(&rgb, width_px, height_px, FilterType::CatmullRom).into_raw(),
        other => {
            return Err(PredictError::ShapeMismatch(format!(
                "cannot reshape an RGB image into (1, {height}, {width}, {other})"
            )));
        }
    };
    let pixels = bytes.into_iter().map(|byte| byte as f32 / 255.0).collect();

    Ok(InputTensor::Image { pixels, height, width, channels })
}

/// ITU-R 601-2 luma, L = R * 299/1000 + G * 587/1000 + B * 114/1000.
fn to_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        image::Luma([luma as u8])
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgb, Rgba, RgbaImage};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn tabular(features: usize) -> InputShape {
        InputShape::new(vec![None, Some(features)])
    }

    fn image_shape(height: usize, width: usize, channels: usize) -> InputShape {
        InputShape::new(vec![None, Some(height), Some(width), Some(channels)])
    }

    #[test]
    fn image_mode_needs_a_path() {
        assert_eq!(
            Request::from_args(&args(&["image", "cat.png"])).unwrap(),
            Request::Image { path: PathBuf::from("cat.png") }
        );
        // a lone `image` is taken as the feature argument and fails as JSON
        assert_eq!(
            Request::from_args(&args(&["image"])).unwrap(),
            Request::Tabular { features: String::from("image") }
        );
        assert!(matches!(Request::from_args(&[]), Err(PredictError::InputParse(_))));
    }

    #[test]
    fn nested_arrays_are_flattened_row_major() {
        assert_eq!(parse_features("[[1, 2], [3, 4.5]]").unwrap(), vec![1.0, 2.0, 3.0, 4.5]);
        assert_eq!(parse_features("[true, false, 2]").unwrap(), vec![1.0, 0.0, 2.0]);
        assert_eq!(parse_features("7").unwrap(), vec![7.0]);
        assert!(parse_features("[]").unwrap().is_empty());
    }

    #[test]
    fn bad_feature_json_is_rejected() {
        for raw in ["not-json", "[1, \"a\"]", "[[1, 2], [3]]", "{\"x\": 1}", "null", "[1, 2"] {
            assert!(
                matches!(parse_features(raw), Err(PredictError::InputParse(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn tabular_features_must_match_feature_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let request = Request::Tabular { features: String::from("[0.1, 0.9]") };

        let input = resolve(&request, &tabular(2), &mut rng).unwrap();
        assert_eq!(input, InputTensor::Tabular { features: vec![0.1, 0.9] });

        let err = resolve(&request, &tabular(3), &mut rng).unwrap_err();
        assert_eq!(err.to_string(), "cannot reshape 2 features into (1, 3)");

        let open = InputShape::new(vec![None, None]);
        assert_eq!(resolve(&request, &open, &mut rng).unwrap().dims(), vec![1, 2]);
    }

    #[test]
    fn tabular_input_for_image_model_becomes_random_pixels() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = Request::Tabular { features: String::from("[1, 2, 3]") };

        let input = resolve(&request, &image_shape(4, 5, 3), &mut rng).unwrap();
        let InputTensor::Image { pixels, height, width, channels } = input else {
            panic!("expected an image tensor");
        };
        assert_eq!((height, width, channels), (4, 5, 3));
        assert_eq!(pixels.len(), 60);
        assert!(pixels.iter().all(|p| (0.0..1.0).contains(p)));

        // any valid JSON is accepted, numeric or not
        for raw in [r#"["a", "b"]"#, "[[1, 2], [3]]", r#"{"x": 1}"#, "null"] {
            let request = Request::Tabular { features: String::from(raw) };
            let input = resolve(&request, &image_shape(2, 2, 1), &mut rng).unwrap();
            assert_eq!(input.dims(), vec![1, 2, 2, 1], "{raw}");
        }

        let malformed = Request::Tabular { features: String::from("not-json") };
        assert!(matches!(
            resolve(&malformed, &image_shape(4, 5, 3), &mut rng),
            Err(PredictError::InputParse(_))
        ));
    }

    #[test]
    fn unsupported_shapes_fail_before_reading_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let shape = InputShape::new(vec![None, Some(3), Some(3)]);
        let request = Request::Tabular { features: String::from("[1, 2, 3]") };
        assert!(matches!(resolve(&request, &shape, &mut rng), Err(PredictError::ShapeMismatch(_))));

        let request = Request::Image { path: PathBuf::from("/does/not/exist.png") };
        let err = resolve(&request, &shape, &mut rng).unwrap_err();
        assert_eq!(err.to_string(), "Model is not an image model");
    }

    #[test]
    fn non_numeric_features_are_rejected_for_tabular_models() {
        let mut rng = StdRng::seed_from_u64(0);
        let request = Request::Tabular { features: String::from(r#"["a", "b"]"#) };
        assert!(matches!(resolve(&request, &tabular(2), &mut rng), Err(PredictError::InputParse(_))));
    }

    #[test]
    fn image_request_against_tabular_model_is_refused() {
        let mut rng = StdRng::seed_from_u64(0);
        let request = Request::Image { path: PathBuf::from("cat.png") };
        let err = resolve(&request, &tabular(4), &mut rng).unwrap_err();
        assert_eq!(err.to_string(), "Model is not an image model");
    }

    #[test]
    fn rgb_image_is_resized_and_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        RgbImage::from_pixel(10, 6, Rgb([255, 255, 255])).save(&path).unwrap();

        let InputTensor::Image { pixels, height, width, channels } = load_image(&path, 3, 4, 3).unwrap() else {
            panic!("expected an image tensor");
        };
        assert_eq!((height, width, channels), (3, 4, 3));
        assert_eq!(pixels.len(), 3 * 4 * 3);
        assert!(pixels.iter().all(|p| (*p - 1.0).abs() < 1e-6));
    }

    #[test]
    fn single_channel_models_get_luma() {
        let dir = tempfile::tempdir().unwrap();
        // no extension, the format is sniffed from the content
        let path = dir.path().join("upload");
        RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let InputTensor::Image { pixels, .. } = load_image(&path, 2, 2, 1).unwrap() else {
            panic!("expected an image tensor");
        };
        assert_eq!(pixels.len(), 4);
        assert!(pixels.iter().all(|p| (*p - 76.0 / 255.0).abs() < 1e-6));
    }

    #[test]
    fn width_and_height_follow_the_model_axes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripe.png");
        // left half black, right half white
        RgbImage::from_fn(8, 8, |x, _| if x < 4 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) })
            .save(&path)
            .unwrap();

        let InputTensor::Image { pixels, .. } = load_image(&path, 1, 2, 1).unwrap() else {
            panic!("expected an image tensor");
        };
        assert_eq!(pixels.len(), 2);
        assert!(pixels[0] < 0.5 && pixels[1] > 0.5);
    }

    #[test]
    fn unreadable_images_are_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();

        for path in [garbage, dir.path().join("missing.png")] {
            assert!(matches!(load_image(&path, 2, 2, 3), Err(PredictError::Decode { .. })));
        }
    }

    #[test]
    fn unsupported_channel_counts_are_shape_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(&path).unwrap();

        assert!(matches!(load_image(&path, 2, 2, 4), Err(PredictError::ShapeMismatch(_))));
    }
}
