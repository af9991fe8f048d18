//! Neural Network inference.
//!
//! Networks are loaded from ONNX files and run on the CPU with `tract`.

use std::{
    fmt,
    ops::RangeInclusive,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use signprep_image::{AsImageView, Color, ImageView, Resolution};
use tract_onnx::prelude::{
    tract_ndarray::{Array4, ArrayViewD},
    tvec, Framework, Graph, InferenceModelExt, SimplePlan, TValue, TVec, Tensor, TypedFact,
    TypedOp,
};

type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A convolutional neural network (CNN) that operates on image data.
///
/// Like the underlying [`NeuralNetwork`], this is a cheaply [`Clone`]able handle to the underlying
/// data.
#[derive(Clone)]
pub struct Cnn {
    nn: NeuralNetwork,
    shape: CnnInputShape,
    input_res: Resolution,
    color_mapper: ColorMapper,
}

impl Cnn {
    /// Creates a CNN wrapper from a [`NeuralNetwork`].
    ///
    /// The network must have exactly one input of shape `[1, 3, H, W]` or `[1, H, W, 3]`. The
    /// memory layout is picked based on which of the two the input matches.
    pub fn new(nn: NeuralNetwork, color_mapper: ColorMapper) -> anyhow::Result<Self> {
        if nn.num_inputs() != 1 {
            anyhow::bail!(
                "CNN network has to take exactly 1 input, this one takes {}",
                nn.num_inputs(),
            );
        }

        let tensor_shape = nn.input_shape(0)?;
        let Some((shape, input_res)) = CnnInputShape::detect(tensor_shape) else {
            anyhow::bail!("invalid model input shape for a CNN: {:?}", tensor_shape);
        };
        log::debug!("CNN input: {:?} {}", shape, input_res);

        Ok(Self {
            nn,
            shape,
            input_res,
            color_mapper,
        })
    }

    /// Returns the expected input image size.
    #[inline]
    pub fn input_resolution(&self) -> Resolution {
        self.input_res
    }

    #[inline]
    pub fn input_shape(&self) -> CnnInputShape {
        self.shape
    }

    /// Runs the network on an input image, returning the estimated outputs.
    ///
    /// The input image will be sampled to create the network's input tensor. If the image's aspect
    /// ratio does not match the network's input aspect ratio, the image will be stretched.
    pub fn estimate<V: AsImageView>(&self, image: &V) -> anyhow::Result<Outputs> {
        self.estimate_impl(image.as_view())
    }

    fn estimate_impl(&self, image: ImageView<'_>) -> anyhow::Result<Outputs> {
        let tensor = image_tensor(image, self.shape, self.input_res, &self.color_mapper);
        self.nn.estimate(tvec![tensor])
    }
}

/// Samples `view` at the center of every input cell and arranges the mapped colors in `shape`.
fn image_tensor(
    view: ImageView<'_>,
    shape: CnnInputShape,
    res: Resolution,
    color_mapper: &ColorMapper,
) -> Tensor {
    let (h, w) = (res.height() as usize, res.width() as usize);
    let sample = |x: usize, y: usize| -> Color {
        let u = (x as f32 + 0.5) / w as f32;
        let v = (y as f32 + 0.5) / h as f32;
        let px = (u * view.width() as f32) as u32;
        let py = (v * view.height() as f32) as u32;
        view.get(px, py)
    };

    // Sample every pixel once, then lay the channels out as requested.
    let pixels = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| color_mapper.map(sample(x, y)))
        .collect::<Vec<_>>();

    let array = match shape {
        CnnInputShape::NCHW => {
            Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| pixels[y * w + x][c])
        }
        CnnInputShape::NHWC => {
            Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| pixels[y * w + x][c])
        }
    };
    Tensor::from(array)
}

/// Maps 8-bit sRGB colors to network input values.
#[derive(Clone)]
pub struct ColorMapper {
    target_range: RangeInclusive<f32>,
}

impl ColorMapper {
    /// Creates a simple color mapper that uniformly maps sRGB values to `target_range`.
    ///
    /// Note that this operates on *non-linear* sRGB colors, but maps them linearly to the target
    /// range.
    pub fn linear(target_range: RangeInclusive<f32>) -> Self {
        assert!(target_range.end() > target_range.start());
        Self { target_range }
    }

    fn map(&self, color: Color) -> [f32; 3] {
        let start = *self.target_range.start();
        let end = *self.target_range.end();

        let adjust_range = (end - start) / 255.0;
        [color.r(), color.g(), color.b()].map(|col| col as f32 * adjust_range + start)
    }
}

/// Describes in what order a CNN expects its input image data.
///
/// - `N` is the number of images, fixed at 1.
/// - `C` is the number of color channels, 3 for RGB inputs.
/// - `H` and `W` are the height and width of the input, respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CnnInputShape {
    /// Shape is `[N, C, H, W]`.
    NCHW,
    /// Shape is `[N, H, W, C]`.
    NHWC,
}

impl CnnInputShape {
    /// Detects the layout and input resolution from a concrete input tensor shape.
    ///
    /// A `[1, 3, 3, 3]` shape is ambiguous and treated as `NCHW`.
    pub fn detect(shape: &[usize]) -> Option<(Self, Resolution)> {
        let (layout, w, h) = match *shape {
            [1, 3, h, w] => (Self::NCHW, w, h),
            [1, h, w, 3] => (Self::NHWC, w, h),
            _ => return None,
        };
        let res = Resolution::new(w.try_into().ok()?, h.try_into().ok()?);
        Some((layout, res))
    }
}

/// A neural network that can be used for inference.
///
/// This is a cheaply [`Clone`]able handle to the underlying network structures.
#[derive(Clone)]
pub struct NeuralNetwork(Arc<Model>);

impl NeuralNetwork {
    /// Loads and optimizes a pre-trained model from an ONNX file path.
    ///
    /// The path must have a `.onnx` extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::from_path_impl(path.as_ref())
    }

    fn from_path_impl(path: &Path) -> anyhow::Result<Self> {
        match path.extension() {
            Some(ext) if ext == "onnx" => {}
            _ => anyhow::bail!(
                "neural network file '{}' must have `.onnx` extension",
                path.display()
            ),
        }

        let model_data = std::fs::read(path)
            .with_context(|| format!("failed to read model '{}'", path.display()))?;
        Self::from_onnx(&model_data)
            .with_context(|| format!("failed to load model '{}'", path.display()))
    }

    /// Loads and optimizes a pre-trained model from an in-memory ONNX file.
    ///
    /// Returns an error if the network data is malformed, if the network data is incomplete, or if
    /// the network uses unimplemented operations.
    pub fn from_onnx(raw: &[u8]) -> anyhow::Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut &*raw)?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self(Arc::new(model)))
    }

    /// Returns the number of input nodes of the network.
    pub fn num_inputs(&self) -> usize {
        self.0.model().inputs.len()
    }

    /// Returns the concrete tensor shape of input `index`.
    pub fn input_shape(&self, index: usize) -> anyhow::Result<&[usize]> {
        let fact = self.0.model().input_fact(index)?;
        fact.shape
            .as_concrete()
            .with_context(|| format!("network input {index} has a symbolic shape"))
    }

    /// Runs the network on a set of input tensors, returning the estimated [`Outputs`].
    #[doc(alias = "infer")]
    pub fn estimate(&self, inputs: TVec<Tensor>) -> anyhow::Result<Outputs> {
        let inner = self.0.run(
            inputs
                .into_iter()
                .map(|t| TValue::from_const(Arc::new(t)))
                .collect(),
        )?;
        Ok(Outputs { inner })
    }
}

/// The result of a neural network inference pass.
///
/// This is a list of tensors corresponding to the network's output nodes.
pub struct Outputs {
    inner: TVec<TValue>,
}

impl Outputs {
    /// Returns the number of tensors in this inference output.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_tensors(tensors: Vec<Tensor>) -> Self {
        Self {
            inner: tensors
                .into_iter()
                .map(|t| TValue::from_const(Arc::new(t)))
                .collect(),
        }
    }

    /// Returns output `index` as an `f32` array view.
    pub fn f32_view(&self, index: usize) -> anyhow::Result<ArrayViewD<'_, f32>> {
        let tensor = self
            .inner
            .get(index)
            .with_context(|| format!("network has no output {index}"))?;
        tensor.to_array_view::<f32>()
    }
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.iter().map(|t| t.shape()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use signprep_image::{Image, Rect};
    use tract_onnx::prelude::tract_ndarray::Ix4;

    use super::*;

    #[test]
    fn color_mapper() {
        let mapper = ColorMapper::linear(-1.0..=1.0);
        assert_eq!(mapper.map(Color::BLACK), [-1.0, -1.0, -1.0]);
        assert_eq!(mapper.map(Color::WHITE), [1.0, 1.0, 1.0]);

        let mapper = ColorMapper::linear(0.0..=1.0);
        assert_eq!(mapper.map(Color::RED), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn detect_input_shape() {
        assert_eq!(
            CnnInputShape::detect(&[1, 3, 192, 192]),
            Some((CnnInputShape::NCHW, Resolution::square(192)))
        );
        assert_eq!(
            CnnInputShape::detect(&[1, 224, 160, 3]),
            Some((CnnInputShape::NHWC, Resolution::new(160, 224)))
        );
        assert_eq!(CnnInputShape::detect(&[1, 4, 192, 192]), None);
        assert_eq!(CnnInputShape::detect(&[3, 192, 192]), None);
    }

    #[test]
    fn tensor_layouts() {
        // Left half red, right half blue.
        let mut image = Image::filled(Resolution::new(4, 2), Color::RED);
        image
            .view_mut(Rect::from_top_left(2.0, 0.0, 2.0, 2.0))
            .copy_from(&Image::filled(Resolution::new(2, 2), Color::BLUE));
        let mapper = ColorMapper::linear(0.0..=1.0);
        let res = Resolution::new(2, 1);

        let nchw = image_tensor(image.as_view(), CnnInputShape::NCHW, res, &mapper);
        assert_eq!(nchw.shape(), &[1, 3, 1, 2]);
        let nchw = nchw.to_array_view::<f32>().unwrap().into_dimensionality::<Ix4>().unwrap();
        assert_eq!(nchw[[0, 0, 0, 0]], 1.0);
        assert_eq!(nchw[[0, 2, 0, 0]], 0.0);
        assert_eq!(nchw[[0, 0, 0, 1]], 0.0);
        assert_eq!(nchw[[0, 2, 0, 1]], 1.0);

        let nhwc = image_tensor(image.as_view(), CnnInputShape::NHWC, res, &mapper);
        assert_eq!(nhwc.shape(), &[1, 1, 2, 3]);
        let nhwc = nhwc.to_array_view::<f32>().unwrap().into_dimensionality::<Ix4>().unwrap();
        assert_eq!(nhwc[[0, 0, 0, 0]], 1.0);
        assert_eq!(nhwc[[0, 0, 1, 2]], 1.0);
        assert_eq!(nhwc[[0, 0, 1, 0]], 0.0);
    }

    #[test]
    fn rejects_non_onnx_paths() {
        let err = NeuralNetwork::from_path("models/palm.tflite").err().unwrap();
        assert!(err.to_string().contains("`.onnx` extension"), "{err}");
    }
}
