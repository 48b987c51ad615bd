#[cfg(feature = "classifier-onnx")]
pub mod onnx;
