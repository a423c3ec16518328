pub mod detector_factory;
pub mod execution_provider;
pub mod face_expression_detector;
pub mod onnx_blazeface_locator;
pub mod onnx_ferplus_classifier;
