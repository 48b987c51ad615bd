pub mod replay;

#[cfg(all(feature = "detector-vision", target_os = "macos"))]
pub mod vision;
