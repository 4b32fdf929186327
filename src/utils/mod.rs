pub mod ocr;
pub mod process;
pub mod raster;

pub use ocr::{CannedPageSource, PageSource, Recognizer, TesseractPageSource, TextDumpSource};
pub use process::run_with_timeout;
pub use raster::{RasterizedPage, Rasterizer};
