// 純函數的分析階段：載入清理、彙總、趨勢擬合、預測

pub mod aggregator;
pub mod forecaster;
pub mod loader;
pub mod summary;
pub mod trend;
