// Chart building: line traces and shaded categorical regions

pub mod figure;
pub mod intervals;
pub mod regions;
pub mod style;
pub mod traces;
