//! Batch configuration.

use crate::error::{Error, MAX_BATCH_CAPACITY};

/// Default number of quads a batch buffers before it is forced to flush.
pub const DEFAULT_BATCH_CAPACITY: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchConfig {
    /// Quads buffered per draw call at most.
    pub capacity: usize,
    /// Render target size in pixels (width, height).
    pub viewport: [f32; 2],
    /// UI zoom used by the nine-slice batch; UI space is `viewport / ui_zoom` half-extents.
    pub ui_zoom: f32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BATCH_CAPACITY,
            viewport: [800.0, 600.0],
            ui_zoom: 2.0,
        }
    }
}

impl BatchConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = [width, height];
        self
    }

    pub fn with_ui_zoom(mut self, zoom: f32) -> Self {
        self.ui_zoom = zoom;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity == 0 || self.capacity > MAX_BATCH_CAPACITY {
            return Err(Error::CapacityOutOfRange {
                capacity: self.capacity,
                max: MAX_BATCH_CAPACITY,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BatchConfig::default();
        assert_eq!(config.capacity, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(BatchConfig::default().with_capacity(0).validate().is_err());
        assert!(BatchConfig::default()
            .with_capacity(MAX_BATCH_CAPACITY)
            .validate()
            .is_ok());
        assert!(BatchConfig::default()
            .with_capacity(MAX_BATCH_CAPACITY + 1)
            .validate()
            .is_err());
    }
}
