//! Configuration for the NetCDF reader.

use serde::{Deserialize, Serialize};

/// Reader options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Apply `scale_factor` / `add_offset` attributes to decoded values.
    pub apply_scale_offset: bool,

    /// Decode raw values equal to the variable's `_FillValue` as NaN.
    pub mask_fill_values: bool,

    /// Derive the record count from the file length when the header
    /// carries the streaming sentinel.
    pub infer_streaming_records: bool,

    /// Upper bound for any element count read from the header.
    pub max_list_elements: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            apply_scale_offset: true,
            mask_fill_values: false,
            infer_streaming_records: true,
            max_list_elements: 1 << 20,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NETCDF_APPLY_SCALE_OFFSET") {
            config.apply_scale_offset = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NETCDF_MASK_FILL_VALUES") {
            config.mask_fill_values = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NETCDF_INFER_STREAMING_RECORDS") {
            config.infer_streaming_records = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NETCDF_MAX_LIST_ELEMENTS") {
            if let Ok(limit) = val.parse() {
                config.max_list_elements = limit;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_list_elements == 0 {
            return Err("max_list_elements must be > 0".to_string());
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
