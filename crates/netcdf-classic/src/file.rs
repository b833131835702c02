//! Open file handle: a decoded header plus the byte source it came from.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::ReaderConfig;
use crate::cursor::ByteCursor;
use crate::error::{NetCdfError, NetCdfResult};
use crate::extract::{Grid, GridPlan};
use crate::header::Header;
use crate::layout::{Layout, ValueTransform};
use crate::types::RecordCount;

/// A NetCDF classic or 64-bit offset file whose header has been decoded.
///
/// Reads take `&mut self` because they move the shared cursor.
#[derive(Debug)]
pub struct NetCdfFile<R> {
    cursor: ByteCursor<R>,
    header: Header,
    config: ReaderConfig,
    file_len: u64,
}

impl NetCdfFile<BufReader<File>> {
    /// Open a file from disk with [`ReaderConfig::default`].
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> NetCdfResult<Self> {
        config.validate().map_err(NetCdfError::Config)?;
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file), config)
    }
}

impl<R: Read + Seek> NetCdfFile<R> {
    /// Decode the header from any seekable source.
    pub fn from_reader(reader: R, config: ReaderConfig) -> NetCdfResult<Self> {
        config.validate().map_err(NetCdfError::Config)?;
        let mut cursor = ByteCursor::new(reader)?;
        let file_len = cursor.source_len()?;
        let header = Header::decode(&mut cursor, config.max_list_elements)?;

        let file = Self {
            cursor,
            header,
            config,
            file_len,
        };
        file.report_records();

        info!(
            format = %file.header.version,
            dimensions = file.header.dimensions.len(),
            variables = file.header.variables.len(),
            records = file.record_count(),
            "Opened NetCDF file"
        );
        Ok(file)
    }

    fn report_records(&self) {
        let layout = self.layout();
        let record_size = layout.record_size();
        if record_size == 0 {
            return;
        }
        let first_record = self
            .catalog()
            .record_section_variables()
            .iter()
            .map(|v| v.data_start)
            .min()
            .unwrap_or(self.file_len);
        let trailing = self.file_len.saturating_sub(first_record) % record_size;

        if self.header.record_count == RecordCount::Streaming {
            if self.config.infer_streaming_records {
                warn!(
                    records = layout.record_count(),
                    record_size,
                    "Record count is streaming, inferred from file length"
                );
            } else {
                warn!("Record count is streaming and inference is disabled, treating as 0");
            }
        }
        if trailing != 0 {
            warn!(trailing, record_size, "File length is not a whole number of records");
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.header)
    }

    pub fn layout(&self) -> Layout<'_> {
        Layout::new(&self.header, self.file_len, &self.config)
    }

    /// Effective number of records, after streaming inference.
    pub fn record_count(&self) -> u64 {
        self.layout().record_count()
    }

    /// Size of the underlying source in bytes.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Read one element of `variable` at the logical `index`, transformed
    /// by the variable's fill/scale/offset attributes.
    pub fn read_value(&mut self, variable: &str, index: &[u64]) -> NetCdfResult<f64> {
        let layout = Layout::new(&self.header, self.file_len, &self.config);
        let var = Catalog::new(&self.header).require_variable(variable)?;
        let var_layout = layout.variable(var);
        let transform = ValueTransform::for_variable(var, &self.config);

        let offset = var_layout.offset(index)?;
        self.cursor.seek_to(offset)?;
        let raw = self.cursor.read_numbers(var_layout.element_type, 1)?;
        Ok(transform.apply(raw[0]))
    }

    /// All values of the coordinate variable for `dimension`.
    pub fn read_coordinate_values(&mut self, dimension: &str) -> NetCdfResult<Vec<f64>> {
        let catalog = Catalog::new(&self.header);
        catalog.require_dimension(dimension)?;
        let var = catalog.coordinate_variable(dimension).ok_or_else(|| {
            NetCdfError::lookup(format!("dimension {:?} has no coordinate variable", dimension))
        })?;

        let layout = Layout::new(&self.header, self.file_len, &self.config);
        let var_layout = layout.variable(var);
        let transform = ValueTransform::for_variable(var, &self.config);
        let count = var_layout.shape[0];

        if !var_layout.is_record() {
            self.cursor.seek_to(var_layout.data_start)?;
            let raw = self
                .cursor
                .read_numbers(var_layout.element_type, count as usize)?;
            return Ok(raw.into_iter().map(|v| transform.apply(v)).collect());
        }

        // One element per record.
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count {
            self.cursor.seek_to(var_layout.offset(&[i])?)?;
            let raw = self.cursor.read_numbers(var_layout.element_type, 1)?;
            values.push(transform.apply(raw[0]));
        }
        Ok(values)
    }

    /// Extract the 2-D slice of `variable` spanned by `x_dim` (columns) and
    /// `y_dim` (rows). Every other dimension of the variable must have an
    /// entry in `fixed_indices`; unrelated entries are ignored.
    #[instrument(skip(self, fixed_indices))]
    pub fn extract_grid(
        &mut self,
        variable: &str,
        x_dim: &str,
        y_dim: &str,
        fixed_indices: &HashMap<String, u64>,
    ) -> NetCdfResult<Grid> {
        let plan = {
            let catalog = Catalog::new(&self.header);
            let layout = Layout::new(&self.header, self.file_len, &self.config);
            GridPlan::resolve(
                &catalog,
                &layout,
                &self.config,
                variable,
                x_dim,
                y_dim,
                fixed_indices,
            )?
        };
        debug!(
            width = plan.width,
            height = plan.height,
            contiguous = plan.rows_are_contiguous(),
            "Resolved grid plan"
        );

        let mut values = Vec::with_capacity(plan.width * plan.height);
        if plan.width == 0 || plan.height == 0 {
            return Ok(Grid {
                width: plan.width,
                height: plan.height,
                values,
            });
        }

        let element_type = plan.layout.element_type;
        for y in 0..plan.height {
            if plan.rows_are_contiguous() {
                let start = plan.layout.offset(&plan.index(0, y))?;
                self.cursor.seek_to(start)?;
                let raw = self.cursor.read_numbers(element_type, plan.width)?;
                values.extend(raw.into_iter().map(|v| plan.transform.apply(v)));
            } else {
                for x in 0..plan.width {
                    let offset = plan.layout.offset(&plan.index(x, y))?;
                    self.cursor.seek_to(offset)?;
                    let raw = self.cursor.read_numbers(element_type, 1)?;
                    values.push(plan.transform.apply(raw[0]));
                }
            }
        }

        Ok(Grid {
            width: plan.width,
            height: plan.height,
            values,
        })
    }
}
